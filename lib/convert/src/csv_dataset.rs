use crate::dataset::encode_non_word;
use crate::{ConvertError, Dataset, DatasetSource};
use csv::{ReaderBuilder, StringRecord};
use rdf_spatial_model::vocab::predicate;
use rdf_spatial_model::{typed_term, IdGenerator, Term, Triple, TripleSink};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use tracing::warn;

static UNPROBLEMATIC_PREDICATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+:)?\w+$").expect("valid regex"));

/// Maps column names to predicates. `None` drops the column.
pub type ColumnMapping = HashMap<String, Option<String>>;

/// Maps predicates (column names after applying the [`ColumnMapping`]) to value rewrites.
pub type ValuesMapping = HashMap<String, ValueMapping>;

/// Called once per row with the subject and the unmapped row.
pub type RowHook<'a> =
    dyn FnMut(&Term, &CsvRow<'_>, &mut dyn TripleSink) -> Result<(), ConvertError> + 'a;

#[derive(Clone)]
enum Replacement {
    /// A replacement string with `$name` and `${name}` group references.
    Template(String),
    Function(fn(&Captures<'_>) -> String),
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Function(_) => f.write_str("Function"),
        }
    }
}

/// A single search and replace step applied to a cell value.
#[derive(Debug, Clone)]
pub struct ValueRule {
    search: Regex,
    replacement: Replacement,
}

impl ValueRule {
    pub fn new(search: &str, replacement: impl Into<String>) -> Result<Self, ConvertError> {
        Ok(Self {
            search: Regex::new(search)?,
            replacement: Replacement::Template(replacement.into()),
        })
    }

    /// A rule that computes the replacement from the match.
    pub fn with_fn(
        search: &str,
        replacement: fn(&Captures<'_>) -> String,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            search: Regex::new(search)?,
            replacement: Replacement::Function(replacement),
        })
    }

    /// Replaces all matches in `value`.
    pub fn apply(&self, value: &str) -> String {
        match &self.replacement {
            Replacement::Template(template) => self
                .search
                .replace_all(value, template.as_str())
                .into_owned(),
            Replacement::Function(f) => self.search.replace_all(value, *f).into_owned(),
        }
    }
}

/// How a cell value is emitted after the rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A literal with a guessed datatype.
    Literal,
    /// Emitted verbatim, e.g. as prefixed name.
    Iri,
}

/// The rewrites of one predicate's values.
#[derive(Debug, Clone)]
pub struct ValueMapping {
    rules: Vec<ValueRule>,
    kind: ValueKind,
}

impl ValueMapping {
    pub fn new(rules: Vec<ValueRule>, kind: ValueKind) -> Self {
        Self { rules, kind }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Applies all rules in order.
    pub fn apply(&self, value: &str) -> String {
        let mut value = value.to_owned();
        for rule in &self.rules {
            value = rule.apply(&value);
        }
        value
    }
}

/// A data row with its column names.
#[derive(Debug, Clone, Copy)]
pub struct CsvRow<'a> {
    headers: &'a StringRecord,
    record: &'a StringRecord,
}

impl<'a> CsvRow<'a> {
    /// The value of `column`, if the row has one.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| self.record.get(i))
    }

    /// Like [`CsvRow::get`], but a missing column is an error.
    pub fn require(&self, dataset: &str, column: &str) -> Result<&'a str, ConvertError> {
        self.get(column).ok_or_else(|| ConvertError::MissingColumn {
            dataset: dataset.to_owned(),
            column: column.to_owned(),
        })
    }

    /// Pairs of column name and value. Surplus values without a header are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.headers.iter().zip(self.record.iter())
    }
}

/// A CSV file, converted to one subject per row and one triple per non-empty cell.
#[derive(Debug, Clone)]
pub struct CsvDataset {
    source: DatasetSource,
    separator: u8,
    quote: u8,
    column_mapping: ColumnMapping,
    primary_col: Option<String>,
    values_mapping: ValuesMapping,
    warn_missing_column_mapping: bool,
}

impl CsvDataset {
    pub fn new(source: DatasetSource) -> Self {
        Self {
            source,
            separator: b',',
            quote: b'"',
            column_mapping: ColumnMapping::new(),
            primary_col: None,
            values_mapping: ValuesMapping::new(),
            warn_missing_column_mapping: false,
        }
    }

    #[must_use]
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    #[must_use]
    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    #[must_use]
    pub fn with_column_mapping(mut self, column_mapping: ColumnMapping) -> Self {
        self.column_mapping = column_mapping;
        self
    }

    /// Uses the values of `primary_col` (rewritten by the values mapping of its predicate)
    /// as subjects instead of generated ids.
    #[must_use]
    pub fn with_primary_col(mut self, primary_col: Option<String>) -> Self {
        self.primary_col = primary_col;
        self
    }

    #[must_use]
    pub fn with_values_mapping(mut self, values_mapping: ValuesMapping) -> Self {
        self.values_mapping = values_mapping;
        self
    }

    /// Logs a warning for every column that has no entry in the column mapping.
    #[must_use]
    pub fn with_warn_missing_column_mapping(mut self, warn: bool) -> Self {
        self.warn_missing_column_mapping = warn;
        self
    }

    /// Converts the file like [`Dataset::rdf`], additionally calling `hook` after every row.
    pub fn rdf_with_hook(
        &mut self,
        ids: &IdGenerator,
        sink: &mut dyn TripleSink,
        hook: &mut RowHook<'_>,
    ) -> Result<(), ConvertError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.separator)
            .quote(self.quote)
            .flexible(true)
            .from_reader(self.source.open()?);
        let headers = reader.headers()?.clone();

        if self.warn_missing_column_mapping {
            for column in headers.iter() {
                if !self.column_mapping.contains_key(column) {
                    warn!(
                        "Dataset {}. Missing column mapping for {column}",
                        self.source.dataset()
                    );
                }
            }
        }

        let type_term = self.source.type_term();
        let clean_prefix = self.source.clean_prefix();
        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            let row = CsvRow {
                headers: &headers,
                record: &record,
            };
            let subject = self.subject(&row, ids)?;

            sink.push(Triple::new(
                subject.clone(),
                predicate::TYPE,
                type_term.clone(),
            ))?;
            if let Some(parent) = self.source.parent() {
                sink.push(Triple::new(
                    subject.clone(),
                    predicate::MEMBER,
                    parent.clone(),
                ))?;
            }

            for (column, value) in row.iter() {
                if value.is_empty() {
                    continue;
                }
                let predicate = match self.column_mapping.get(column) {
                    Some(None) => continue,
                    Some(Some(mapped)) => mapped.as_str(),
                    None => column,
                };

                let object = match self.values_mapping.get(predicate) {
                    Some(mapping) => {
                        let value = mapping.apply(value);
                        match mapping.kind() {
                            ValueKind::Literal => typed_term(&value),
                            ValueKind::Iri => Term::raw(value),
                        }
                    }
                    None => typed_term(value),
                };

                let predicate = clean_predicate(&clean_prefix, predicate);
                sink.push(Triple::new(subject.clone(), predicate, object))?;
            }

            hook(&subject, &row, &mut *sink)?;
        }
        Ok(())
    }

    fn subject(&self, row: &CsvRow<'_>, ids: &IdGenerator) -> Result<Term, ConvertError> {
        let Some(primary_col) = &self.primary_col else {
            return Ok(Term::name(format!(
                "{}_{}",
                self.source.primary_prefix(),
                ids.next_id()
            )));
        };
        let mapped = match self.column_mapping.get(primary_col) {
            Some(Some(mapped)) => Some(mapped.as_str()),
            Some(None) => None,
            None => Some(primary_col.as_str()),
        };
        let value = row.require(self.source.dataset(), primary_col)?;
        let value = match mapped.and_then(|m| self.values_mapping.get(m)) {
            Some(mapping) => mapping.apply(value),
            None => value.to_owned(),
        };
        Ok(Term::name(format!("{}{value}", self.source.primary_prefix())))
    }
}

impl Dataset for CsvDataset {
    fn source(&self) -> &DatasetSource {
        &self.source
    }

    fn source_mut(&mut self) -> &mut DatasetSource {
        &mut self.source
    }

    fn rdf(&mut self, ids: &IdGenerator, sink: &mut dyn TripleSink) -> Result<(), ConvertError> {
        self.rdf_with_hook(ids, sink, &mut |_, _, _| Ok(()))
    }
}

/// Adds the dataset prefix to unqualified predicates and makes the local name safe for Turtle.
fn clean_predicate(clean_prefix: &str, predicate: &str) -> Term {
    let predicate = if predicate.contains(':') {
        predicate.to_owned()
    } else {
        format!("{clean_prefix}{predicate}")
    };
    if UNPROBLEMATIC_PREDICATE.is_match(&predicate) {
        return Term::name(predicate);
    }
    let (prefix, local) = predicate.split_once(':').unwrap_or(("", &predicate));
    Term::name(format!("{prefix}:{}", encode_non_word(local)))
}
