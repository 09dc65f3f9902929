use crate::ConvertError;
use rdf_spatial_model::{IdGenerator, Term, TripleSink};
use regex::Regex;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use tracing::info;

static UNPROBLEMATIC_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+:\w*$").expect("valid regex"));
static UNPROBLEMATIC_DATASET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("valid regex"));
static NON_WORD_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W").expect("valid regex"));

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Environment variables handed to the commands that fetch dataset contents.
pub type DataEnv = [(String, String)];

/// Where the contents of a dataset come from and how its entities are named.
///
/// The contents live in `store_filename`. If that file is missing, `command` is run through the
/// shell and its standard output becomes the file.
#[derive(Debug, Clone)]
pub struct DatasetSource {
    dataset: String,
    command: Option<String>,
    store_filename: PathBuf,
    primary_prefix: String,
    parent: Option<Term>,
    loaded: bool,
}

impl DatasetSource {
    /// Validates and creates a new source.
    ///
    /// `dataset` must be alphanumeric and `primary_prefix` must have the shape `prefix:` or
    /// `prefix:local`.
    pub fn new(
        dataset: impl Into<String>,
        command: Option<String>,
        store_filename: impl Into<PathBuf>,
        primary_prefix: impl Into<String>,
    ) -> Result<Self, ConvertError> {
        let dataset = dataset.into();
        let store_filename = store_filename.into();
        let primary_prefix = primary_prefix.into();
        if !UNPROBLEMATIC_PREFIX.is_match(&primary_prefix) {
            return Err(ConvertError::InvalidDataset(format!(
                "primary prefix should be alphanumeric and contain ':', but '{primary_prefix}' given"
            )));
        }
        if store_filename.as_os_str().is_empty() {
            return Err(ConvertError::InvalidDataset(format!(
                "dataset {dataset} has an empty store filename"
            )));
        }
        if !UNPROBLEMATIC_DATASET.is_match(&dataset) {
            return Err(ConvertError::InvalidDataset(format!(
                "please choose an alphanumeric dataset name for '{dataset}'"
            )));
        }
        Ok(Self {
            dataset,
            command: command.filter(|c| !c.is_empty()),
            store_filename,
            primary_prefix,
            parent: None,
            loaded: false,
        })
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn store_filename(&self) -> &Path {
        &self.store_filename
    }

    pub fn primary_prefix(&self) -> &str {
        &self.primary_prefix
    }

    /// The entity every converted entity is declared a member of.
    pub fn parent(&self) -> Option<&Term> {
        self.parent.as_ref()
    }

    pub fn set_parent(&mut self, parent: Option<Term>) {
        self.parent = parent;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Makes sure the store file exists, running the command if required.
    ///
    /// `env` is added to the environment of the command.
    pub fn get_data(&mut self, env: &DataEnv) -> Result<(), ConvertError> {
        if self.store_filename.exists() {
            if self.command.is_some() {
                info!(
                    "{} already exists. skipping.",
                    self.store_filename.display()
                );
            }
            self.loaded = true;
            return Ok(());
        }
        let Some(command) = &self.command else {
            return Err(ConvertError::MissingData(self.store_filename.clone()));
        };

        info!("{}: running {command}", self.store_filename.display());
        let output = File::create(&self.store_filename)?;
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .envs(env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::from(output))
            .status()?;
        if !status.success() {
            // A partial file would be mistaken for a complete download on the next run.
            fs::remove_file(&self.store_filename)?;
            return Err(ConvertError::CommandFailed {
                dataset: self.dataset.clone(),
                command: command.clone(),
                status,
            });
        }
        self.loaded = true;
        Ok(())
    }

    /// Opens the store file for reading, skipping a leading UTF-8 byte order mark.
    pub fn open(&self) -> Result<BufReader<File>, ConvertError> {
        if !self.loaded {
            return Err(ConvertError::NotLoaded(self.dataset.clone()));
        }
        let mut reader = BufReader::new(File::open(&self.store_filename)?);
        if reader.fill_buf()?.starts_with(UTF8_BOM) {
            reader.consume(UTF8_BOM.len());
        }
        Ok(reader)
    }

    /// Reads the whole store file, without a leading byte order mark.
    pub fn content(&self) -> Result<String, ConvertError> {
        if !self.loaded {
            return Err(ConvertError::NotLoaded(self.dataset.clone()));
        }
        let content = fs::read_to_string(&self.store_filename)?;
        Ok(match content.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_owned(),
            None => content,
        })
    }

    /// The primary prefix without its local part, e.g. `ex:` for `ex:item_`.
    pub fn clean_prefix(&self) -> String {
        let prefix = self
            .primary_prefix
            .split(':')
            .next()
            .unwrap_or_default();
        format!("{prefix}:")
    }

    /// The class of all entities of this dataset.
    pub fn type_term(&self) -> Term {
        Term::name(format!("{}{}", self.clean_prefix(), self.dataset))
    }
}

/// A source dataset that can be converted to triples.
pub trait Dataset {
    fn source(&self) -> &DatasetSource;

    fn source_mut(&mut self) -> &mut DatasetSource;

    fn set_parent(&mut self, parent: Option<Term>) {
        self.source_mut().set_parent(parent);
    }

    /// Fetches the contents of the dataset if required.
    fn get_data(&mut self, env: &DataEnv) -> Result<(), ConvertError> {
        self.source_mut().get_data(env)
    }

    /// Emits the triples for the dataset into `sink`.
    ///
    /// Fails with [`ConvertError::NotLoaded`] if [`Dataset::get_data`] was not called.
    fn rdf(&mut self, ids: &IdGenerator, sink: &mut dyn TripleSink) -> Result<(), ConvertError>;
}

/// Replaces every non-word character by its code point as zero-padded hex, e.g. `-` by
/// `0x00002d`.
pub fn encode_non_word(value: &str) -> String {
    NON_WORD_CHAR
        .replace_all(value, |caps: &regex::Captures<'_>| {
            encode_char(caps[0].chars().next().unwrap_or_default())
        })
        .into_owned()
}

pub(crate) fn encode_char(c: char) -> String {
    format!("{:#08x}", u32::from(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    #[test]
    fn validates_names() {
        assert!(DatasetSource::new("ok_1", None, "x.csv", "ex:").is_ok());
        assert!(DatasetSource::new("ok", None, "x.csv", "ex:item_").is_ok());
        assert!(matches!(
            DatasetSource::new("not ok", None, "x.csv", "ex:"),
            Err(ConvertError::InvalidDataset(_))
        ));
        assert!(matches!(
            DatasetSource::new("ok", None, "x.csv", "ex"),
            Err(ConvertError::InvalidDataset(_))
        ));
        assert!(matches!(
            DatasetSource::new("ok", None, "", "ex:"),
            Err(ConvertError::InvalidDataset(_))
        ));
    }

    #[test]
    fn derived_names() {
        let source = DatasetSource::new("stops", None, "stops.txt", "gtfs:stop_de_").unwrap();
        assert_eq!(source.clean_prefix(), "gtfs:");
        assert_eq!(source.type_term().to_string(), "gtfs:stops");
    }

    #[test]
    fn requires_get_data() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("data.csv");
        file.write_str("a,b\n").unwrap();
        let mut source = DatasetSource::new("data", None, file.path(), "ex:").unwrap();
        assert!(matches!(source.content(), Err(ConvertError::NotLoaded(_))));
        source.get_data(&[]).unwrap();
        assert_eq!(source.content().unwrap(), "a,b\n");
    }

    #[test]
    fn missing_file_without_command() {
        let dir = TempDir::new().unwrap();
        let mut source =
            DatasetSource::new("data", None, dir.child("missing.csv").path(), "ex:").unwrap();
        assert!(matches!(
            source.get_data(&[]),
            Err(ConvertError::MissingData(_))
        ));
    }

    #[test]
    fn runs_command_with_env() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("out.txt");
        let mut source = DatasetSource::new(
            "data",
            Some("echo \"$GREETING\"".to_owned()),
            file.path(),
            "ex:",
        )
        .unwrap();
        source
            .get_data(&[("GREETING".to_owned(), "hello".to_owned())])
            .unwrap();
        assert_eq!(source.content().unwrap(), "hello\n");
    }

    #[test]
    fn failing_command_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("out.txt");
        let mut source =
            DatasetSource::new("data", Some("exit 3".to_owned()), file.path(), "ex:").unwrap();
        assert!(matches!(
            source.get_data(&[]),
            Err(ConvertError::CommandFailed { .. })
        ));
        assert!(!file.path().exists());
    }

    #[test]
    fn strips_byte_order_mark() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("bom.csv");
        file.write_binary(b"\xEF\xBB\xBFid\n1\n").unwrap();
        let mut source = DatasetSource::new("bom", None, file.path(), "ex:").unwrap();
        source.get_data(&[]).unwrap();
        assert_eq!(source.content().unwrap(), "id\n1\n");
        let mut line = String::new();
        source.open().unwrap().read_line(&mut line).unwrap();
        assert_eq!(line, "id\n");
    }

    #[test]
    fn encodes_non_word_chars() {
        assert_eq!(encode_non_word("de:08111:6118"), "de0x00003a081110x00003a6118");
        assert_eq!(encode_non_word("a-b"), "a0x00002db");
        assert_eq!(encode_non_word("plain_1"), "plain_1");
    }
}
