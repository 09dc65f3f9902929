//! The JSON shape of compose configurations.
//!
//! Every field is optional here so that configurations coming from the web form can be reported
//! field by field. [`QueryConfig::from_document`](crate::QueryConfig::from_document) checks what
//! is mandatory.

use crate::ComposeError;
use serde::Deserialize;

/// A number that may also be given as a string, as HTML forms submit them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IntOrString {
    Int(i64),
    Text(String),
}

impl IntOrString {
    /// The number, or `None` for an empty string or 0.
    pub fn to_optional(&self, field: &str) -> Result<Option<i64>, ComposeError> {
        let value = match self {
            Self::Int(value) => *value,
            Self::Text(text) if text.trim().is_empty() => return Ok(None),
            Self::Text(text) => text.trim().parse().map_err(|_| {
                ComposeError::InvalidConfig(format!("{field} must be a number, but '{text}' given"))
            })?,
        };
        Ok((value != 0).then_some(value))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryConfigDocument {
    pub template: Option<TemplateDocument>,
    pub spatial_searches: Option<Vec<SpatialSearchDocument>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateDocument {
    pub filename: Option<String>,
    pub replace: Option<Vec<ReplaceRuleDocument>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplaceRuleDocument {
    pub search: Option<String>,
    pub replace: Option<String>,
    pub replace_file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpatialSearchDocument {
    pub config: Option<SpatialSearchConfigDocument>,
    pub left: Option<Vec<String>>,
    pub right: Option<Vec<RightShardDocument>>,
    pub group_template: Option<GroupTemplateDocument>,
    pub template_pattern: Option<String>,
    pub group_size: Option<IntOrString>,
    pub provided_values: Option<Vec<ProvidedValuesDocument>>,
    pub name_template: Option<NameTemplateDocument>,
    pub add_selectors: Option<SelectorsDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialSearchConfigDocument {
    pub algorithm: Option<String>,
    pub max_distance: Option<IntOrString>,
    pub num_nearest_neighbors: Option<IntOrString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RightShardDocument {
    pub filename: Option<String>,
    pub payload: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupTemplateDocument {
    pub filename: Option<String>,
    pub patterns: Option<GroupTemplatePatternsDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupTemplatePatternsDocument {
    pub queries: Option<String>,
    pub select: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidedValuesDocument {
    pub variable: Option<String>,
    pub values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameTemplateDocument {
    pub template: Option<String>,
    pub patterns: Option<NameTemplatePatternsDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameTemplatePatternsDocument {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectorsDocument {
    pub selectors: Option<Vec<String>>,
    pub patterns: Option<SelectorPatternsDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectorPatternsDocument {
    pub dist: Option<String>,
    pub count: Option<String>,
    pub centroid: Option<String>,
}

impl QueryConfigDocument {
    /// Every input file the configuration refers to, without duplicates, in order of appearance.
    pub fn referenced_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        let mut add = |name: Option<&str>| {
            if let Some(name) = name.filter(|n| !n.is_empty()) {
                if !files.iter().any(|f| f == name) {
                    files.push(name.to_owned());
                }
            }
        };

        if let Some(template) = &self.template {
            add(template.filename.as_deref());
            for rule in template.replace.iter().flatten() {
                add(rule.replace_file.as_deref());
            }
        }
        for search in self.spatial_searches.iter().flatten() {
            if let Some(group_template) = &search.group_template {
                add(group_template.filename.as_deref());
            }
            for left in search.left.iter().flatten() {
                add(Some(left.as_str()));
            }
            for right in search.right.iter().flatten() {
                add(right.filename.as_deref());
            }
        }
        files
    }
}

pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T, ComposeError> {
    value.ok_or_else(|| ComposeError::MissingField(field.to_owned()))
}
