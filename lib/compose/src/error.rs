use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// An error raised while loading a compose configuration or composing a query.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ComposeError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
    #[error(transparent)]
    Regex(#[from] regex::Error),
    /// The input directory or archive does not exist.
    #[error("Input {} does not exist", .0.display())]
    MissingInput(PathBuf),
    /// A file the configuration refers to was not loaded.
    #[error("File '{0}' is missing")]
    MissingFile(String),
    /// A mandatory configuration field is absent.
    #[error("'{0}' is mandatory")]
    MissingField(String),
    /// The configuration violates one of its invariants.
    #[error("{0}")]
    InvalidConfig(String),
    /// A query shard does not fit the spatial search it is used in.
    #[error("{0}")]
    InvalidShard(String),
    #[error(
        "Maximum replace depth exceeded: please check your configuration for a cycle in replace rules."
    )]
    ReplaceDepthExceeded,
}

impl ComposeError {
    /// A short name for the kind of error, used when reporting it to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "IoError",
            Self::Zip(_) => "ZipError",
            Self::Json(_) => "JsonError",
            Self::Pattern(_) | Self::Glob(_) => "GlobError",
            Self::Regex(_) => "RegexError",
            Self::MissingInput(_) | Self::MissingFile(_) => "FileNotFound",
            Self::MissingField(_) => "MissingField",
            Self::InvalidConfig(_) => "InvalidConfig",
            Self::InvalidShard(_) => "InvalidShard",
            Self::ReplaceDepthExceeded => "RecursionError",
        }
    }
}

pub(crate) fn invalid(message: impl Into<String>) -> ComposeError {
    ComposeError::InvalidConfig(message.into())
}
