use oxiri::IriParseError;
use std::io;
use thiserror::Error;

/// An error raised while building or writing RDF output.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A prefix name that contains other characters than alphanumerics and underscores.
    #[error("Prefixes must be alphanumeric, given '{0}'")]
    InvalidPrefixName(String),
    /// A prefix IRI that could not be parsed at all.
    #[error("Invalid IRI '{iri}' for prefix: {source}")]
    InvalidIri {
        iri: String,
        #[source]
        source: IriParseError,
    },
    /// A prefix IRI that is a valid IRI but not a usable http(s) URL.
    #[error("IRI should be an http:// or https:// URL with a hostname and a path, given '{0}'")]
    UnsupportedIri(String),
    /// The same prefix name was declared with two different IRIs.
    #[error("There may not be multiple IRIs for the prefix '{prefix}': '{existing}' and '{new}'")]
    ConflictingPrefix {
        prefix: String,
        existing: String,
        new: String,
    },
}
