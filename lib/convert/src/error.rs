use rdf_spatial_model::ModelError;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// An error raised while fetching or converting a dataset.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvertError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Regex(#[from] regex::Error),
    /// The definition of a dataset violates one of its invariants.
    #[error("Invalid dataset definition: {0}")]
    InvalidDataset(String),
    /// The store file does not exist and there is no command to produce it.
    #[error("No command provided but file {} is not present", .0.display())]
    MissingData(PathBuf),
    /// `rdf()` was called before the data was fetched.
    #[error("Dataset {0} not loaded")]
    NotLoaded(String),
    /// The command that should produce the dataset failed.
    #[error("Command '{command}' for dataset {dataset} failed with {status}")]
    CommandFailed {
        dataset: String,
        command: String,
        status: ExitStatus,
    },
    /// A column that is required for the conversion is missing in a row.
    #[error("Dataset {dataset}: column '{column}' is missing")]
    MissingColumn { dataset: String, column: String },
    /// The input is not a KML document this converter understands.
    #[error("Invalid KML: {0}")]
    InvalidKml(String),
    /// A GTFS feed could not be converted.
    #[error("Invalid GTFS feed: {0}")]
    InvalidGtfs(String),
    /// The configuration file is incomplete or contradictory.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
