mod csv_dataset;
mod dataset;
mod election;
mod error;
pub mod gtfs;
pub mod kml;

pub use csv_dataset::*;
pub use dataset::{encode_non_word, DataEnv, Dataset, DatasetSource};
pub use election::*;
pub use error::*;
