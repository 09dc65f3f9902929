mod config;
mod error;
mod format;
mod input;
mod search;
mod template;

pub use config::*;
pub use error::*;
pub use format::{clean_name, indent};
pub use input::*;
pub use search::*;
pub use template::*;

use std::collections::HashMap;

/// Contents of the input files a composition may use, keyed by their name relative to the input.
pub type FilesCache = HashMap<String, String>;

/// Validates `document` and composes the indented query from the shards in `files`.
pub fn compose(document: QueryConfigDocument, files: &FilesCache) -> Result<String, ComposeError> {
    let config = QueryConfig::from_document(document)?;
    Ok(indent(&config.compose(files)?))
}

/// Composes the query configured by `main_config` inside `input`.
pub fn compose_from_input(input: &ComposeInput, main_config: &str) -> Result<String, ComposeError> {
    let (document, files) = input.load_config_and_files(main_config)?;
    tracing::info!(
        "Composing {main_config} from {} with {} input files",
        input.path().display(),
        files.len()
    );
    compose(document, &files)
}
