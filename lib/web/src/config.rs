use rdf_spatial_compose::{ComposeError, ComposeInput};
use serde::Deserialize;
use std::path::PathBuf;

/// The behavior of the compose web app, read from a JSON file inside the input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServeConfig {
    /// The address to bind, empty for all interfaces.
    #[serde(default)]
    pub address: String,
    pub port: u16,
    /// Whether every request is logged.
    #[serde(default)]
    pub verbose: bool,
    /// Files the web app may offer for each choice.
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default)]
    pub group_templates: Vec<String>,
    #[serde(default)]
    pub shards: Vec<String>,
    #[serde(default)]
    pub replace_files: Vec<String>,
    /// Preselected shards for new spatial searches.
    #[serde(default)]
    pub default_left: Option<String>,
    #[serde(default)]
    pub default_right: Option<String>,
}

impl ServeConfig {
    pub fn load(input: &ComposeInput, name: &str) -> Result<Self, ComposeError> {
        Ok(serde_json::from_str(&input.read(name)?)?)
    }

    /// The host part of the bind address.
    pub fn host(&self) -> &str {
        if self.address.is_empty() {
            "0.0.0.0"
        } else {
            &self.address
        }
    }
}

/// Holds the configuration for a compose web server.
pub struct ServerConfig {
    /// The directory or ZIP archive with configurations and query shards.
    pub input: ComposeInput,
    /// The configuration the web app loads by default.
    pub main_config: String,
    /// The name of the serve configuration inside the input.
    pub serve_config: String,
    /// The directory with the pages of the web app.
    pub pages: Option<PathBuf>,
    /// Whether CORS is enabled.
    pub cors: bool,
}
