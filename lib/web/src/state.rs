use crate::ServeConfig;
use rdf_spatial_compose::{ComposeError, ComposeInput, FilesCache, SpatialAlgorithm};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Everything a request may read. It is loaded once before the server starts.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    files: Arc<FilesCache>,
    pages: Arc<FilesCache>,
    verbose: bool,
}

impl AppState {
    /// Loads the web app pages, every compose configuration of the input with the files it
    /// refers to and the files named by `serve`. Then generates `configs.json`, `selects.json`
    /// and `default_input` for the web app.
    pub fn prepare(
        input: &ComposeInput,
        main_config: &str,
        serve: &ServeConfig,
        pages: Option<&Path>,
    ) -> Result<Self, ComposeError> {
        info!("Compose Spatial HTTP Server: Preparing...");
        let pages = match pages {
            Some(dir) => load_pages(dir)?,
            None => FilesCache::new(),
        };

        let mut configs = input.list_configs()?;
        if !configs.iter().any(|c| c == main_config) {
            configs.push(main_config.to_owned());
        }

        let mut files = FilesCache::new();
        for config in &configs {
            let (_, config_files) = input.load_config_and_files(config)?;
            files.extend(config_files);
        }
        let listed = configs
            .iter()
            .chain(&serve.templates)
            .chain(&serve.group_templates)
            .chain(&serve.shards)
            .chain(&serve.replace_files);
        for name in listed {
            if !files.contains_key(name) {
                let content = input.read(name)?;
                files.insert(name.clone(), content);
            }
        }

        let describe = |names: &[String]| -> Vec<(String, String)> {
            names
                .iter()
                .map(|name| (name.clone(), description(name, &files[name])))
                .collect()
        };
        let shards = describe(&serve.shards);
        let templates = describe(&serve.templates);
        let group_templates = describe(&serve.group_templates);
        let mut replace_files = vec![(String::new(), "no file selected".to_owned())];
        replace_files.extend(describe(&serve.replace_files));

        let mut config_list = vec![("blank_compose.json".to_owned(), "empty".to_owned())];
        config_list.extend(configs.iter().map(|c| (c.clone(), String::new())));

        let algorithms = SpatialAlgorithm::ALL
            .into_iter()
            .map(|a| (a.name(), a.description()))
            .collect::<Vec<_>>();
        let selects = json!({
            "spatial_searches:_:config:algorithm": [algorithms, SpatialAlgorithm::default().name()],
            "template:filename": [templates, null],
            "template:replace:_:replace_file": [replace_files, ""],
            "spatial_searches:_:group_template:filename": [group_templates, null],
            "spatial_searches:_:left:_": [shards, serve.default_left],
            "spatial_searches:_:right:_:filename": [shards, serve.default_right],
        });

        files.insert("configs.json".to_owned(), json!(config_list).to_string());
        files.insert("selects.json".to_owned(), selects.to_string());
        files.insert("default_input".to_owned(), main_config.to_owned());

        Ok(Self {
            files: Arc::new(files),
            pages: Arc::new(pages),
            verbose: serve.verbose,
        })
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// The cached input files, for composing queries.
    pub fn files(&self) -> &FilesCache {
        &self.files
    }

    /// A cached input file or page. `name` has no leading slash.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.files
            .get(name)
            .or_else(|| self.pages.get(name))
            .map(String::as_str)
    }
}

/// The first line of a query shard, if it is a comment.
fn description(name: &str, content: &str) -> String {
    if !(name.ends_with(".rq") || name.ends_with(".sparql")) {
        return String::new();
    }
    content
        .lines()
        .next()
        .map(str::trim)
        .and_then(|head| head.strip_prefix('#'))
        .map(|d| d.trim().to_owned())
        .unwrap_or_default()
}

fn load_pages(dir: &Path) -> Result<FilesCache, ComposeError> {
    let pattern = format!("{}/**/*", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut pages = FilesCache::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        if !path.is_file() {
            continue;
        }
        let Ok(relative) = path.strip_prefix(dir) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        pages.insert(name, fs::read_to_string(&path)?);
    }
    info!("Loaded {} pages from {}", pages.len(), dir.display());
    Ok(pages)
}
