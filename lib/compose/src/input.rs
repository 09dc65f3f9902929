use crate::{ComposeError, FilesCache, QueryConfigDocument};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// File names of compose configurations end with this suffix.
pub const CONFIG_FILENAME_SUFFIX: &str = "_compose.json";

/// The directory or ZIP archive that holds compose configurations, templates and query shards.
///
/// Members are addressed by their path relative to the input, with `/` as separator.
#[derive(Debug, Clone)]
pub enum ComposeInput {
    Directory(PathBuf),
    Archive(PathBuf),
}

impl ComposeInput {
    /// Opens `path` as a directory if it is one, otherwise as a ZIP archive.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ComposeError> {
        let path = path.into();
        if !path.exists() {
            return Err(ComposeError::MissingInput(path));
        }
        Ok(if path.is_dir() {
            Self::Directory(path)
        } else {
            Self::Archive(path)
        })
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(path) | Self::Archive(path) => path,
        }
    }

    /// The content of the member `name`.
    pub fn read(&self, name: &str) -> Result<String, ComposeError> {
        check_member_name(name)?;
        debug!("Reading {name} from {}", self.path().display());
        match self {
            Self::Directory(dir) => fs::read_to_string(dir.join(name)).map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    ComposeError::MissingFile(name.to_owned())
                } else {
                    e.into()
                }
            }),
            Self::Archive(path) => {
                let mut archive = ZipArchive::new(File::open(path)?)?;
                let mut member = archive.by_name(name).map_err(|e| match e {
                    ZipError::FileNotFound => ComposeError::MissingFile(name.to_owned()),
                    e => e.into(),
                })?;
                let mut content = String::new();
                member.read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// All compose configurations in the input, searched recursively.
    pub fn list_configs(&self) -> Result<Vec<String>, ComposeError> {
        match self {
            Self::Directory(dir) => {
                let pattern = format!(
                    "{}/**/*{CONFIG_FILENAME_SUFFIX}",
                    glob::Pattern::escape(&dir.to_string_lossy())
                );
                let mut configs = Vec::new();
                for entry in glob::glob(&pattern)? {
                    let path = entry?;
                    if let Ok(relative) = path.strip_prefix(dir) {
                        configs.push(member_name(relative));
                    }
                }
                Ok(configs)
            }
            Self::Archive(path) => {
                let archive = ZipArchive::new(File::open(path)?)?;
                Ok(archive
                    .file_names()
                    .filter(|name| name.ends_with(CONFIG_FILENAME_SUFFIX))
                    .map(str::to_owned)
                    .collect())
            }
        }
    }

    /// Parses the configuration `main_config` and loads every file it refers to.
    pub fn load_config_and_files(
        &self,
        main_config: &str,
    ) -> Result<(QueryConfigDocument, FilesCache), ComposeError> {
        let document: QueryConfigDocument = serde_json::from_str(&self.read(main_config)?)?;
        let mut files = FilesCache::new();
        for name in document.referenced_files() {
            let content = self.read(&name)?;
            files.insert(name, content);
        }
        Ok((document, files))
    }
}

/// Members must stay inside the input.
fn check_member_name(name: &str) -> Result<(), ComposeError> {
    let inside = !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if inside {
        Ok(())
    } else {
        Err(ComposeError::InvalidConfig(format!(
            "'{name}' is not a file name inside the input"
        )))
    }
}

fn member_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
