use std::path::PathBuf;
use thiserror::Error;

use batislens_core::error::PreviewError;
use batislens_core::mapper::MapperError;

use crate::config::CONFIG_FILE;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Config file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Preview error: {0}")]
    Preview(#[from] PreviewError),

    #[error("Mapper error: {0}")]
    Mapper(#[from] MapperError),

    #[error("Mapper error in {}: {source}", path.display())]
    MapperFile {
        path: PathBuf,
        #[source]
        source: MapperError,
    },

    #[error("{failed} of {total} statements failed to render")]
    CheckFailed { failed: usize, total: usize },

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl ProjectError {
    pub fn report(&self) -> String {
        match self {
            Self::ConfigNotFound(dir) => format!(
                "No {} found in {} or its parents\n\
                 Suggestion: Run 'batislens init' to create one.",
                CONFIG_FILE,
                dir.display()
            ),
            Self::InvalidPath(path) => format!(
                "Path {} does not exist\n\
                 Suggestion: Paths in {} are relative to the directory holding it.",
                path.display(),
                CONFIG_FILE
            ),
            Self::Preview(err) => err.report(),
            Self::MapperFile { path, source } => format!(
                "Mapper error in {}: {}\n\
                 Suggestion: Check that the file is a well-formed MyBatis mapper.",
                path.display(),
                source
            ),
            Self::CheckFailed { .. } => format!(
                "{}\n\
                 Suggestion: Run 'batislens run' and look at the error entries of the report.",
                self
            ),
            other => other.to_string(),
        }
    }

    pub fn is_config_not_found(&self) -> bool {
        matches!(self, Self::ConfigNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ProjectError>;
