use std::path::PathBuf;

use thiserror::Error;

use crate::app_dirs::AppDirError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    AppDir(#[from] AppDirError),
    /// `action` is a verb such as "read" or "write".
    #[error("Could not {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`super::AppConfig`].
    #[error("{path} is not a valid penguin-predictor config: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Settings could not be encoded as TOML: {0}")]
    SerializeToml(#[from] toml::ser::Error),
}

impl ConfigError {
    pub(super) fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}
