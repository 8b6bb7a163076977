use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::errors::ConfigError;
use super::types::AppConfig;
use crate::app_dirs;

/// Default filename used to store the configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from the app directory, returning defaults if missing.
pub fn load_or_default() -> Result<AppConfig, ConfigError> {
    load_from(&config_path()?)
}

/// Load configuration from `path`; a missing file yields defaults.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    let text = fs::read_to_string(path).map_err(ConfigError::io("read", path))?;
    let config: AppConfig = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config.normalized())
}

/// Persist configuration to the app directory.
pub fn save(config: &AppConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path()?;
    save_to_path(config, &path)?;
    Ok(path)
}

/// Save configuration to `path`, creating parent directories as needed.
///
/// The file is written next to its destination and renamed into place.
pub fn save_to_path(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(ConfigError::io("create", parent))?;
    }
    let data = toml::to_string_pretty(config)?;
    let mut staged = path.as_os_str().to_owned();
    staged.push(".tmp");
    let staged = PathBuf::from(staged);
    {
        let mut file = fs::File::create(&staged).map_err(ConfigError::io("write", &staged))?;
        file.write_all(data.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(ConfigError::io("write", &staged))?;
    }
    fs::rename(&staged, path).map_err(ConfigError::io("replace", path))
}
