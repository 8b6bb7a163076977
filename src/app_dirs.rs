//! Per-user directories for the penguin pipeline.
//!
//! Settings and logs live under one `.penguin-predictor` folder in the OS
//! config directory. Setting `PENGUIN_CONFIG_HOME` moves that folder, which
//! keeps tests and portable installs away from the real profile.

use std::{
    path::{Path, PathBuf},
    sync::{LazyLock, Mutex},
};

use directories::BaseDirs;
use thiserror::Error;

/// Folder created under the config root.
pub const APP_DIR_NAME: &str = ".penguin-predictor";
/// Environment variable that replaces the OS config root.
pub const CONFIG_HOME_ENV: &str = "PENGUIN_CONFIG_HOME";
/// Sub-folder holding run logs.
pub const LOGS_DIR_NAME: &str = "logs";

static BASE_OVERRIDE: LazyLock<Mutex<Option<PathBuf>>> = LazyLock::new(|| Mutex::new(None));

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("Cannot locate a config directory; set {CONFIG_HOME_ENV}")]
    NoBaseDir,
    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// `<config root>/.penguin-predictor`, created on first use.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let root = base_dir().ok_or(AppDirError::NoBaseDir)?.join(APP_DIR_NAME);
    ensure_dir(root)
}

/// `<app root>/logs`, created on first use.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join(LOGS_DIR_NAME))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    match std::fs::create_dir_all(&path) {
        Ok(()) => Ok(path),
        Err(source) => Err(AppDirError::CreateDir { path, source }),
    }
}

/// Resolution order: in-process override, `PENGUIN_CONFIG_HOME`, OS config dir.
fn base_dir() -> Option<PathBuf> {
    let pinned = BASE_OVERRIDE.lock().ok().and_then(|slot| slot.clone());
    pinned
        .or_else(|| std::env::var_os(CONFIG_HOME_ENV).map(PathBuf::from))
        .or_else(|| BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))
}

fn pin_base(path: Option<&Path>) {
    if let Ok(mut slot) = BASE_OVERRIDE.lock() {
        *slot = path.map(Path::to_path_buf);
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::OverrideGuard;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn root_lives_under_the_pinned_base() {
        let base = tempdir().unwrap();
        let _guard = OverrideGuard::set(base.path().to_path_buf());
        let root = app_root_dir().unwrap();
        assert_eq!(root, base.path().join(APP_DIR_NAME));
        assert!(root.is_dir());
    }

    #[test]
    fn logs_are_created_inside_root() {
        let base = tempdir().unwrap();
        let _guard = OverrideGuard::set(base.path().to_path_buf());
        let logs = logs_dir().unwrap();
        assert_eq!(logs, base.path().join(APP_DIR_NAME).join(LOGS_DIR_NAME));
        assert!(logs.is_dir());
    }

    #[test]
    fn unwritable_base_reports_the_path() {
        let base = tempdir().unwrap();
        let blocker = base.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let _guard = OverrideGuard::set(blocker.clone());
        let err = app_root_dir().unwrap_err();
        assert!(matches!(err, AppDirError::CreateDir { path, .. } if path == blocker.join(APP_DIR_NAME)));
    }
}
