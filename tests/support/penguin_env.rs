use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use penguin_predictor::app_dirs::CONFIG_HOME_ENV;

static CONFIG_HOME_LOCK: Mutex<()> = Mutex::new(());

/// Holds `PENGUIN_CONFIG_HOME` at a scratch directory until dropped.
pub struct PenguinEnvGuard {
    saved: Option<OsString>,
    _serial: MutexGuard<'static, ()>,
}

impl PenguinEnvGuard {
    pub fn set_config_home(path: PathBuf) -> Self {
        let serial = CONFIG_HOME_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let saved = std::env::var_os(CONFIG_HOME_ENV);
        write_config_home(Some(path.into_os_string()));
        Self {
            saved,
            _serial: serial,
        }
    }
}

impl Drop for PenguinEnvGuard {
    fn drop(&mut self) {
        write_config_home(self.saved.take());
    }
}

fn write_config_home(value: Option<OsString>) {
    // SAFETY: only called while CONFIG_HOME_LOCK is held.
    unsafe {
        match value {
            Some(value) => std::env::set_var(CONFIG_HOME_ENV, value),
            None => std::env::remove_var(CONFIG_HOME_ENV),
        }
    }
}
