//! `config.toml` settings shared by the pipeline binaries and the form.
//!
//! The file lives in the app directory (see [`crate::app_dirs`]). Command-line
//! flags override whatever it holds.

mod errors;
mod io;
mod types;


pub use errors::ConfigError;
pub use io::{CONFIG_FILE_NAME, config_path, load_from, load_or_default, save, save_to_path};
pub use types::{
    AppConfig, DEFAULT_FETCH_URL, DEFAULT_OBJECTIVE, FetchSettings, PathSettings, PrepareSettings,
    TrainSettings,
};
