//! Palmer penguins species classifier: fetch, prepare, train and predict.
//!
//! Each stage is a binary that talks to the next one only through files:
//! `penguin-fetch` downloads the raw CSV, `penguin-prepare` writes the
//! stratified partitions, `penguin-train` writes a model artifact and loss
//! plot, and `penguin-predictor` serves the interactive form.

/// Application directory helpers.
pub mod app_dirs;
/// `config.toml` settings.
pub mod config;
/// CSV loading, cleaning, splitting and artifact persistence.
pub mod dataset;
/// HTTP download of the raw dataset.
pub mod fetch;
/// Interactive prediction form.
pub mod form;
pub(crate) mod http_client;
/// Logging setup.
pub mod logging;
/// Boosted-tree training, metrics and model artifacts.
pub mod ml;
