//! Tracing setup for the pipeline binaries and the prediction form.
//!
//! Every run gets its own file in the app logs directory, named
//! `<component>_<YYYY-MM-DD_HH-MM-SS>.log`. Output also goes to stdout. Only the
//! newest [`MAX_LOG_FILES`] runs per component are kept.

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::OnceLock,
};

use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs::{self, AppDirError};

/// Runs kept per component.
pub const MAX_LOG_FILES: usize = 10;

const FILE_STAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
const LINE_STAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

static FLUSH_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error(transparent)]
    LogsDir(#[from] AppDirError),
    #[error("Could not stamp log file name: {0}")]
    FormatTime(#[from] time::error::Format),
    #[error("Log file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("A global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Route `tracing` output for `component` to stdout and a fresh run log.
///
/// A second call in the same process does nothing. `RUST_LOG` overrides the
/// default `info` level.
pub fn init(component: &str) -> Result<(), LoggingError> {
    if FLUSH_GUARD.get().is_some() {
        return Ok(());
    }
    let run_log = RunLog::create(&app_dirs::logs_dir()?, component, local_now())?;
    run_log.retain_newest(MAX_LOG_FILES)?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(rolling::never(&run_log.dir, &run_log.file_name));
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = fmt::time::OffsetTime::new(offset, LINE_STAMP);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_timer(timer.clone())
                .with_writer(std::io::stdout),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_timer(timer)
                .with_writer(file_writer),
        );
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = FLUSH_GUARD.set(guard);

    tracing::debug!(component, path = %run_log.path().display(), "run log opened");
    Ok(())
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> LoggingError {
    let path = path.to_path_buf();
    move |source| LoggingError::Io { path, source }
}

fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// One run's log file inside the logs directory.
struct RunLog {
    dir: PathBuf,
    component: String,
    file_name: String,
}

impl RunLog {
    fn create(dir: &Path, component: &str, started: OffsetDateTime) -> Result<Self, LoggingError> {
        let run_log = Self {
            dir: dir.to_path_buf(),
            component: component.to_string(),
            file_name: format!("{component}_{}.log", started.format(FILE_STAMP)?),
        };
        let path = run_log.path();
        File::options()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err(&path))?;
        Ok(run_log)
    }

    fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Delete this component's older runs so at most `keep` remain.
    ///
    /// The timestamp in each name sorts chronologically, so names are ordered
    /// lexically.
    fn retain_newest(&self, keep: usize) -> Result<(), LoggingError> {
        let prefix = format!("{}_", self.component);
        let mut runs: Vec<String> = fs::read_dir(&self.dir)
            .map_err(io_err(&self.dir))?
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| {
                name.strip_prefix(&prefix)
                    .is_some_and(|stamp| stamp.ends_with(".log"))
            })
            .collect();
        if runs.len() <= keep {
            return Ok(());
        }
        runs.sort_unstable();
        let stale = runs.len() - keep;
        for name in runs.drain(..stale) {
            let path = self.dir.join(name);
            fs::remove_file(&path).map_err(io_err(&path))?;
        }
        Ok(())
    }
}
