//! Download a remote file verbatim to local storage.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::http_client;

/// Largest body accepted from the remote host.
pub const MAX_DOWNLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Errors raised while fetching a remote file.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { scheme: String },
    #[error("Failed to download {url}: HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Failed to download {url}: {message}")]
    Transport { url: String, message: String },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Fetch `url` and write the body to `dest`, returning the number of bytes written.
///
/// The body lands in `<dest>.tmp` first and is renamed into place on success,
/// so a failed download never leaves a truncated `dest`.
pub fn download_file(url: &str, dest: &Path) -> Result<u64, FetchError> {
    validate_url(url)?;
    info!("Downloading from {url} to {}", dest.display());

    let response = match http_client::agent().get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(status, _)) => {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Err(err) => {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            });
        }
    };

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| write_error(parent, source))?;
    }
    let tmp = tmp_path(dest);
    let written = write_body(response, &tmp);
    let written = match written {
        Ok(bytes) => bytes,
        Err(err) => {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
    };
    fs::rename(&tmp, dest).map_err(|source| write_error(dest, source))?;
    info!("Wrote {written} bytes to {}", dest.display());
    Ok(written)
}

fn tmp_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_body(response: ureq::Response, tmp: &Path) -> Result<u64, FetchError> {
    let mut file = File::create(tmp).map_err(|source| write_error(tmp, source))?;
    let written = http_client::copy_response_to_writer(response, &mut file, MAX_DOWNLOAD_BYTES)
        .map_err(|source| write_error(tmp, source))?;
    file.flush().map_err(|source| write_error(tmp, source))?;
    Ok(written)
}

fn validate_url(url: &str) -> Result<(), FetchError> {
    let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FetchError::UnsupportedScheme {
            scheme: other.to_string(),
        }),
    }
}

fn write_error(path: &Path, source: std::io::Error) -> FetchError {
    FetchError::Write {
        path: path.to_path_buf(),
        source,
    }
}
