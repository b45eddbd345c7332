//! File logging via `tracing-subscriber`.
//!
//! Three files live in the log directory:
//! - `eimg.log`: every INFO+ event from this crate
//! - `errors.log`: ERROR events only
//! - `status.log`: events with target [`STATUS_TARGET`]
//!
//! `EIMG_LOG` (EnvFilter syntax) additionally mirrors events to stderr.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{Level, Metadata};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::errors::{EimgError, Result};

/// Target for user-visible milestones (downloads, cache and log clears).
pub const STATUS_TARGET: &str = "eimg::status";

/// Environment variable that enables the stderr layer.
pub const LOG_ENV: &str = "EIMG_LOG";

pub const MAIN_LOG: &str = "eimg.log";
pub const ERROR_LOG: &str = "errors.log";
pub const STATUS_LOG: &str = "status.log";

const LOG_FILES: [&str; 3] = [MAIN_LOG, ERROR_LOG, STATUS_LOG];

/// A file found in the log directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileInfo {
    pub name: String,
    pub size: u64,
}

/// Install the global subscriber writing to `dir`.
///
/// Oversized logs are rotated first. Fails if the directory or a file
/// cannot be opened, or if a subscriber is already installed.
pub fn init(dir: &Path, max_bytes: u64) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| EimgError::WriteFailed {
        path: dir.to_path_buf(),
        source,
    })?;

    for name in LOG_FILES {
        rotate_if_needed(&dir.join(name), max_bytes)?;
    }

    let main = fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(open_append(&dir.join(MAIN_LOG))?))
        .with_filter(filter_fn(|meta| is_ours(meta) && *meta.level() <= Level::INFO));

    let errors = fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(open_append(&dir.join(ERROR_LOG))?))
        .with_filter(filter_fn(|meta| is_ours(meta) && *meta.level() == Level::ERROR));

    let status = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(open_append(&dir.join(STATUS_LOG))?))
        .with_filter(filter_fn(|meta| meta.target() == STATUS_TARGET));

    let stderr = EnvFilter::try_from_env(LOG_ENV).ok().map(|filter| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter)
    });

    tracing_subscriber::registry()
        .with(main)
        .with(errors)
        .with(status)
        .with(stderr)
        .try_init()
        .map_err(|e| EimgError::Config(format!("logging already initialised: {e}")))
}

fn is_ours(meta: &Metadata<'_>) -> bool {
    meta.target().starts_with("eimg")
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| EimgError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// Rename `path` to `<path>.1` when it has grown past `max_bytes`.
///
/// Returns whether a rotation happened.
pub fn rotate_if_needed(path: &Path, max_bytes: u64) -> Result<bool> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(_) => return Ok(false),
    };
    if size <= max_bytes {
        return Ok(false);
    }

    let rotated = rotated_path(path);
    if rotated.exists() {
        fs::remove_file(&rotated)?;
    }
    fs::rename(path, &rotated)?;
    Ok(true)
}

fn rotated_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".1");
    PathBuf::from(name)
}

/// Every `*.log` and rotated `*.log.N` file in `dir`, sorted by name.
pub fn list(dir: &Path) -> Result<Vec<LogFileInfo>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_log_name(&name) {
            continue;
        }
        let meta = entry.metadata()?;
        if meta.is_file() {
            files.push(LogFileInfo {
                name,
                size: meta.len(),
            });
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Truncate live logs and delete rotated ones. Returns the file count.
///
/// Live logs are truncated rather than deleted so an installed
/// subscriber keeps writing to the same files.
pub fn clear(dir: &Path) -> Result<usize> {
    let mut cleared = 0;
    for file in list(dir)? {
        let path = dir.join(&file.name);
        if file.name.ends_with(".log") {
            OpenOptions::new().write(true).truncate(true).open(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        cleared += 1;
    }

    tracing::info!(target: STATUS_TARGET, cleared, "logs cleared");
    Ok(cleared)
}

fn is_log_name(name: &str) -> bool {
    if name.ends_with(".log") {
        return true;
    }
    match name.rsplit_once(".log.") {
        Some((stem, n)) => !stem.is_empty() && !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}
