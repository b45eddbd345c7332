//! Saving an EPIC image to disk, and optionally to the cache.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::cache::{CacheManager, CachedImageMetadata};
use crate::config::store::rename_with_fallback;
use crate::epic::{EpicClient, ImageMetadata};
use crate::errors::{EimgError, Result};
use crate::logging::STATUS_TARGET;

/// Where and under what name to save a download.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub output_dir: PathBuf,
    pub filename: Option<String>,
    pub use_cache: bool,
}

/// A finished download.
#[derive(Debug, Clone)]
pub struct SavedImage {
    pub path: PathBuf,
    pub url: String,
    pub bytes: u64,
    pub cached: Option<PathBuf>,
}

/// Output file name: the requested name, or `earth_<timestamp>.png`.
///
/// `.png` is appended when missing (case-insensitive) and every character
/// other than ASCII alphanumerics and `._-` is dropped.
pub fn resolve_filename(requested: Option<&str>, now: DateTime<Local>) -> Result<String> {
    let mut name = match requested.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => format!("earth_{}.png", now.format("%Y%m%d_%H%M%S")),
    };
    if !name.to_ascii_lowercase().ends_with(".png") {
        name.push_str(".png");
    }

    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    // A name of only dots would escape the output directory.
    if cleaned.trim_matches('.').is_empty() || cleaned.eq_ignore_ascii_case(".png") {
        return Err(EimgError::InvalidInput(format!(
            "'{}' is not a usable file name",
            requested.unwrap_or_default()
        )));
    }
    Ok(cleaned)
}

/// Download the image described by `meta` into `opts.output_dir`.
pub fn save_image(
    client: &EpicClient,
    meta: &ImageMetadata,
    opts: &DownloadOptions,
    cache: Option<&CacheManager>,
    progress: impl FnMut(u64, Option<u64>),
) -> Result<SavedImage> {
    let url = client.image_url(meta)?;
    let filename = resolve_filename(opts.filename.as_deref(), Local::now())?;

    fs::create_dir_all(&opts.output_dir).map_err(|source| EimgError::WriteFailed {
        path: opts.output_dir.clone(),
        source,
    })?;
    let path = opts.output_dir.join(&filename);

    tracing::info!(image = %meta.image, url = %url, "starting download");

    // The destination is only replaced once the whole body has arrived.
    let part_path = partial_path(&opts.output_dir, &filename);
    let keep_copy = opts.use_cache && cache.is_some();
    let file = File::create(&part_path).map_err(|source| EimgError::WriteFailed {
        path: part_path.clone(),
        source,
    })?;
    let mut sink = Tee::new(BufWriter::new(file), keep_copy);

    let bytes = match client.download(&url, &mut sink, progress) {
        Ok(n) => n,
        Err(e) => {
            drop(sink);
            remove_partial(&part_path);
            return Err(e);
        }
    };
    let copy = sink.into_copy();

    rename_with_fallback(&part_path, &path).map_err(|source| EimgError::WriteFailed {
        path: path.clone(),
        source,
    })?;

    let cached = match cache.filter(|_| opts.use_cache) {
        Some(cache) => {
            let record = CachedImageMetadata {
                image_name: meta.image.clone(),
                date: meta.date.clone(),
                url: url.clone(),
                download_time: Local::now(),
                file_size: bytes,
            };
            match cache.store(&copy, &filename, &record) {
                Ok(p) => Some(p),
                Err(e) => {
                    // The download itself succeeded; a cache failure is not fatal.
                    tracing::error!(error = %e, "failed to save image to cache");
                    None
                }
            }
        }
        None => None,
    };

    tracing::info!(target: STATUS_TARGET, file = %filename, bytes, "download completed");

    Ok(SavedImage {
        path,
        url,
        bytes,
        cached,
    })
}

/// Temp file a download streams into before it is renamed into place.
fn partial_path(dir: &Path, filename: &str) -> PathBuf {
    dir.join(format!(".{filename}.part"))
}

fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "could not remove partial download");
    }
}

/// Writes through to `inner`, optionally keeping an in-memory copy.
struct Tee<W> {
    inner: W,
    copy: Option<Vec<u8>>,
}

impl<W: Write> Tee<W> {
    fn new(inner: W, keep_copy: bool) -> Self {
        Self {
            inner,
            copy: keep_copy.then(Vec::new),
        }
    }

    /// Drop the writer, closing it, and keep the in-memory copy.
    fn into_copy(self) -> Vec<u8> {
        self.copy.unwrap_or_default()
    }
}

impl<W: Write> Write for Tee<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        if let Some(copy) = self.copy.as_mut() {
            copy.extend_from_slice(&buf[..n]);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
