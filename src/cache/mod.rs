//! Local image cache.
//!
//! Layout under the cache root:
//!
//! ```text
//! images/       <filename>.png
//! metadata/     <filename>.png.json
//! thumbnails/   *.jpg
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::errors::{EimgError, Result};
use crate::logging::STATUS_TARGET;

const IMAGES_DIR: &str = "images";
const METADATA_DIR: &str = "metadata";
const THUMBNAILS_DIR: &str = "thumbnails";

/// Which part of the cache to clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheKind {
    #[default]
    All,
    Images,
    Metadata,
    Thumbnails,
}

impl CacheKind {
    fn includes(self, other: CacheKind) -> bool {
        self == CacheKind::All || self == other
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheKind::All => "all",
            CacheKind::Images => "images",
            CacheKind::Metadata => "metadata",
            CacheKind::Thumbnails => "thumbnails",
        })
    }
}

impl FromStr for CacheKind {
    type Err = EimgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(CacheKind::All),
            "images" => Ok(CacheKind::Images),
            "metadata" => Ok(CacheKind::Metadata),
            "thumbnails" => Ok(CacheKind::Thumbnails),
            other => Err(EimgError::InvalidInput(format!(
                "unknown cache type '{other}' (use all, images, metadata or thumbnails)"
            ))),
        }
    }
}

/// File counts and sizes for `cache-info`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub images: usize,
    /// Total size of cached images, in bytes.
    pub total_size: u64,
    pub metadata_files: usize,
    pub thumbnails: usize,
}

/// Sidecar written next to every cached image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedImageMetadata {
    pub image_name: String,
    pub date: String,
    pub url: String,
    pub download_time: DateTime<Local>,
    pub file_size: u64,
}

pub struct CacheManager {
    root: PathBuf,
}

impl CacheManager {
    /// Open the cache at `root`, creating the directory layout.
    pub fn new(root: &Path) -> Result<Self> {
        for sub in [IMAGES_DIR, METADATA_DIR, THUMBNAILS_DIR] {
            let dir = root.join(sub);
            fs::create_dir_all(&dir).map_err(|source| EimgError::WriteFailed {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join(METADATA_DIR)
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.root.join(THUMBNAILS_DIR)
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();

        for path in files_with_extension(&self.images_dir(), "png")? {
            // Files that vanish mid-scan are skipped.
            if let Ok(meta) = fs::metadata(&path) {
                stats.images += 1;
                stats.total_size += meta.len();
            }
        }
        stats.metadata_files = files_with_extension(&self.metadata_dir(), "json")?.len();
        stats.thumbnails = files_with_extension(&self.thumbnails_dir(), "jpg")?.len();

        Ok(stats)
    }

    /// Remove cached files of `kind`. Returns how many were deleted.
    pub fn clear(&self, kind: CacheKind) -> Result<usize> {
        let targets = [
            (CacheKind::Images, self.images_dir(), "png"),
            (CacheKind::Metadata, self.metadata_dir(), "json"),
            (CacheKind::Thumbnails, self.thumbnails_dir(), "jpg"),
        ];

        let mut cleared = 0;
        for (part, dir, ext) in targets {
            if !kind.includes(part) {
                continue;
            }
            for path in files_with_extension(&dir, ext)? {
                match fs::remove_file(&path) {
                    Ok(()) => cleared += 1,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "could not remove cache file")
                    }
                }
            }
        }

        tracing::info!(target: STATUS_TARGET, kind = %kind, cleared, "cache cleared");
        Ok(cleared)
    }

    /// Store an image and its metadata sidecar. Returns the cached image path.
    pub fn store(
        &self,
        image: &[u8],
        filename: &str,
        metadata: &CachedImageMetadata,
    ) -> Result<PathBuf> {
        if image.is_empty() || filename.is_empty() {
            return Err(EimgError::InvalidInput(
                "cannot cache an empty image or filename".into(),
            ));
        }

        let image_path = self.images_dir().join(filename);
        fs::write(&image_path, image).map_err(|source| EimgError::WriteFailed {
            path: image_path.clone(),
            source,
        })?;

        let json = serde_json::to_vec_pretty(metadata)
            .map_err(|e| EimgError::Serialization(format!("cache metadata: {e}")))?;
        let meta_path = self.metadata_dir().join(format!("{filename}.json"));
        fs::write(&meta_path, json).map_err(|source| EimgError::WriteFailed {
            path: meta_path,
            source,
        })?;

        tracing::info!(file = filename, "image cached");
        Ok(image_path)
    }
}

fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_metadata(size: u64) -> CachedImageMetadata {
        CachedImageMetadata {
            image_name: "epic_1b_20240101003633".into(),
            date: "2024-01-01 00:31:45".into(),
            url: "https://epic.gsfc.nasa.gov/archive/natural/2024/01/01/png/epic_1b_20240101003633.png"
                .into(),
            download_time: Local::now(),
            file_size: size,
        }
    }

    #[test]
    fn new_creates_layout() {
        let tmp = TempDir::new().unwrap();
        let cache = CacheManager::new(&tmp.path().join("cache")).unwrap();
        assert!(cache.images_dir().is_dir());
        assert!(cache.metadata_dir().is_dir());
        assert!(cache.thumbnails_dir().is_dir());
        assert_eq!(cache.stats().unwrap(), CacheStats::default());
    }

    #[test]
    fn store_then_stats() {
        let tmp = TempDir::new().unwrap();
        let cache = CacheManager::new(tmp.path()).unwrap();

        let path = cache.store(&[1, 2, 3, 4], "earth.png", &sample_metadata(4)).unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3, 4]);

        let sidecar = fs::read_to_string(cache.metadata_dir().join("earth.png.json")).unwrap();
        let parsed: CachedImageMetadata = serde_json::from_str(&sidecar).unwrap();
        assert_eq!(parsed.file_size, 4);

        let stats = cache.stats().unwrap();
        assert_eq!(stats.images, 1);
        assert_eq!(stats.total_size, 4);
        assert_eq!(stats.metadata_files, 1);
    }

    #[test]
    fn store_rejects_empty_image() {
        let tmp = TempDir::new().unwrap();
        let cache = CacheManager::new(tmp.path()).unwrap();
        assert!(cache.store(&[], "x.png", &sample_metadata(0)).is_err());
    }

    #[test]
    fn stats_ignores_other_extensions() {
        let tmp = TempDir::new().unwrap();
        let cache = CacheManager::new(tmp.path()).unwrap();
        fs::write(cache.images_dir().join("notes.txt"), "x").unwrap();
        fs::write(cache.thumbnails_dir().join("a.jpg"), "x").unwrap();
        fs::write(cache.thumbnails_dir().join("b.png"), "x").unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.images, 0);
        assert_eq!(stats.thumbnails, 1);
    }

    #[test]
    fn clear_by_kind() {
        let tmp = TempDir::new().unwrap();
        let cache = CacheManager::new(tmp.path()).unwrap();
        cache.store(&[1], "a.png", &sample_metadata(1)).unwrap();
        cache.store(&[2], "b.png", &sample_metadata(1)).unwrap();
        fs::write(cache.thumbnails_dir().join("a.jpg"), "x").unwrap();

        assert_eq!(cache.clear(CacheKind::Metadata).unwrap(), 2);
        assert_eq!(cache.stats().unwrap().images, 2);

        assert_eq!(cache.clear(CacheKind::All).unwrap(), 3);
        assert_eq!(cache.stats().unwrap(), CacheStats::default());
    }

    #[test]
    fn cache_kind_parsing() {
        assert_eq!("all".parse::<CacheKind>().unwrap(), CacheKind::All);
        assert_eq!("Images".parse::<CacheKind>().unwrap(), CacheKind::Images);
        assert_eq!(CacheKind::Thumbnails.to_string(), "thumbnails");
        assert!("bogus".parse::<CacheKind>().is_err());
    }
}
