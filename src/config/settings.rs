use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::Argon2Params;
use crate::errors::{EimgError, Result};
use crate::vault::SchemeVersion;

/// User settings, loaded from `<eimg home>/settings.toml`.
///
/// Every field has a sensible default so eimg works out-of-the-box
/// without any settings file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the EPIC JSON API (natural-color collection).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL of the EPIC image archive.
    #[serde(default = "default_archive_base_url")]
    pub archive_base_url: String,

    /// Timeout for JSON requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for image downloads, in seconds.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Cache directory (default: `<home>/cache`).
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Log directory (default: `<home>/logs`).
    #[serde(default)]
    pub logs_dir: Option<PathBuf>,

    /// A log file above this size is rotated at startup.
    #[serde(default = "default_log_max_bytes")]
    pub log_max_bytes: u64,

    /// Scheme for newly stored API keys.
    #[serde(default)]
    pub encryption_scheme: SchemeVersion,

    /// Argon2 memory cost in KiB (scheme 2.0 only).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (scheme 2.0 only).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (scheme 2.0 only).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_api_base_url() -> String {
    "https://api.nasa.gov/EPIC/api/natural".to_string()
}

fn default_archive_base_url() -> String {
    "https://epic.gsfc.nasa.gov/archive/natural".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_download_timeout_secs() -> u64 {
    60
}

fn default_log_max_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            archive_base_url: default_archive_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            cache_dir: None,
            logs_dir: None,
            log_max_bytes: default_log_max_bytes(),
            encryption_scheme: SchemeVersion::default(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Name of the settings file inside the eimg home.
    pub const FILE_NAME: &'static str = "settings.toml";

    /// Load settings from `<home>/settings.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(home: &Path) -> Result<Self> {
        let path = home.join(Self::FILE_NAME);

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;

        toml::from_str(&contents).map_err(|e| {
            EimgError::Config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Resolved cache directory.
    pub fn cache_dir(&self, home: &Path) -> PathBuf {
        resolve(home, self.cache_dir.as_deref(), "cache")
    }

    /// Resolved log directory.
    pub fn logs_dir(&self, home: &Path) -> PathBuf {
        resolve(home, self.logs_dir.as_deref(), "logs")
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

/// Relative paths are taken relative to the eimg home.
fn resolve(home: &Path, configured: Option<&Path>, default_name: &str) -> PathBuf {
    match configured {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => home.join(p),
        None => home.join(default_name),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
