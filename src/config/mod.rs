//! Configuration: user settings (`settings.toml`) and the credential
//! store (`config.json`), both under the eimg home directory.

pub mod settings;
pub mod store;

use std::path::PathBuf;

use crate::errors::{EimgError, Result};

pub use settings::Settings;
pub use store::{ConfigFile, ConfigStore, StoredCredential, CONFIG_FILE};

/// Environment variable that overrides the eimg home directory.
pub const HOME_ENV: &str = "EIMG_HOME";

/// Resolve the eimg home: `$EIMG_HOME`, else `~/.eimg`.
pub fn home_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    dirs::home_dir()
        .map(|home| home.join(".eimg"))
        .ok_or(EimgError::NoHomeDir)
}
