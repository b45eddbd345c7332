//! `eimg version`: display version and build features.

use console::style;

use crate::crypto;
use crate::errors::Result;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    println!("eimg {}", env!("CARGO_PKG_VERSION"));

    let encryption = if crypto::ENABLED {
        style("enabled (PBKDF2 + Fernet, Argon2id + AES-256-GCM)").green()
    } else {
        style("disabled").red()
    };
    println!("  encryption: {encryption}");
    println!("  data source: NASA EPIC API (https://epic.gsfc.nasa.gov/)");

    Ok(())
}
