//! `eimg open-cache|open-logs|open-config`: show a directory in the
//! platform file manager.

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::cli::output;
use crate::errors::{EimgError, Result};

/// Execute one of the `open-*` commands.
pub fn execute(label: &str, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| EimgError::WriteFailed {
        path: dir.to_path_buf(),
        source,
    })?;

    let Some(opener) = file_manager() else {
        output::info(&format!("{label} directory: {}", dir.display()));
        return Ok(());
    };

    match Command::new(opener).arg(dir).status() {
        Ok(status) if status.success() => {
            tracing::info!(dir = %dir.display(), "opened {label} directory");
            output::success(&format!("Opened {label} directory"));
        }
        Ok(status) => {
            output::warning(&format!("{opener} exited with {status}"));
            output::info(&format!("{label} directory: {}", dir.display()));
        }
        Err(e) => {
            output::warning(&format!("Could not launch {opener}: {e}"));
            output::info(&format!("{label} directory: {}", dir.display()));
        }
    }
    Ok(())
}

fn file_manager() -> Option<&'static str> {
    if cfg!(target_os = "windows") {
        Some("explorer")
    } else if cfg!(target_os = "macos") {
        Some("open")
    } else if cfg!(target_os = "linux") {
        Some("xdg-open")
    } else {
        None
    }
}
