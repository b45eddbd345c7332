//! `eimg config`: show configuration and security status.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::cli::Context;
use crate::config::{Settings, StoredCredential};
use crate::crypto;
use crate::errors::Result;

/// Execute the `config` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let credential = match ctx.store.load().and_then(|c| c.credential()) {
        Ok(StoredCredential::Encrypted(record)) => {
            style(format!("encrypted (version {})", record.scheme))
                .green()
                .to_string()
        }
        Ok(StoredCredential::Plaintext(_)) => style("plain text (not encrypted)").yellow().to_string(),
        Ok(StoredCredential::Missing) => style("not set").red().to_string(),
        Err(e) => style(format!("unreadable: {e}")).red().to_string(),
    };

    let encryption = if crypto::ENABLED {
        style(format!("available (new keys use {})", ctx.vault.scheme()))
            .green()
            .to_string()
    } else {
        style("unavailable in this build").red().to_string()
    };

    let permissions = match ctx.store.dir_mode() {
        Some(0o700) => style("700 (secure)".to_string()).green().to_string(),
        Some(mode) => style(format!("{mode:o} (should be 700)")).yellow().to_string(),
        None if cfg!(unix) => "directory not created yet".to_string(),
        None => "not checked on this platform".to_string(),
    };

    let writable = if ctx.store.is_writable() {
        style("yes").green().to_string()
    } else {
        style("no").red().to_string()
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["Config file".to_string(), ctx.store.path().display().to_string()]);
    table.add_row(vec![
        "Settings file".to_string(),
        ctx.home.join(Settings::FILE_NAME).display().to_string(),
    ]);
    table.add_row(vec!["API key".to_string(), credential]);
    table.add_row(vec!["Encryption".to_string(), encryption]);
    table.add_row(vec!["Directory permissions".to_string(), permissions]);
    table.add_row(vec!["Directory writable".to_string(), writable]);
    table.add_row(vec!["Cache directory".to_string(), ctx.cache_dir().display().to_string()]);
    table.add_row(vec!["Logs directory".to_string(), ctx.logs_dir().display().to_string()]);
    table.add_row(vec!["API endpoint".to_string(), ctx.settings.api_base_url.clone()]);

    println!("{table}");
    Ok(())
}
