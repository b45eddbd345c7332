//! `eimg wipe`: securely delete the stored configuration.

use crate::cli::output;
use crate::cli::{confirm, Context};
use crate::errors::Result;

/// Execute the `wipe` command.
pub fn execute(ctx: &mut Context, yes: bool) -> Result<()> {
    if !confirm("Wipe all configuration, including the stored API key?", yes)? {
        output::info("Cancelled.");
        return Ok(());
    }

    let wiped = ctx.store.wipe()?;
    ctx.vault.forget_passphrase();

    if wiped {
        output::success("Configuration securely wiped");
    } else {
        output::info("Nothing to wipe: no configuration file found.");
    }
    Ok(())
}
