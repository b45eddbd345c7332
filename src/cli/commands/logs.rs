//! `eimg logs-info` and `eimg logs-clear`.

use crate::cli::output;
use crate::cli::{confirm, Context};
use crate::errors::Result;
use crate::logging;

/// Execute the `logs-info` command.
pub fn execute_info(ctx: &Context) -> Result<()> {
    let dir = ctx.logs_dir();
    output::info(&format!("Logs directory: {}", dir.display()));

    if !dir.is_dir() {
        output::warning("Logs directory not found.");
        return Ok(());
    }

    output::print_log_files(&logging::list(&dir)?);
    Ok(())
}

/// Execute the `logs-clear` command.
pub fn execute_clear(ctx: &Context, yes: bool) -> Result<()> {
    if !confirm("Clear all logs?", yes)? {
        output::info("Cancelled.");
        return Ok(());
    }

    let cleared = logging::clear(&ctx.logs_dir())?;
    output::success(&format!("Cleared {cleared} log files"));
    Ok(())
}
