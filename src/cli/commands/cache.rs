//! `eimg cache-info` and `eimg cache-clear [type]`.

use crate::cache::CacheKind;
use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;

/// Execute the `cache-info` command.
pub fn execute_info(ctx: &Context) -> Result<()> {
    let cache = ctx.cache()?;
    output::info(&format!("Cache directory: {}", cache.root().display()));
    output::print_cache_stats(&cache.stats()?);
    Ok(())
}

/// Execute the `cache-clear` command.
pub fn execute_clear(ctx: &Context, kind: &str) -> Result<()> {
    let kind: CacheKind = kind.parse()?;
    let cache = ctx.cache()?;

    output::info(&format!("Clearing {kind} cache..."));
    let cleared = cache.clear(kind)?;
    output::success(&format!("Cleared {cleared} files from cache"));
    Ok(())
}
