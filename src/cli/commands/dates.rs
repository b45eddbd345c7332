//! `eimg dates`: list dates with available imagery.

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;

/// How many dates to print.
const SHOWN: usize = 10;

/// Execute the `dates` command.
pub fn execute(ctx: &mut Context) -> Result<()> {
    let client = ctx.client()?;

    output::info("Fetching available dates...");
    let dates = client.available_dates()?;

    output::success(&format!("Found {} available dates", dates.len()));
    for (i, date) in dates.iter().take(SHOWN).enumerate() {
        println!("   {}. {date}", i + 1);
    }
    if dates.len() > SHOWN {
        println!("   ... and {} more", dates.len() - SHOWN);
    }

    Ok(())
}
