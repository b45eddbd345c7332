//! `eimg metadata [date]`: show image metadata.

use crate::cli::output;
use crate::cli::Context;
use crate::epic::parse_date;
use crate::errors::Result;

/// How many images to describe.
const SHOWN: usize = 3;

/// Execute the `metadata` command.
pub fn execute(ctx: &mut Context, date: Option<&str>) -> Result<()> {
    let day = date.map(parse_date).transpose()?;
    let client = ctx.client()?;

    let images = match day {
        Some(day) => {
            output::info(&format!("Metadata for {day}:"));
            client.by_date(day)?
        }
        None => {
            output::info("Latest image metadata:");
            client.latest()?
        }
    };

    output::print_metadata(&images, SHOWN);
    if images.len() > SHOWN {
        output::tip(&format!("{} more image(s) not shown", images.len() - SHOWN));
    }

    Ok(())
}
