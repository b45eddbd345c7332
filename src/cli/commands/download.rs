//! `eimg download` and `eimg download-date <date>`.

use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::download::{save_image, DownloadOptions};
use crate::epic::{parse_date, EpicClient, ImageMetadata};
use crate::errors::{EimgError, Result};

/// Execute the `download` command (latest image).
pub fn execute_latest(ctx: &mut Context, cli: &Cli) -> Result<()> {
    let client = ctx.client()?;

    output::info("Fetching latest Earth image metadata...");
    let images = client.latest()?;
    fetch(ctx, cli, &client, &images)
}

/// Execute the `download-date` command.
pub fn execute_date(ctx: &mut Context, cli: &Cli, date: &str) -> Result<()> {
    // Validate before asking for the passphrase.
    let day = parse_date(date)?;
    let client = ctx.client()?;

    output::info(&format!("Fetching Earth image for {day}..."));
    let images = client.by_date(day)?;
    fetch(ctx, cli, &client, &images)
}

fn fetch(ctx: &Context, cli: &Cli, client: &EpicClient, images: &[ImageMetadata]) -> Result<()> {
    let meta = images
        .first()
        .ok_or_else(|| EimgError::NoImages("No images available".into()))?;

    let cache = if cli.no_cache {
        None
    } else {
        match ctx.cache() {
            Ok(c) => Some(c),
            Err(e) => {
                output::warning(&format!("Cache unavailable: {e}"));
                None
            }
        }
    };

    let opts = DownloadOptions {
        output_dir: cli.output.clone(),
        filename: cli.filename.clone(),
        use_cache: !cli.no_cache,
    };

    output::info(&format!("Downloading image: {}", meta.image));
    output::tip(&format!("Date: {}", meta.date));

    let bar = ProgressBar::no_length();
    bar.set_style(
        ProgressStyle::with_template("{bar:30.cyan/dim} {bytes}/{total_bytes} ({percent}%)")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let saved = save_image(client, meta, &opts, cache.as_ref(), |done, total| {
        if let Some(total) = total {
            bar.set_length(total);
        }
        bar.set_position(done);
    });
    bar.finish_and_clear();
    let saved = saved?;

    output::success(&format!("Image saved to: {}", saved.path.display()));
    output::tip(&format!("File size: {}", output::format_size(saved.bytes)));
    if let Some(cached) = saved.cached {
        output::tip(&format!("Cached at: {}", cached.display()));
    }

    Ok(())
}
