//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::cache::CacheStats;
use crate::epic::ImageMetadata;
use crate::logging::LogFileInfo;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let b = bytes as f64;
    if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Print up to `limit` image entries, one table per image.
pub fn print_metadata(items: &[ImageMetadata], limit: usize) {
    for (i, item) in items.iter().take(limit).enumerate() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![format!("Image {}", i + 1), String::new()]);

        table.add_row(vec!["Identifier".to_string(), or_na(&item.identifier)]);
        table.add_row(vec!["Date".to_string(), or_na(&item.date)]);
        table.add_row(vec![
            "Caption".to_string(),
            item.caption.clone().unwrap_or_else(|| "N/A".into()),
        ]);
        if let Some(c) = item.centroid_coordinates {
            table.add_row(vec!["Coordinates".to_string(), format!("{}, {}", c.lat, c.lon)]);
        }
        if let Some(p) = item.dscovr_j2000_position {
            table.add_row(vec![
                "Satellite position".to_string(),
                format!("x={}, y={}, z={}", p.x, p.y, p.z),
            ]);
        }

        println!("{table}");
    }
}

fn or_na(value: &str) -> String {
    if value.is_empty() {
        "N/A".to_string()
    } else {
        value.to_string()
    }
}

/// Print cache statistics.
pub fn print_cache_stats(stats: &CacheStats) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Cached images", "Total size", "Metadata files", "Thumbnails"]);
    table.add_row(vec![
        stats.images.to_string(),
        format_size(stats.total_size),
        stats.metadata_files.to_string(),
        stats.thumbnails.to_string(),
    ]);
    println!("{table}");
}

/// Print a table of log files (Name, Size).
pub fn print_log_files(files: &[LogFileInfo]) {
    if files.is_empty() {
        info("No log files yet.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Log file", "Size"]);
    for f in files {
        table.add_row(vec![f.name.clone(), format_size(f.size)]);
    }
    println!("{table}");
}
