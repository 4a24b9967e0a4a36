//! Stats command - summarize the object directory

use super::open_cache;
use crate::config::Config;
use crate::error::CacheResult;
use crate::ui::{self, UiContext};

/// Format bytes as human-readable size (e.g., "1.5 MB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Execute the stats command
pub fn execute(config: &Config) -> CacheResult<()> {
    let ctx = UiContext::detect();
    let cache = open_cache(config)?;

    ui::intro(&ctx, "Cache");
    ui::key_value(
        &ctx,
        "directory",
        &cache.backend().path().display().to_string(),
    );
    ui::key_value(
        &ctx,
        "entries",
        &format!("{} / {}", cache.len(), cache.capacity_hint()),
    );
    ui::key_value(&ctx, "disk usage", &format_bytes(cache.usage_bytes()?));

    cache.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
        assert_eq!(format_bytes(2 * 1024 * 1024 * 1024), "2.0 GB");
    }
}
