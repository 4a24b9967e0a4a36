//! List command - show stored objects

use super::open_cache;
use super::stats::format_bytes;
use crate::cache::Cache;
use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::Config;
use crate::error::CacheResult;
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// One object as shown by `list`
#[derive(Debug, Serialize)]
struct ObjectRow {
    filename: String,
    labels: BTreeMap<String, String>,
    size: Option<usize>,
    #[serde(skip)]
    label_text: String,
}

/// Execute the list command
pub fn execute(args: ListArgs, config: &Config) -> CacheResult<()> {
    let mut cache = open_cache(config)?;

    let ids = match (&args.key, &args.value) {
        (Some(key), Some(value)) => cache.find_all(Some(key.as_str()), value),
        _ => cache.entries().to_vec(),
    };

    let rows = collect_rows(&mut cache, &ids);
    cache.close();

    if rows.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No objects stored");
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Plain => print_plain(&rows),
    }

    Ok(())
}

fn collect_rows(cache: &mut Cache, ids: &[crate::cache::EntryId]) -> Vec<ObjectRow> {
    let mut rows = Vec::with_capacity(ids.len());
    for &id in ids {
        let Some(entry) = cache.entry(id) else {
            continue;
        };
        let filename = entry.filename().to_string();
        let label_text = entry.labels().to_string();

        // First occurrence of a key wins, same as lookups.
        let mut labels = BTreeMap::new();
        for (k, v) in entry.labels().iter() {
            labels.entry(k.to_string()).or_insert_with(|| v.to_string());
        }

        let size = match cache.get_body(id) {
            Ok(body) => Some(body.len()),
            Err(e) => {
                warn!("Cannot map {}: {}", filename, e);
                None
            }
        };

        rows.push(ObjectRow {
            filename,
            labels,
            size,
            label_text,
        });
    }
    rows
}

fn print_table(rows: &[ObjectRow]) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Objects");

    println!(
        "{:<10} {:<12} {:<50}",
        style("FILE").bold(),
        style("SIZE").bold(),
        style("LABELS").bold()
    );
    println!("{}", "-".repeat(72));

    for row in rows {
        let size = match row.size {
            Some(n) => format_bytes(n as u64),
            None => style("unreadable").red().to_string(),
        };
        println!("{:<10} {:<12} {:<50}", row.filename, size, row.label_text);
    }

    println!();
    println!("{} object(s)", rows.len());
}

fn print_json(rows: &[ObjectRow]) -> CacheResult<()> {
    let json = serde_json::to_string_pretty(rows)?;
    println!("{}", json);
    Ok(())
}

fn print_plain(rows: &[ObjectRow]) {
    for row in rows {
        println!("{}", row.filename);
    }
}
