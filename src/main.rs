//! labelcache - disk-backed cache of labeled objects
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use labelcache::cli::{Cli, Commands};
use labelcache::config::ConfigManager;
use labelcache::error::CacheResult;
use std::io;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load()?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let level = match cli.verbose {
        0 if config.general.verbose => "info",
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::new(format!("labelcache={level}"));

    // Logs go to stderr; `cat` owns stdout.
    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .without_time()
            .init();
    }

    if let Some(dir) = cli.dir {
        debug!("Object directory overridden: {}", dir.display());
        config.cache.directory = Some(dir);
    }

    match cli.command {
        Commands::Add(args) => labelcache::cli::commands::add(args, &config),
        Commands::List(args) => labelcache::cli::commands::list(args, &config),
        Commands::Cat(args) => labelcache::cli::commands::cat(args, &config),
        Commands::Remove(args) => labelcache::cli::commands::remove(args, &config),
        Commands::Stats => labelcache::cli::commands::stats(&config),
        Commands::Config(args) => {
            labelcache::cli::commands::config(args, &config, &config_manager)
        }
    }
}
