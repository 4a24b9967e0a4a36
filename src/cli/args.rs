//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// labelcache - disk-backed cache of labeled objects
///
/// Stores immutable blobs with key/value labels, one file per object,
/// and looks them up by label.
#[derive(Parser, Debug)]
#[command(name = "labelcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "LABELCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Object directory (overrides cache.directory)
    #[arg(short, long, global = true, env = "LABELCACHE_DIR")]
    pub dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a file (or stdin) under a set of labels
    Add(AddArgs),

    /// List stored objects
    List(ListArgs),

    /// Write the body of the first matching object to stdout
    Cat(SelectArgs),

    /// Delete every matching object
    Remove(SelectArgs),

    /// Show entry count and disk usage
    Stats,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the add command
#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Label to attach (KEY=VALUE, repeatable)
    #[arg(short, long = "label", value_parser = parse_label)]
    pub labels: Vec<(String, String)>,

    /// File to store (reads stdin when omitted)
    pub file: Option<PathBuf>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only show objects with this label key...
    #[arg(short, long, requires = "value")]
    pub key: Option<String>,

    /// ...set to this value
    #[arg(long, requires = "key")]
    pub value: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Label selector shared by cat and remove
#[derive(Parser, Debug)]
pub struct SelectArgs {
    /// Label key to match
    #[arg(short, long)]
    pub key: String,

    /// Label value to match
    #[arg(long)]
    pub value: String,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Parse a label in KEY=VALUE format
fn parse_label(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE format: no '=' found in '{s}'"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE format: empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
