//! CLI command implementations

pub mod add;
pub mod cat;
pub mod config;
pub mod list;
pub mod remove;
pub mod stats;

pub use add::execute as add;
pub use cat::execute as cat;
pub use config::execute as config;
pub use list::execute as list;
pub use remove::execute as remove;
pub use stats::execute as stats;

use crate::cache::Cache;
use crate::config::Config;
use crate::error::CacheResult;
use tracing::debug;

/// Open the configured object directory
pub(crate) fn open_cache(config: &Config) -> CacheResult<Cache> {
    let directory = config.cache.resolved_directory();
    debug!("Opening cache at {}", directory.display());
    Cache::open(directory, config.cache.capacity_hint)
}
