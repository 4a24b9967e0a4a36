//! Cat command - write an object's body to stdout

use super::open_cache;
use crate::cli::args::SelectArgs;
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use std::io::{self, Write};

/// Execute the cat command
pub fn execute(args: SelectArgs, config: &Config) -> CacheResult<()> {
    let mut cache = open_cache(config)?;

    let id = cache
        .find_first(&args.key, &args.value)
        .ok_or_else(|| CacheError::EntryNotFound {
            key: args.key.clone(),
            value: args.value.clone(),
        })?;

    cache.incref(id)?;
    let body = cache.get_body(id)?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&body)
        .and_then(|()| stdout.flush())
        .map_err(|e| CacheError::io("writing body to stdout", e))?;

    drop(body);
    cache.decref(id)?;
    cache.close();
    Ok(())
}
