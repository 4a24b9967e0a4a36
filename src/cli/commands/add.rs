//! Add command - store a new object

use super::open_cache;
use crate::cli::args::AddArgs;
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use crate::storage::Labels;
use std::fs;
use std::io::{self, Read};

/// Execute the add command
pub fn execute(args: AddArgs, config: &Config) -> CacheResult<()> {
    let data = match &args.file {
        Some(path) => fs::read(path)
            .map_err(|e| CacheError::io(format!("reading {}", path.display()), e))?,
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .map_err(|e| CacheError::io("reading stdin", e))?;
            buf
        }
    };

    let labels: Labels = args.labels.into_iter().collect();

    let mut cache = open_cache(config)?;
    let id = cache.add(&labels, &data)?;
    if let Some(entry) = cache.entry(id) {
        println!("{}", entry.filename());
    }
    cache.decref(id)?;
    cache.close();

    Ok(())
}
