//! Remove command - delete matching objects

use super::open_cache;
use crate::cli::args::SelectArgs;
use crate::config::Config;
use crate::error::CacheResult;
use crate::ui::{self, UiContext};
use tracing::debug;

/// Execute the remove command
pub fn execute(args: SelectArgs, config: &Config) -> CacheResult<()> {
    let ctx = UiContext::detect();
    let mut cache = open_cache(config)?;

    let matches = cache.find_all(Some(args.key.as_str()), &args.value);
    if matches.is_empty() {
        ui::step_info(
            &ctx,
            &format!("No objects with {}={}", args.key, args.value),
        );
        return Ok(());
    }

    for id in &matches {
        debug!("Marking {} for removal", id);
        cache.mark_for_removal(*id)?;
    }

    let report = cache.delete_pending(false);
    cache.close();

    ui::step_ok(&ctx, &format!("Removed {} object(s)", report.deleted));
    if report.failed_removals > 0 {
        ui::step_warn_hint(
            &ctx,
            &format!("{} file(s) could not be unlinked", report.failed_removals),
            "Run with -v for details",
        );
    }
    Ok(())
}
