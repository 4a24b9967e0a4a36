//! Terminal output helpers
//!
//! Uses `cliclack` styling on an interactive terminal and falls back to
//! plain prefixed lines when piped or running under CI.

mod context;
mod output;

pub use context::UiContext;
pub use output::{intro, key_value, step_info, step_ok, step_ok_detail, step_warn_hint};
