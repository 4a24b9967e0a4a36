//! Output functions for consistent CLI formatting

use super::context::UiContext;
use console::{style, StyledObject};

/// Plain-mode status line: `  [TAG] message`
fn plain_line(tag: StyledObject<&str>, message: &str) {
    println!("  {} {}", tag, message);
}

/// Display intro banner
pub fn intro(ctx: &UiContext, title: &str) {
    let title = style(title).magenta().bold();
    if ctx.use_fancy_output() {
        cliclack::intro(title).ok();
    } else {
        println!("{}\n", title);
    }
}

/// Display a success step
pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(message).ok();
    } else {
        plain_line(style("[OK]").green(), message);
    }
}

/// Display a success step with detail, e.g. the path that was written
pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(format!("{} ({})", message, style(detail).dim())).ok();
    } else {
        plain_line(style("[OK]").green(), &format!("{} ({})", message, detail));
    }
}

/// Display a warning step with hint
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::warning(format!("{} - {}", message, style(hint).dim())).ok();
    } else {
        plain_line(style("[WARN]").yellow(), &format!("{} - {}", message, hint));
    }
}

/// Display an info step
pub fn step_info(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::info(message).ok();
    } else {
        plain_line(style("[INFO]").cyan(), message);
    }
}

/// Print a `key: value` row, as used by `stats`
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    let key = if ctx.use_fancy_output() {
        style(key).dim().to_string()
    } else {
        key.to_string()
    };
    println!("  {}: {}", key, value);
}
