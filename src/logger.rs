//! Terminal logging with colored module prefixes.
//!
//! ```ignore
//! log!("load"; "indexed {} articles", count);
//! log!("reload"; "v{} installed", version);
//! ```
//!
//! Lines are truncated to the terminal width unless they span several lines,
//! in which case they are printed whole (item error listings, for example).

use colored::{ColoredString, Colorize};
use crossterm::terminal::size;
use std::{
    io::{Write, stdout},
    sync::OnceLock,
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Calculate total prefix length for a module name.
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails (pipes, CI, tests).
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message with a colored module prefix.
///
/// Single-line messages are truncated to fit the terminal width.
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let message = if message.contains('\n') {
        message
    } else {
        let width = get_terminal_width() as usize;
        let max_msg_len = width.saturating_sub(calc_prefix_len(module.len()));
        truncate_str(message, max_msg_len)
    };

    let mut stdout = stdout().lock();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" => prefix.bright_blue().bold(),
        "watch" | "reload" => prefix.bright_green().bold(),
        "cache" => prefix.bright_magenta().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
