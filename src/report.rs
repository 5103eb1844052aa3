// src/report.rs

//! Short tagged status lines for verbose output.
//!
//! These sit next to `tracing`: tracing carries the diagnostic stream, the
//! tags are the terse operator-facing lines the `--verbose` flag turns on.

use owo_colors::OwoColorize;

pub fn ok(msg: &str) {
    println!("{} {msg}", "[OK]".green().bold());
}

pub fn warn(msg: &str) {
    println!("{} {msg}", "[WARN]".yellow().bold());
}

pub fn fail(msg: &str) {
    eprintln!("{} {msg}", "[FAIL]".red().bold());
}
