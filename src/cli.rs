// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! NOTE: this expects `clap` to be built with the `derive` feature, e.g.:
//! `clap = { version = "4.5", features = ["derive"] }` in `Cargo.toml`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchrun",
    version,
    about = "Watch files and directories, run a command when they change.",
    long_about = None
)]
pub struct CliArgs {
    /// Files or directory roots to watch. Merged with `watchFiles` from the
    /// config file.
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,

    /// Command to run on each change, given after `--`. The literal `{}` in
    /// a token is replaced with the changed file's path.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,

    /// Path to the JSON config file.
    ///
    /// Default: `watchrun.json` in the current working directory, if it
    /// exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Write the effective settings back to the config file and exit.
    #[arg(long)]
    pub save_config: bool,

    /// Print a status line per event and per command run.
    #[arg(short, long)]
    pub verbose: bool,

    /// Clear the console before each command run.
    #[arg(long)]
    pub clear: bool,

    /// Watch given directories themselves only, not their subdirectories.
    #[arg(long)]
    pub non_recursive: bool,

    /// Debounce window in milliseconds for collapsing bursts of identical
    /// events.
    #[arg(long, value_name = "MS", default_value_t = 100)]
    pub debounce_ms: u64,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
