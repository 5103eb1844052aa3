// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! The diagnostic stream sits next to the engine's `[OK]`/`[WARN]`/`[FAIL]`
//! status tags, so its default level follows the same `--verbose` switch:
//! verbose runs get `debug`, quiet runs get `info`. An explicit
//! `--log-level` flag or the `WATCHRUN_LOG` environment variable overrides
//! that coupling.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` flag is given.
pub const LOG_ENV_VAR: &str = "WATCHRUN_LOG";

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup; a second call panics inside
/// `tracing-subscriber`, so only `main` does this.
pub fn init_logging(cli_level: Option<LogLevel>, verbose: bool) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let level = resolve_level(cli_level, env.as_deref(), verbose);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .init();

    Ok(())
}

/// Pick the effective level: CLI flag first, then the environment variable,
/// then a default coupled to the engine's verbose switch.
fn resolve_level(cli: Option<LogLevel>, env: Option<&str>, verbose: bool) -> tracing::Level {
    if let Some(lvl) = cli {
        return lvl.into();
    }
    if let Some(lvl) = env.and_then(|s| s.trim().parse().ok()) {
        return lvl;
    }
    if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
