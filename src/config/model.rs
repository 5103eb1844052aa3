// src/config/model.rs

use serde::{Deserialize, Serialize};

/// Persisted configuration, stored as JSON.
///
/// A direct mapping of the on-disk document:
///
/// ```json
/// {
///   "isVerbose": true,
///   "isClearConsole": false,
///   "watchFiles": ["src", "Cargo.toml"],
///   "command": ["cargo", "test"]
/// }
/// ```
///
/// All keys are optional and default when missing; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigFile {
    /// Print terse status lines per event and per command run.
    pub is_verbose: bool,

    /// Clear the console before every command run.
    pub is_clear_console: bool,

    /// Paths (files or directory roots) to watch.
    pub watch_files: Vec<String>,

    /// Command tokens; the literal `{}` in a token is replaced with the
    /// changed file's path at spawn time.
    pub command: Vec<String>,
}
