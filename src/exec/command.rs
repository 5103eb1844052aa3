// src/exec/command.rs

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Replace every literal `{}` inside each token with `path`.
///
/// Substitution is per-token substring replacement, so both a bare `{}`
/// token and an embedded form like `--file={}` work.
pub fn interpolate(tokens: &[String], path: &Path) -> Vec<String> {
    let replacement = path.display().to_string();
    tokens
        .iter()
        .map(|t| t.replace("{}", &replacement))
        .collect()
}

/// Execute `tokens` through the platform shell and return the exit code.
///
/// The tokens are joined with spaces and handed to `sh -c` (or `cmd /C` on
/// Windows), so the user command gets ordinary shell semantics: pipes,
/// redirects, quoting.
pub fn run_command(tokens: &[String]) -> Result<i32> {
    let line = tokens.join(" ");
    info!(command = %line, "running command");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&line);
        c
    };

    let status = cmd
        .status()
        .with_context(|| format!("spawning command: {line}"))?;

    let code = status.code().unwrap_or(-1);
    debug!(exit_code = code, success = status.success(), "command exited");
    Ok(code)
}

/// Erase the visible terminal content and home the cursor.
pub fn clear_console() {
    print!("\x1b[2J\x1b[H");
}
