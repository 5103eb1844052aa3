// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;
pub mod watch;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_from_path, save_to_path, ConfigFile};
use crate::watch::FileWatcher;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI merging
/// - the watch engine
/// - the command callback (console clear, `{}` interpolation, shell spawn)
pub fn run(args: CliArgs) -> Result<()> {
    let (config, config_path) = load_config(&args)?;
    let settings = Settings::merge(&args, &config);

    if args.save_config {
        let path = config_path.unwrap_or_else(default_config_path);
        save_to_path(&path, &settings.to_config())?;
        report::ok(&format!("saved config to {}", path.display()));
        return Ok(());
    }

    if settings.paths.is_empty() {
        bail!("nothing to watch: give paths on the command line or in the config file");
    }
    if settings.command.is_empty() {
        bail!("no command to run: give one after `--` or in the config file");
    }

    let mut watcher = FileWatcher::new().context("setting up the watch engine")?;
    watcher
        .set_verbose(settings.verbose)
        .set_debounce(Duration::from_millis(args.debounce_ms))
        .add_filepaths(&settings.paths, !args.non_recursive)
        .context("registering watch paths")?;

    info!(
        watches = watcher.watch_count(),
        command = %settings.command.join(" "),
        "starting watch loop"
    );

    let command = settings.command.clone();
    let clear = settings.clear_console;
    let verbose = settings.verbose;
    watcher.run(|event| {
        if clear {
            exec::clear_console();
        }
        let tokens = exec::interpolate(&command, &event.path);
        let code = exec::run_command(&tokens)?;
        if code != 0 && verbose {
            report::warn(&format!("command exited with code {code}"));
        }
        Ok(())
    })?;

    watcher.dispose();
    Ok(())
}

/// Effective settings after merging CLI arguments over the config file.
///
/// Flags are or-ed (either source can enable them); the path list is the
/// config list followed by the CLI list; a command given on the CLI replaces
/// the configured one.
#[derive(Debug, Clone)]
struct Settings {
    verbose: bool,
    clear_console: bool,
    paths: Vec<String>,
    command: Vec<String>,
}

impl Settings {
    fn merge(args: &CliArgs, config: &ConfigFile) -> Self {
        let mut paths = config.watch_files.clone();
        for p in &args.paths {
            if !paths.contains(p) {
                paths.push(p.clone());
            }
        }

        let command = if args.command.is_empty() {
            config.command.clone()
        } else {
            args.command.clone()
        };

        Self {
            verbose: args.verbose || config.is_verbose,
            clear_console: args.clear || config.is_clear_console,
            paths,
            command,
        }
    }

    fn to_config(&self) -> ConfigFile {
        ConfigFile {
            is_verbose: self.verbose,
            is_clear_console: self.clear_console,
            watch_files: self.paths.clone(),
            command: self.command.clone(),
        }
    }
}

/// Load the config file named by `--config`, or the default one when it
/// exists. A missing explicit path is an error; a missing default is not.
fn load_config(args: &CliArgs) -> Result<(ConfigFile, Option<PathBuf>)> {
    if let Some(path) = &args.config {
        let path = PathBuf::from(path);
        let config = load_from_path(&path)?;
        return Ok((config, Some(path)));
    }

    let default = default_config_path();
    if default.exists() {
        let config = load_from_path(&default)?;
        return Ok((config, Some(default)));
    }

    debug!("no config file found, using CLI arguments only");
    Ok((ConfigFile::default(), None))
}
