// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::model::ConfigFile;

/// Load a configuration file from the given path.
///
/// Only performs JSON deserialization; deciding whether the result is usable
/// (paths present, command present) is the caller's concern.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: ConfigFile = serde_json::from_str(&contents)
        .with_context(|| format!("parsing JSON config from {:?}", path))?;

    Ok(config)
}

/// Persist `config` as pretty-printed JSON at the given path.
pub fn save_to_path(path: impl AsRef<Path>, config: &ConfigFile) -> Result<()> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(config).context("serializing config")?;
    fs::write(path, text).with_context(|| format!("writing config file at {:?}", path))?;
    Ok(())
}

/// The default config location: `watchrun.json` in the current working
/// directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("watchrun.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchrun.json");

        let cfg = ConfigFile {
            is_verbose: true,
            is_clear_console: false,
            watch_files: vec!["src".into()],
            command: vec!["make".into(), "build".into()],
        };

        save_to_path(&path, &cfg).unwrap();
        let back = load_from_path(&path).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn malformed_json_fails_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchrun.json");
        fs::write(&path, "{not json").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(format!("{err}").contains("parsing JSON config"));
    }
}
