//! `config.json` load/save ("TUI & filter persistence").
//!
//! Single `<store-root>/.todos/config.json` file per store root (no
//! repo/global TOML pair) with a load-merge-env precedence chain.
//!
//! Writes are best-effort with no lock: concurrent TUI saves may race, which
//! is tolerated because all fields are idempotently re-derivable from the
//! next save — unlike every store mutation, which goes through
//! [`crate::lock`].

use super::types::Config;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

fn config_path(store_root: &Path) -> std::path::PathBuf {
    store_root.join(".todos/config.json")
}

/// Load `config.json` under `store_root`, falling back to defaults when the
/// file is absent, then apply environment-variable overrides.
///
/// A malformed file is treated the same as a missing one rather than
/// failing the caller: `config.json` is TUI/CLI-persisted display state, not
/// load-bearing for the coordination kernel it sits beside.
pub fn load(store_root: &Path) -> Config {
    let path = config_path(store_root);
    let mut config = match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            eprintln!("Warning: failed to parse {path:?}: {e}");
            Config::default()
        }),
        Err(_) => Config::default(),
    };
    apply_env_overrides(&mut config);
    config
}

/// Persist `config` to `<store_root>/.todos/config.json`. Best-effort: no
/// write lock, no retry.
pub fn save(store_root: &Path, config: &Config) -> Result<(), ConfigError> {
    let path = config_path(store_root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(raw) = std::env::var("TD_SYNC_SNAPSHOT_THRESHOLD") {
        if let Ok(value) = raw.parse::<u32>() {
            if value > 0 {
                config.core.sync_snapshot_threshold = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn load_defaults_when_file_absent() {
        let dir = TempDir::new().unwrap();
        let config = load(dir.path());
        assert_eq!(config.core.sync_snapshot_threshold, 100);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.tdq.last_filter = Some("status = open".to_string());
        save(dir.path(), &config).unwrap();

        let loaded = load(dir.path());
        assert_eq!(loaded.tdq.last_filter, Some("status = open".to_string()));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".todos")).unwrap();
        std::fs::write(dir.path().join(".todos/config.json"), "not json").unwrap();
        let config = load(dir.path());
        assert_eq!(config.core.sync_snapshot_threshold, 100);
    }

    #[test]
    #[serial]
    fn env_override_applies_on_load() {
        unsafe { std::env::set_var("TD_SYNC_SNAPSHOT_THRESHOLD", "42") };
        let dir = TempDir::new().unwrap();
        let config = load(dir.path());
        assert_eq!(config.core.sync_snapshot_threshold, 42);
        unsafe { std::env::remove_var("TD_SYNC_SNAPSHOT_THRESHOLD") };
    }

    #[test]
    #[serial]
    fn zero_env_override_is_ignored() {
        unsafe { std::env::set_var("TD_SYNC_SNAPSHOT_THRESHOLD", "0") };
        let dir = TempDir::new().unwrap();
        let config = load(dir.path());
        assert_eq!(config.core.sync_snapshot_threshold, 100);
        unsafe { std::env::remove_var("TD_SYNC_SNAPSHOT_THRESHOLD") };
    }
}
