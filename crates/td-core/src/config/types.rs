//! Configuration types for `config.json` (TUI & filter persistence) and
//! its environment-variable overrides.

use crate::state_machine::EnforcementMode;
use serde::{Deserialize, Serialize};

/// Complete configuration, read-modify-written best-effort with no lock:
/// concurrent TUI saves may race, which is tolerated because all fields are
/// idempotently re-derivable from the next save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub tdq: TdqConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            display: DisplayConfig::default(),
            tdq: TdqConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

/// Core enforcement and sync knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// State-machine enforcement mode.
    #[serde(default = "default_enforcement_mode")]
    pub enforcement_mode: EnforcementMode,
    /// Action-log entries accumulate until this many pending-sync rows
    /// trigger a snapshot, per `TD_SYNC_SNAPSHOT_THRESHOLD`.
    #[serde(default = "default_sync_snapshot_threshold")]
    pub sync_snapshot_threshold: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            enforcement_mode: default_enforcement_mode(),
            sync_snapshot_threshold: default_sync_snapshot_threshold(),
        }
    }
}

fn default_enforcement_mode() -> EnforcementMode {
    EnforcementMode::Advisory
}

pub fn default_sync_snapshot_threshold() -> u32 {
    100
}

/// Display preferences persisted for the TUI (kept here even though the
/// TUI itself is out of scope: the config shape it reads is not).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub format: OutputFormat,
    pub color: bool,
    pub timestamps: TimestampFormat,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
            timestamps: TimestampFormat::Relative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampFormat {
    Relative,
    Absolute,
    Iso8601,
}

/// TDQ defaults persisted so the last filter/sort survives across TUI
/// sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TdqConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_filter: Option<String>,
}

impl Default for TdqConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            last_filter: None,
        }
    }
}

fn default_max_results() -> usize {
    500
}

/// Session-file pruning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Prune session files idle longer than this (duration string: "7d",
    /// "24h", "30d").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_prune_after: Option<String>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            idle_prune_after: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.core.enforcement_mode, EnforcementMode::Advisory);
        assert_eq!(config.core.sync_snapshot_threshold, 100);
        assert_eq!(config.tdq.max_results, 500);
        assert_eq!(config.display.format, OutputFormat::Text);
    }

    #[test]
    fn round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.core.sync_snapshot_threshold, config.core.sync_snapshot_threshold);
    }
}
