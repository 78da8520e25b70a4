//! Configuration resolution for `config.json` (TUI & filter persistence).
//!
//! Priority (highest to lowest):
//! 1. Environment variable overrides (`TD_SYNC_SNAPSHOT_THRESHOLD`, ...).
//! 2. `<store-root>/.todos/config.json`.
//! 3. Defaults ([`Config::default`]).

mod discovery;
mod types;

pub use discovery::{load, save, ConfigError};
pub use types::{
    Config, CoreConfig, DisplayConfig, OutputFormat, RetentionConfig, TdqConfig, TimestampFormat,
};
