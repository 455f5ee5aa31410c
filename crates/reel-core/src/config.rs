//! Viewer configuration: duration policy and heartbeat cadence.
//!
//! Plain JSON in, typed struct out. Invalid config never fails a session:
//! it is logged and replaced by the defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Play time for items that carry no duration of their own.
pub const DEFAULT_DURATION_MS: u64 = 15_000;

/// Heartbeat period. Small enough for smooth progress bars.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub default_duration_ms: u64,
    pub tick_interval_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: DEFAULT_DURATION_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl ViewerConfig {
    /// Build from JSON, falling back to defaults when the value is unusable.
    pub fn from_value(config: &Value) -> Self {
        match try_from_value(config) {
            Some(cfg) => cfg,
            None => {
                log::warn!("reel: invalid viewer config, using defaults");
                Self::default()
            }
        }
    }

    /// Read the JSON file named by `REEL_CONFIG`, if any.
    pub fn from_env() -> Self {
        let path = match std::env::var("REEL_CONFIG") {
            Ok(p) => p,
            Err(_) => return Self::default(),
        };
        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(v) => Self::from_value(&v),
                Err(e) => {
                    log::warn!("reel: config {} is not json: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("reel: cannot read config {}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }
}

fn try_from_value(config: &Value) -> Option<ViewerConfig> {
    let cfg: ViewerConfig = serde_json::from_value(config.clone()).ok()?;
    if cfg.default_duration_ms == 0 || cfg.tick_interval_ms == 0 {
        return None;
    }
    Some(cfg)
}
