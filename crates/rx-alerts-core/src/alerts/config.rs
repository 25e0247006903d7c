//! Alert thresholds and limits.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Largest accepted day threshold (about a century).
pub const MAX_THRESHOLD_DAYS: i64 = 36_500;

fn check_days(field: &'static str, days: i64) -> ConfigResult<()> {
    if !(0..=MAX_THRESHOLD_DAYS).contains(&days) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("must be between 0 and {}, got {}", MAX_THRESHOLD_DAYS, days),
        });
    }
    Ok(())
}

/// Tunable parameters for alert derivation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    /// Upper bound on returned alerts
    pub max_alerts: usize,
    /// Days since the last completed visit before "no recent" fires
    pub no_recent_days: i64,
    /// How far back completed visits are checked for follow-up actions
    pub follow_up_window_days: i64,
    /// Case-insensitive marker searched for in next actions
    pub follow_up_keyword: String,
    /// Whether alerts carry an action for the presentation layer
    pub attach_actions: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            max_alerts: 5,
            no_recent_days: 90,
            follow_up_window_days: 30,
            follow_up_keyword: "follow".into(),
            attach_actions: true,
        }
    }
}

impl AlertConfig {
    /// Default thresholds with a different cap.
    pub fn with_max_alerts(max_alerts: usize) -> Self {
        Self {
            max_alerts,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every threshold is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_alerts == 0 {
            return Err(ConfigError::Invalid {
                field: "max_alerts",
                reason: "must be a positive integer".into(),
            });
        }
        check_days("no_recent_days", self.no_recent_days)?;
        check_days("follow_up_window_days", self.follow_up_window_days)?;
        if self.follow_up_keyword.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "follow_up_keyword",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}
