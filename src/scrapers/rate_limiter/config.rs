//! Rate limiter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};

/// Configuration for adaptive pacing between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum delay (floor and starting point).
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    /// Maximum delay (ceiling for backoff).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Multiplier applied on each failure signal.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Multiplier for recovery on success (< 1.0 to decrease delay).
    #[serde(default = "default_recovery_multiplier")]
    pub recovery_multiplier: f64,
    /// Number of consecutive successes before reducing delay.
    #[serde(default = "default_recovery_threshold")]
    pub recovery_threshold: u32,
    /// Multiple of the current delay slept between categories.
    #[serde(default = "default_category_multiplier")]
    pub category_delay_multiplier: f64,
}

fn default_min_delay_ms() -> u64 {
    3_000
}

fn default_max_delay_ms() -> u64 {
    15_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_recovery_multiplier() -> f64 {
    0.8
}

fn default_recovery_threshold() -> u32 {
    3
}

fn default_category_multiplier() -> f64 {
    2.0
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            recovery_multiplier: default_recovery_multiplier(),
            recovery_threshold: default_recovery_threshold(),
            category_delay_multiplier: default_category_multiplier(),
        }
    }
}

impl RateLimitConfig {
    /// No pacing at all; used by tests and local fixtures.
    pub fn disabled() -> Self {
        Self {
            min_delay_ms: 0,
            max_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_delay_ms > self.max_delay_ms {
            return Err(ScrapeError::Config(format!(
                "rate_limit.min_delay_ms ({}) exceeds max_delay_ms ({})",
                self.min_delay_ms, self.max_delay_ms
            )));
        }
        for (name, value) in [
            ("backoff_multiplier", self.backoff_multiplier),
            ("recovery_multiplier", self.recovery_multiplier),
            ("category_delay_multiplier", self.category_delay_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScrapeError::Config(format!(
                    "rate_limit.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
