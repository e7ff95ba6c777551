//! Polling cadence configuration
//!
//! The tier intervals are fixed product constants, not end-user settings.
//! The struct form exists so tests and simulations can compress time; real
//! deployments use `PollingConfig::default()`.

use crate::activity::ActivityTier;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Minimum re-poll interval per tier, plus the driver tick cadence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Re-poll interval for `Active` mailboxes; doubles as the driver tick
    /// cadence
    pub active_interval: Duration,
    /// Re-poll interval for `MediumActive` mailboxes
    pub medium_active_interval: Duration,
    /// Re-poll interval for `Inactive` mailboxes. Large enough that organic
    /// redue never fires within a client session: inactive mailboxes are
    /// only polled through the forced first poll after registration, whose
    /// zero last-poll seed exceeds any interval.
    pub inactive_interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            active_interval: Duration::from_secs(5),
            medium_active_interval: Duration::from_secs(60),
            inactive_interval: Duration::from_secs(365 * 24 * 3600),
        }
    }
}

impl PollingConfig {
    /// Interval the due rule applies for a tier
    pub fn interval_for(&self, tier: ActivityTier) -> Duration {
        match tier {
            ActivityTier::Active => self.active_interval,
            ActivityTier::MediumActive => self.medium_active_interval,
            ActivityTier::Inactive => self.inactive_interval,
        }
    }

    /// Driver tick cadence: the fast tier's interval
    pub fn tick_interval(&self) -> Duration {
        self.active_interval
    }

    /// Validate interval ordering
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.active_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "active_interval cannot be zero".to_string(),
            ));
        }
        if self.medium_active_interval < self.active_interval {
            return Err(ConfigError::Invalid(
                "medium_active_interval cannot be shorter than active_interval".to_string(),
            ));
        }
        if self.inactive_interval < self.medium_active_interval {
            return Err(ConfigError::Invalid(
                "inactive_interval cannot be shorter than medium_active_interval".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
