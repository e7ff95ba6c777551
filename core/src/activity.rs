//! Activity classification
//!
//! Maps how recently a conversation saw activity to one of three polling
//! urgency tiers. Pure and deterministic; the scheduler recomputes the tier
//! on every scheduling decision rather than caching it.

use crate::identity::TargetKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversations active within this window poll at the fast cadence
pub const ACTIVE_WINDOW_MS: u64 = 2 * 24 * 3600 * 1000;

/// Conversations active within this window (but outside the active one)
/// poll at the medium cadence
pub const MEDIUM_ACTIVE_WINDOW_MS: u64 = 7 * 24 * 3600 * 1000;

/// Polling urgency derived from conversation recency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityTier {
    /// Activity within the last two days
    Active,
    /// Activity between two and seven days ago
    MediumActive,
    /// No recorded activity, or none for a week or more
    Inactive,
}

impl fmt::Display for ActivityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::MediumActive => write!(f, "medium-active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

/// Classify a mailbox into a polling tier.
///
/// Our own inbox is always `Active` regardless of recorded activity; it
/// must never go dormant. Boundaries are inclusive toward the lower tier:
/// exactly two days old is `MediumActive`, exactly seven days old is
/// `Inactive`.
pub fn classify(kind: TargetKind, last_active_at: Option<u64>, now: u64) -> ActivityTier {
    if kind == TargetKind::Our {
        return ActivityTier::Active;
    }

    let active_at = match last_active_at {
        Some(at) => at,
        None => return ActivityTier::Inactive,
    };

    let age = now.saturating_sub(active_at);
    if age < ACTIVE_WINDOW_MS {
        ActivityTier::Active
    } else if age < MEDIUM_ACTIVE_WINDOW_MS {
        ActivityTier::MediumActive
    } else {
        ActivityTier::Inactive
    }
}

// ============================================================================
// TESTS
// ============================================================================
