//! Poll target registry
//!
//! Tracks the set of mailboxes the scheduler polls: our own inbox plus a
//! dynamic set of groups. Keeps the per-mailbox bookkeeping (activity
//! timestamp, last-poll timestamp, in-flight flag) and plans each tick
//! through a value-copy snapshot so the driver never iterates a structure
//! being mutated.

use crate::activity::{classify, ActivityTier};
use crate::config::PollingConfig;
use crate::identity::{PubKey, TargetKind};
use serde::{Deserialize, Serialize};

/// Per-mailbox tracking state
#[derive(Debug, Clone)]
struct TrackingRecord {
    key: PubKey,
    kind: TargetKind,
    /// Last known conversation activity (epoch ms), supplied externally
    last_active_at: Option<u64>,
    /// Completion time of the last poll (epoch ms); 0 = never polled.
    /// Monotonically non-decreasing.
    last_polled_at: u64,
    /// True while a fetch for this mailbox is outstanding
    in_flight: bool,
}

impl TrackingRecord {
    fn new(key: PubKey, kind: TargetKind) -> Self {
        Self {
            key,
            kind,
            last_active_at: None,
            last_polled_at: 0,
            in_flight: false,
        }
    }
}

/// One tick's plan entry for a mailbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedPoll {
    pub key: PubKey,
    pub kind: TargetKind,
    pub tier: ActivityTier,
    pub due: bool,
    pub in_flight: bool,
}

/// Registry of pollable mailboxes: our inbox, then groups in registration
/// order
#[derive(Debug)]
pub struct PollTargetRegistry {
    our_record: TrackingRecord,
    groups: Vec<TrackingRecord>,
}

impl PollTargetRegistry {
    /// Create a registry tracking our own inbox
    pub fn new(our_key: PubKey) -> Self {
        Self {
            our_record: TrackingRecord::new(our_key, TargetKind::Our),
            groups: Vec::new(),
        }
    }

    /// Our own inbox key
    pub fn our_key(&self) -> &PubKey {
        &self.our_record.key
    }

    /// Track a group mailbox. The fresh record's last-poll timestamp of zero
    /// guarantees the next tick treats it as due regardless of tier. No-op
    /// (returns false) if the key is already tracked.
    pub fn add_group(&mut self, key: PubKey) -> bool {
        if self.record(&key).is_some() {
            return false;
        }
        self.groups.push(TrackingRecord::new(key, TargetKind::Group));
        true
    }

    /// Stop tracking a group mailbox. Fetches already dispatched for it are
    /// unaffected; their completions become no-ops here.
    pub fn remove_group(&mut self, key: &PubKey) -> bool {
        let before = self.groups.len();
        self.groups.retain(|record| &record.key != key);
        self.groups.len() != before
    }

    /// Monotonic update of a mailbox's activity timestamp. Earlier
    /// timestamps and unknown keys are ignored.
    pub fn note_activity(&mut self, key: &PubKey, at_ms: u64) {
        if let Some(record) = self.record_mut(key) {
            match record.last_active_at {
                Some(current) if current >= at_ms => {}
                _ => record.last_active_at = Some(at_ms),
            }
        }
    }

    /// Number of tracked mailboxes, ours included
    pub fn tracked_count(&self) -> usize {
        1 + self.groups.len()
    }

    /// Whether a key is currently tracked
    pub fn contains(&self, key: &PubKey) -> bool {
        self.record(key).is_some()
    }

    /// Plan one tick: tier and due status per mailbox, ours first, groups in
    /// registration order. Does not mutate.
    pub fn snapshot(&self, now: u64, config: &PollingConfig) -> Vec<PlannedPoll> {
        let mut plan = Vec::with_capacity(self.tracked_count());
        plan.push(Self::plan_for(&self.our_record, now, config));
        for record in &self.groups {
            plan.push(Self::plan_for(record, now, config));
        }
        plan
    }

    fn plan_for(record: &TrackingRecord, now: u64, config: &PollingConfig) -> PlannedPoll {
        let tier = classify(record.kind, record.last_active_at, now);
        let due = match record.kind {
            // Our inbox is due on every tick; it must never be starved
            TargetKind::Our => true,
            TargetKind::Group => {
                let interval_ms = config.interval_for(tier).as_millis() as u64;
                now.saturating_sub(record.last_polled_at) >= interval_ms
            }
        };
        PlannedPoll {
            key: record.key.clone(),
            kind: record.kind,
            tier,
            due,
            in_flight: record.in_flight,
        }
    }

    /// Tier currently applying to a key. Unknown keys report `Inactive`,
    /// matching how an untracked conversation would be treated.
    pub fn tier_of(&self, key: &PubKey, now: u64) -> ActivityTier {
        match self.record(key) {
            Some(record) => classify(record.kind, record.last_active_at, now),
            None => ActivityTier::Inactive,
        }
    }

    /// Claim a mailbox for dispatch. Refuses (returns false) when the key is
    /// unknown or a fetch for it is already outstanding.
    pub fn begin_poll(&mut self, key: &PubKey) -> bool {
        match self.record_mut(key) {
            Some(record) if !record.in_flight => {
                record.in_flight = true;
                true
            }
            _ => false,
        }
    }

    /// Record a poll completion: clears the in-flight flag and advances the
    /// last-poll timestamp (never backwards). Silent no-op if the mailbox
    /// was removed while the fetch was outstanding.
    pub fn finish_poll(&mut self, key: &PubKey, when_ms: u64) {
        if let Some(record) = self.record_mut(key) {
            record.in_flight = false;
            record.last_polled_at = record.last_polled_at.max(when_ms);
        }
    }

    fn record(&self, key: &PubKey) -> Option<&TrackingRecord> {
        if &self.our_record.key == key {
            return Some(&self.our_record);
        }
        self.groups.iter().find(|record| &record.key == key)
    }

    fn record_mut(&mut self, key: &PubKey) -> Option<&mut TrackingRecord> {
        if &self.our_record.key == key {
            return Some(&mut self.our_record);
        }
        self.groups.iter_mut().find(|record| &record.key == key)
    }
}

// ============================================================================
// TESTS
// ============================================================================
