//! Swarm polling driver
//!
//! One recurring task evaluates every tracked mailbox against its tier's
//! redue interval and dispatches at most one concurrent fetch per mailbox.
//! Fetches are fire-and-track: the driver never waits on one mailbox's
//! fetch before dispatching the next, and completions update the registry
//! on their own timeline.

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, PollingConfig};
use crate::fetcher::{FetchError, FetchedMessages, RawMessage, SwarmFetcher};
use crate::identity::PubKey;
use crate::registry::PollTargetRegistry;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// ============================================================================
// STATE & STATS
// ============================================================================

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingState {
    /// No recurring tick armed
    Stopped,
    /// Recurring tick armed, fetches dispatching
    Running,
}

impl std::fmt::Display for PollingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "Stopped"),
            Self::Running => write!(f, "Running"),
        }
    }
}

/// Counters over the scheduler's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollingStats {
    /// Fetches dispatched
    pub dispatched: u64,
    /// Fetches that completed successfully
    pub completed: u64,
    /// Fetches that failed
    pub failed: u64,
    /// Successful batches dropped because their mailbox was removed while
    /// the fetch was in flight
    pub discarded: u64,
}

// ============================================================================
// SCHEDULER
// ============================================================================

struct PollerInner {
    config: PollingConfig,
    clock: Arc<dyn Clock>,
    fetcher: Arc<dyn SwarmFetcher>,
    registry: Mutex<PollTargetRegistry>,
    sink: UnboundedSender<FetchedMessages>,
    running: AtomicBool,
    dispatched: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
}

/// Adaptive swarm-polling scheduler
///
/// Owns the recurring driver tick and the per-mailbox poll bookkeeping.
/// Successful fetches with records are forwarded over the sink channel
/// supplied at construction; decryption and persistence happen on the
/// consumer side.
pub struct SwarmPolling {
    inner: Arc<PollerInner>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl SwarmPolling {
    /// Create a scheduler with the default cadence, tracking our own inbox
    pub fn new(
        our_key: PubKey,
        fetcher: Arc<dyn SwarmFetcher>,
        sink: UnboundedSender<FetchedMessages>,
    ) -> Self {
        Self::build(
            our_key,
            PollingConfig::default(),
            Arc::new(SystemClock),
            fetcher,
            sink,
        )
    }

    /// Create a scheduler with a custom cadence. Used by tests and
    /// simulations that compress time; the config is validated.
    pub fn with_config(
        our_key: PubKey,
        config: PollingConfig,
        fetcher: Arc<dyn SwarmFetcher>,
        sink: UnboundedSender<FetchedMessages>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(
            our_key,
            config,
            Arc::new(SystemClock),
            fetcher,
            sink,
        ))
    }

    /// As `with_config`, with an explicit time source
    pub fn with_clock(
        our_key: PubKey,
        config: PollingConfig,
        clock: Arc<dyn Clock>,
        fetcher: Arc<dyn SwarmFetcher>,
        sink: UnboundedSender<FetchedMessages>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(our_key, config, clock, fetcher, sink))
    }

    fn build(
        our_key: PubKey,
        config: PollingConfig,
        clock: Arc<dyn Clock>,
        fetcher: Arc<dyn SwarmFetcher>,
        sink: UnboundedSender<FetchedMessages>,
    ) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                config,
                clock,
                fetcher,
                registry: Mutex::new(PollTargetRegistry::new(our_key)),
                sink,
                running: AtomicBool::new(false),
                dispatched: AtomicU64::new(0),
                completed: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                discarded: AtomicU64::new(0),
            }),
            driver: Mutex::new(None),
        }
    }

    /// Start polling: Stopped → Running. Calling while already running is a
    /// no-op. With `force_immediate_poll` one full poll pass runs before the
    /// recurring tick is armed.
    pub async fn start(&self, force_immediate_poll: bool) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            debug!("Polling already running; start is a no-op");
            return;
        }

        if force_immediate_poll {
            PollerInner::poll_for_all_keys(&self.inner);
        }

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let tick = inner.config.tick_interval();
            loop {
                tokio::time::sleep(tick).await;
                if !inner.running.load(Ordering::SeqCst) {
                    break;
                }
                PollerInner::poll_for_all_keys(&inner);
            }
        });
        *self.driver.lock() = Some(handle);

        debug!("Polling started (forced initial pass: {})", force_immediate_poll);
    }

    /// Stop polling: Running → Stopped. Halts the recurring tick; fetches
    /// already dispatched drain and their completions still update the
    /// registry, so a later `start` sees accurate state. Redundant stops are
    /// no-ops.
    pub fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.driver.lock().take() {
            handle.abort();
        }
        debug!("Polling stopped");
    }

    /// Current lifecycle state
    pub fn state(&self) -> PollingState {
        if self.inner.running.load(Ordering::SeqCst) {
            PollingState::Running
        } else {
            PollingState::Stopped
        }
    }

    /// True while the recurring tick is armed
    pub fn is_running(&self) -> bool {
        self.state() == PollingState::Running
    }

    /// Track a group mailbox. The next tick polls it once regardless of its
    /// tier; thereafter it follows its tier's cadence.
    pub fn add_group(&self, key: PubKey) {
        let added = self.inner.registry.lock().add_group(key.clone());
        if added {
            debug!("Tracking group mailbox {}", key.short());
        }
    }

    /// Stop tracking a group mailbox. An outstanding fetch for it completes
    /// but its results are discarded.
    pub fn remove_group(&self, key: &PubKey) {
        let removed = self.inner.registry.lock().remove_group(key);
        if removed {
            debug!("Stopped tracking group mailbox {}", key.short());
        }
    }

    /// Record conversation activity for a tracked mailbox. Monotonic: stale
    /// timestamps are ignored, as are unknown keys.
    pub fn note_activity(&self, key: &PubKey, at_ms: u64) {
        self.inner.registry.lock().note_activity(key, at_ms);
    }

    /// Re-poll interval the scheduler currently applies to a key. Unknown
    /// keys report the `Inactive` interval.
    pub fn polling_interval_of(&self, key: &PubKey) -> Duration {
        let now = self.inner.clock.now_ms();
        let tier = self.inner.registry.lock().tier_of(key, now);
        self.inner.config.interval_for(tier)
    }

    /// Run one due-evaluation-and-dispatch pass immediately, outside the
    /// recurring cadence
    pub async fn poll_for_all_keys(&self) {
        PollerInner::poll_for_all_keys(&self.inner);
    }

    /// Lifetime counters
    pub fn stats(&self) -> PollingStats {
        PollingStats {
            dispatched: self.inner.dispatched.load(Ordering::Relaxed),
            completed: self.inner.completed.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            discarded: self.inner.discarded.load(Ordering::Relaxed),
        }
    }
}

impl Drop for SwarmPolling {
    fn drop(&mut self) {
        self.stop();
    }
}

impl PollerInner {
    /// One tick: plan from a snapshot, then dispatch our inbox first and due
    /// groups in registration order. Dispatches are independent tasks; the
    /// tick never waits on a fetch.
    fn poll_for_all_keys(inner: &Arc<Self>) {
        let now = inner.clock.now_ms();
        let plan = inner.registry.lock().snapshot(now, &inner.config);

        for target in plan {
            if !target.due || target.in_flight {
                continue;
            }
            Self::dispatch(inner, target.key, target.kind.is_group());
        }
    }

    /// Claim the mailbox and launch its fetch as an independent task
    fn dispatch(inner: &Arc<Self>, key: PubKey, is_group: bool) {
        // Re-check under the lock: the mailbox may have been removed, or a
        // fetch dispatched, since the snapshot was taken
        if !inner.registry.lock().begin_poll(&key) {
            return;
        }

        inner.dispatched.fetch_add(1, Ordering::Relaxed);
        debug!("Dispatching fetch for {} (group: {})", key.short(), is_group);

        let task_inner = Arc::clone(inner);
        tokio::spawn(async move {
            let result = task_inner.fetcher.fetch_once(&key, is_group).await;
            task_inner.complete(key, is_group, result);
        });
    }

    /// Completion handler: clears the in-flight flag, advances the
    /// last-poll timestamp to the completion time, forwards non-empty
    /// batches for still-tracked mailboxes.
    fn complete(&self, key: PubKey, is_group: bool, result: Result<Vec<RawMessage>, FetchError>) {
        let now = self.clock.now_ms();
        let still_tracked = {
            let mut registry = self.registry.lock();
            let tracked = registry.contains(&key);
            registry.finish_poll(&key, now);
            tracked
        };

        match result {
            Ok(records) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                if records.is_empty() {
                    return;
                }
                if !still_tracked {
                    self.discarded.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        "Discarding {} records for removed mailbox {}",
                        records.len(),
                        key.short()
                    );
                    return;
                }
                debug!("Fetched {} records for {}", records.len(), key.short());
                let batch = FetchedMessages {
                    source: key,
                    is_group,
                    records,
                };
                // Persistence side may have gone away; nothing to do then
                let _ = self.sink.send(batch);
            }
            Err(err) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!("Fetch for {} failed: {}", key.short(), err);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
