// Demo: Adaptive Swarm Polling
//
// Runs the scheduler against a simulated swarm for a few seconds. One group
// conversation is active and keeps receiving messages; another has been
// dormant for weeks and is polled exactly once, at registration.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use swarmpoll_core::{
    Clock, FetchError, PollingConfig, PubKey, RawMessage, SwarmFetcher, SwarmPolling, SystemClock,
};
use tokio::sync::mpsc;

/// In-memory stand-in for the storage-node network: one mailbox per key,
/// drained on fetch
struct SimulatedSwarm {
    mailboxes: Mutex<HashMap<PubKey, Vec<RawMessage>>>,
}

impl SimulatedSwarm {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            mailboxes: Mutex::new(HashMap::new()),
        })
    }

    fn deliver(&self, target: &PubKey, payload: &str) {
        let record = RawMessage {
            hash: format!("{:08x}", rand::random::<u32>()),
            data: payload.as_bytes().to_vec(),
            expires_at: 0,
        };
        self.mailboxes
            .lock()
            .entry(target.clone())
            .or_default()
            .push(record);
    }
}

#[async_trait]
impl SwarmFetcher for SimulatedSwarm {
    async fn fetch_once(
        &self,
        target: &PubKey,
        _is_group: bool,
    ) -> Result<Vec<RawMessage>, FetchError> {
        // A real fetcher resolves the swarm and performs a network round trip
        tokio::time::sleep(Duration::from_millis(30)).await;
        Ok(self
            .mailboxes
            .lock()
            .get_mut(target)
            .map(std::mem::take)
            .unwrap_or_default())
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("📮 Swarm Polling Demo");
    println!("=====================\n");

    let our_key = PubKey::from_bytes(&rand::random::<[u8; 32]>());
    let busy_group = PubKey::from_bytes(&rand::random::<[u8; 32]>());
    let dormant_group = PubKey::from_bytes(&rand::random::<[u8; 32]>());

    println!("   Our inbox:     {}", our_key.short());
    println!("   Busy group:    {}", busy_group.short());
    println!("   Dormant group: {}\n", dormant_group.short());

    // Compressed cadence so the demo shows several ticks in a few seconds
    let config = PollingConfig {
        active_interval: Duration::from_millis(500),
        medium_active_interval: Duration::from_secs(6),
        ..Default::default()
    };

    let swarm = SimulatedSwarm::new();
    let (sink, mut fetched) = mpsc::unbounded_channel();
    let polling = SwarmPolling::with_config(our_key.clone(), config, swarm.clone(), sink)?;

    let now = SystemClock.now_ms();
    polling.add_group(busy_group.clone());
    polling.note_activity(&busy_group, now);
    polling.add_group(dormant_group.clone());
    polling.note_activity(&dormant_group, now - 30 * 24 * 3600 * 1000);

    swarm.deliver(&our_key, "welcome back");
    swarm.deliver(&busy_group, "hello group");
    swarm.deliver(&dormant_group, "old unread message");

    polling.start(true).await;

    let consumer = tokio::spawn(async move {
        while let Some(batch) = fetched.recv().await {
            for record in &batch.records {
                println!(
                    "   ⬇ {} (group: {}): {}",
                    batch.source.short(),
                    batch.is_group,
                    String::from_utf8_lossy(&record.data)
                );
            }
        }
    });

    // Keep the busy group busy while the scheduler runs
    for i in 0..5 {
        tokio::time::sleep(Duration::from_millis(800)).await;
        swarm.deliver(&busy_group, &format!("message {}", i));
    }
    tokio::time::sleep(Duration::from_millis(800)).await;

    polling.stop();
    drop(polling);
    consumer.await?;

    println!("\n   The dormant group was fetched once, at registration only.");
    Ok(())
}
