//! Swarm fetch boundary
//!
//! `SwarmFetcher` is the seam to the storage-node network: given a mailbox
//! key it resolves the swarm currently serving that mailbox and performs one
//! request/response fetch cycle against it. Node selection, onion routing
//! and connection management live behind this trait; the scheduler only
//! decides when and for whom to call it.

use crate::identity::PubKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fetch failures. All are isolated per mailbox: the mailbox stays tracked
/// and redues naturally on a later tick.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network or storage node unreachable
    #[error("Transport error: {0}")]
    Transport(String),
    /// No storage nodes currently known for this mailbox. Not fatal: swarm
    /// membership may resolve later.
    #[error("No swarm nodes known for mailbox")]
    EmptySwarm,
}

/// One raw, still-encrypted record pulled from a storage node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Storage-node hash of the record (dedup key downstream)
    pub hash: String,
    /// Opaque encrypted payload
    pub data: Vec<u8>,
    /// When the storage nodes will drop the record (epoch ms)
    pub expires_at: u64,
}

/// A successful fetch's yield, handed to the persistence side for
/// decryption and storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessages {
    /// The mailbox the records were pulled for
    pub source: PubKey,
    /// Whether `source` is a group mailbox
    pub is_group: bool,
    /// The raw records, in storage-node order
    pub records: Vec<RawMessage>,
}

/// One request/response fetch cycle against a mailbox's swarm
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwarmFetcher: Send + Sync {
    /// Fetch pending records for `target` from its swarm
    async fn fetch_once(
        &self,
        target: &PubKey,
        is_group: bool,
    ) -> Result<Vec<RawMessage>, FetchError>;
}

// ============================================================================
// TESTS
// ============================================================================
