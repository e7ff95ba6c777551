//! Pollable identities
//!
//! A `PubKey` is the opaque addressing unit for one mailbox on the storage
//! network: the hex-encoded public key of either our own account or a group.
//! Equality is by value; the scheduler never inspects the key material.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which mailbox a tracking record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    /// Our own inbox. Exactly one, registered at construction, never removed.
    Our,
    /// A group mailbox, added and removed dynamically.
    Group,
}

impl TargetKind {
    /// True for group mailboxes
    pub fn is_group(&self) -> bool {
        matches!(self, TargetKind::Group)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Our => write!(f, "our"),
            Self::Group => write!(f, "group"),
        }
    }
}

/// Hex-encoded public key addressing one mailbox
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PubKey(String);

impl PubKey {
    /// Wrap an already hex-encoded key
    pub fn new(hex_key: impl Into<String>) -> Self {
        Self(hex_key.into())
    }

    /// Hex-encode raw key bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// The hex form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for logs
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pubkey_equality_is_by_value() {
        let a = PubKey::new("05aabbcc");
        let b = PubKey::new("05aabbcc");
        let c = PubKey::new("05ddeeff");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_pubkey_from_bytes_hex_encodes() {
        let key = PubKey::from_bytes(&[0x05, 0xab, 0xcd]);
        assert_eq!(key.as_str(), "05abcd");
    }

    #[test]
    fn test_pubkey_short_truncates_long_keys() {
        let key = PubKey::new("05aabbccddeeff00112233");
        assert_eq!(key.short(), "05aabbcc");
    }

    #[test]
    fn test_pubkey_short_keeps_short_keys_whole() {
        let key = PubKey::new("05ab");
        assert_eq!(key.short(), "05ab");
    }

    #[test]
    fn test_target_kind_is_group() {
        assert!(TargetKind::Group.is_group());
        assert!(!TargetKind::Our.is_group());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", TargetKind::Our), "our");
        assert_eq!(format!("{}", TargetKind::Group), "group");
        assert_eq!(format!("{}", PubKey::new("05ff")), "05ff");
    }
}
