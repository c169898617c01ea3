//! Participant identities and administrative roles.
//!
//! Identities use UUIDv7 for time-ordered lexicographic sorting. The nil
//! UUID is reserved as the null identity and is never a valid target for
//! whitelisting, freezing, or holding a balance.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque, comparable participant handle. Used as every map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub Uuid);

impl Identity {
    /// The null identity.
    pub const NULL: Self = Self(Uuid::nil());

    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }

    /// First eight hex digits, for compact log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic identities for fixtures.
#[cfg(any(test, feature = "test-helpers"))]
impl Identity {
    #[must_use]
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The administrative roles across the three components. Each is checked
/// against a per-instance configured identity; the engine never assumes a
/// relationship between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Owner of a settlement ledger.
    LedgerOwner,
    /// Compliance officer of an eligibility registry.
    RegistryOfficer,
    /// Owner of a valuation feed.
    FeedOwner,
    /// Price updater of a valuation feed.
    FeedUpdater,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LedgerOwner => write!(f, "LEDGER_OWNER"),
            Self::RegistryOfficer => write!(f, "REGISTRY_OFFICER"),
            Self::FeedOwner => write!(f, "FEED_OWNER"),
            Self::FeedUpdater => write!(f, "FEED_UPDATER"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_uniqueness() {
        let a = Identity::new();
        let b = Identity::new();
        assert_ne!(a, b);
        assert!(!a.is_null());
    }

    #[test]
    fn null_identity() {
        assert!(Identity::NULL.is_null());
        assert!(Identity::from_bytes([0u8; 16]).is_null());
        assert!(!Identity::from_u128(7).is_null());
    }

    #[test]
    fn short_is_eight_hex_chars() {
        let id = Identity::from_u128(u128::MAX);
        assert_eq!(id.short(), "ffffffff");
    }

    #[test]
    fn role_display() {
        assert_eq!(Role::RegistryOfficer.to_string(), "REGISTRY_OFFICER");
        assert_eq!(Role::FeedUpdater.to_string(), "FEED_UPDATER");
    }

    #[test]
    fn identity_serializes_as_plain_uuid() {
        let id = Identity::from_u128(1);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000001\"");
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
