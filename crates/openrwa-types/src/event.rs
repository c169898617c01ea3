//! Observable outputs and the hash-chained audit log.
//!
//! Every successful state change emits an [`Event`]. Each component appends
//! its events to its own [`EventLog`]; records are chained with SHA-256 so
//! an auditor can detect reordering, insertion, or truncation:
//!
//! ```text
//! digest_n = SHA256("openrwa:event:v1:" || digest_{n-1} || seq_n || at_n || json(event_n))
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Amount, AssetClass, Identity, Price, Role, constants};

/// Everything the engine reports to the outside world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    // --- Settlement ledger ---
    Invested {
        investor: Identity,
        payment_amount: Amount,
        units_out: Amount,
    },
    Redeemed {
        investor: Identity,
        unit_amount: Amount,
        payment_out: Amount,
    },
    /// Value-unit movement. `from = None` is a mint, `to = None` a burn.
    Transferred {
        from: Option<Identity>,
        to: Option<Identity>,
        amount: Amount,
    },
    Approval {
        owner: Identity,
        spender: Identity,
        amount: Amount,
    },
    Paused {
        by: Identity,
    },
    Unpaused {
        by: Identity,
    },
    DailyInvestCapChanged {
        previous: Amount,
        cap: Amount,
    },
    DailyRedeemCapChanged {
        previous: Amount,
        cap: Amount,
    },
    ReserveDeposited {
        from: Identity,
        amount: Amount,
    },
    ReserveWithdrawn {
        to: Identity,
        amount: Amount,
    },
    AssetProfileUpdated {
        class: AssetClass,
    },

    // --- Valuation feed ---
    PriceUpdated {
        old_price: Price,
        new_price: Price,
        timestamp: DateTime<Utc>,
    },
    UpdaterChanged {
        previous: Identity,
        updater: Identity,
    },
    MaxStalenessChanged {
        previous_secs: i64,
        max_staleness_secs: i64,
    },

    // --- Eligibility registry ---
    Whitelisted(Identity),
    WhitelistRemoved(Identity),
    Frozen(Identity),
    Unfrozen(Identity),

    // --- Any component ---
    RoleTransferred {
        role: Role,
        previous: Identity,
        holder: Identity,
    },
}

impl Event {
    /// Canonical bytes hashed into the audit chain.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("event serialization is infallible")
    }
}

/// One entry of an [`EventLog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the component's log, starting at 0.
    pub seq: u64,
    /// When the event was emitted (component clock).
    pub at: DateTime<Utc>,
    pub event: Event,
    /// Hex SHA-256 chain digest up to and including this record.
    pub digest: String,
}

/// Append-only, hash-chained event log owned by a single component.
#[derive(Debug, Clone)]
pub struct EventLog {
    records: Vec<EventRecord>,
    next_seq: u64,
    /// Digest preceding the first retained record.
    base: [u8; 32],
    head: [u8; 32],
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_seq: 0,
            base: constants::GENESIS_DIGEST,
            head: constants::GENESIS_DIGEST,
        }
    }

    /// Append an event and extend the chain.
    pub fn append(&mut self, at: DateTime<Utc>, event: Event) -> &EventRecord {
        let seq = self.next_seq;
        let digest = chain_digest(&self.head, seq, at, &event);
        self.head = digest;
        self.next_seq += 1;
        self.records.push(EventRecord {
            seq,
            at,
            event,
            digest: hex::encode(digest),
        });
        &self.records[self.records.len() - 1]
    }

    /// Records not yet drained.
    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Drain retained records. The chain head is preserved so later
    /// appends still link to everything emitted before.
    pub fn take(&mut self) -> Vec<EventRecord> {
        self.base = self.head;
        std::mem::take(&mut self.records)
    }

    /// Hex digest of the latest record (genesis digest when empty).
    #[must_use]
    pub fn head_hex(&self) -> String {
        hex::encode(self.head)
    }

    /// Total events ever appended, including drained ones.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.next_seq
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next_seq == 0
    }

    /// Recompute the chain over the retained records.
    #[must_use]
    pub fn verify_chain(&self) -> bool {
        verify_records(&self.base, &self.records)
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Verify a contiguous slice of records starting after `prev` digest.
#[must_use]
pub fn verify_records(prev: &[u8; 32], records: &[EventRecord]) -> bool {
    let mut prev = *prev;
    for record in records {
        let digest = chain_digest(&prev, record.seq, record.at, &record.event);
        if hex::encode(digest) != record.digest {
            return false;
        }
        prev = digest;
    }
    true
}

fn chain_digest(prev: &[u8; 32], seq: u64, at: DateTime<Utc>, event: &Event) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"openrwa:event:v1:");
    hasher.update(prev);
    hasher.update(seq.to_le_bytes());
    hasher.update(at.timestamp_micros().to_le_bytes());
    hasher.update(event.canonical_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}
