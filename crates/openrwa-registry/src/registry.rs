//! Whitelist / freeze registry.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use openrwa_types::{
    Clock, EligibilityCheck, Event, EventLog, EventRecord, Identity, RegistryConfig, Result,
    Role, RwaError,
};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Compliance flags for one identity. Absent entries read as all-false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EligibilityRecord {
    pub whitelisted: bool,
    pub frozen: bool,
}

impl EligibilityRecord {
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.whitelisted && !self.frozen
    }
}

/// The four flag mutations the officer can batch.
#[derive(Debug, Clone, Copy)]
enum FlagOp {
    Whitelist,
    Unwhitelist,
    Freeze,
    Unfreeze,
}

impl FlagOp {
    fn flag(self, record: &EligibilityRecord) -> bool {
        match self {
            Self::Whitelist | Self::Unwhitelist => record.whitelisted,
            Self::Freeze | Self::Unfreeze => record.frozen,
        }
    }

    fn target(self) -> bool {
        matches!(self, Self::Whitelist | Self::Freeze)
    }

    fn set(self, record: &mut EligibilityRecord) {
        match self {
            Self::Whitelist | Self::Unwhitelist => record.whitelisted = self.target(),
            Self::Freeze | Self::Unfreeze => record.frozen = self.target(),
        }
    }

    fn conflict(self, identity: Identity) -> RwaError {
        match self {
            Self::Whitelist => RwaError::AlreadyWhitelisted(identity),
            Self::Unwhitelist => RwaError::NotWhitelisted(identity),
            Self::Freeze => RwaError::AlreadyFrozen(identity),
            Self::Unfreeze => RwaError::NotFrozen(identity),
        }
    }

    fn event(self, identity: Identity) -> Event {
        match self {
            Self::Whitelist => Event::Whitelisted(identity),
            Self::Unwhitelist => Event::WhitelistRemoved(identity),
            Self::Freeze => Event::Frozen(identity),
            Self::Unfreeze => Event::Unfrozen(identity),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist",
            Self::Unwhitelist => "unwhitelist",
            Self::Freeze => "freeze",
            Self::Unfreeze => "unfreeze",
        }
    }
}

/// Per-identity whitelist and freeze flags behind a single officer role.
pub struct EligibilityRegistry {
    officer: Identity,
    records: HashMap<Identity, EligibilityRecord>,
    clock: Arc<dyn Clock>,
    events: EventLog,
}

impl EligibilityRegistry {
    /// # Errors
    /// `Configuration` if the officer is the null identity.
    pub fn new(config: &RegistryConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            officer: config.officer,
            records: HashMap::new(),
            clock,
            events: EventLog::new(),
        })
    }

    // -----------------------------------------------------------------
    // Officer operations
    // -----------------------------------------------------------------

    /// Whitelist every identity in the batch, creating records as needed.
    ///
    /// # Errors
    /// `Unauthorized`, `InvalidIdentity`, or `AlreadyWhitelisted` naming the
    /// first offender. A rejected batch writes nothing.
    pub fn add_to_whitelist(&mut self, caller: Identity, identities: &[Identity]) -> Result<()> {
        self.apply_batch(caller, identities, FlagOp::Whitelist)
    }

    /// Clear the whitelist flag. Records stay for audit.
    pub fn remove_from_whitelist(
        &mut self,
        caller: Identity,
        identities: &[Identity],
    ) -> Result<()> {
        self.apply_batch(caller, identities, FlagOp::Unwhitelist)
    }

    /// Freeze every identity in the batch; overrides the whitelist at once.
    pub fn freeze(&mut self, caller: Identity, identities: &[Identity]) -> Result<()> {
        self.apply_batch(caller, identities, FlagOp::Freeze)
    }

    /// Lift a freeze. Same atomic batch rules as [`Self::freeze`].
    pub fn unfreeze(&mut self, caller: Identity, identities: &[Identity]) -> Result<()> {
        self.apply_batch(caller, identities, FlagOp::Unfreeze)
    }

    /// Hand the officer role to another identity.
    pub fn transfer_officer(&mut self, caller: Identity, new_officer: Identity) -> Result<()> {
        self.require_officer(caller)?;
        if new_officer.is_null() {
            return Err(RwaError::InvalidIdentity);
        }
        let previous = std::mem::replace(&mut self.officer, new_officer);
        self.events.append(
            self.clock.now(),
            Event::RoleTransferred {
                role: Role::RegistryOfficer,
                previous,
                holder: new_officer,
            },
        );
        tracing::info!(%previous, officer = %new_officer, "Registry officer transferred");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Whitelisted and not frozen, derived on every call.
    #[must_use]
    pub fn is_eligible(&self, identity: &Identity) -> bool {
        self.record(identity).is_eligible()
    }

    /// Raw whitelist flag, ignoring freezes.
    #[must_use]
    pub fn is_whitelisted(&self, identity: &Identity) -> bool {
        self.record(identity).whitelisted
    }

    /// Raw freeze flag.
    #[must_use]
    pub fn is_frozen(&self, identity: &Identity) -> bool {
        self.record(identity).frozen
    }

    /// Flags for an identity, all-false if never touched.
    #[must_use]
    pub fn record(&self, identity: &Identity) -> EligibilityRecord {
        self.records.get(identity).copied().unwrap_or_default()
    }

    /// Whether the officer ever touched this identity.
    #[must_use]
    pub fn has_record(&self, identity: &Identity) -> bool {
        self.records.contains_key(identity)
    }

    /// Current holder of the officer role.
    #[must_use]
    pub fn officer(&self) -> Identity {
        self.officer
    }

    /// Every event since construction or the last drain.
    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }

    /// Drain the events; the chain head is kept.
    pub fn take_events(&mut self) -> Vec<EventRecord> {
        self.events.take()
    }

    #[must_use]
    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn require_officer(&self, caller: Identity) -> Result<()> {
        if caller != self.officer {
            return Err(RwaError::Unauthorized {
                role: Role::RegistryOfficer,
                caller,
            });
        }
        Ok(())
    }

    /// Validate the whole batch, then apply it.
    fn apply_batch(&mut self, caller: Identity, identities: &[Identity], op: FlagOp) -> Result<()> {
        self.require_officer(caller)?;

        let mut applied: HashSet<Identity> = HashSet::with_capacity(identities.len());
        for identity in identities {
            if identity.is_null() {
                return Err(RwaError::InvalidIdentity);
            }
            let current = if applied.contains(identity) {
                op.target()
            } else {
                op.flag(&self.record(identity))
            };
            if current == op.target() {
                tracing::warn!(
                    op = op.label(),
                    identity = %identity,
                    batch = identities.len(),
                    "Eligibility batch rejected"
                );
                return Err(op.conflict(*identity));
            }
            applied.insert(*identity);
        }

        let now = self.clock.now();
        for identity in identities {
            op.set(self.records.entry(*identity).or_default());
            self.events.append(now, op.event(*identity));
            tracing::info!(op = op.label(), identity = %identity, "Eligibility updated");
        }
        Ok(())
    }
}

impl EligibilityCheck for EligibilityRegistry {
    fn is_eligible(&self, identity: &Identity) -> bool {
        EligibilityRegistry::is_eligible(self, identity)
    }
}

// ---------------------------------------------------------------------------
// SharedRegistry
// ---------------------------------------------------------------------------

/// Registry shared between its officer and the ledgers that consult it.
///
/// Each operation takes the lock for its whole duration, so every batch
/// is observed either fully applied or not at all.
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<RwLock<EligibilityRegistry>>,
}

impl SharedRegistry {
    #[must_use]
    pub fn new(registry: EligibilityRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Shared read access for queries.
    pub fn read(&self) -> RwLockReadGuard<'_, EligibilityRegistry> {
        self.inner.read()
    }

    /// Exclusive access for officer operations.
    pub fn write(&self) -> RwLockWriteGuard<'_, EligibilityRegistry> {
        self.inner.write()
    }

    /// Handle to pass to a settlement ledger.
    #[must_use]
    pub fn as_check(&self) -> Arc<dyn EligibilityCheck> {
        Arc::new(self.clone())
    }
}

impl EligibilityCheck for SharedRegistry {
    fn is_eligible(&self, identity: &Identity) -> bool {
        self.inner.read().is_eligible(identity)
    }
}
