//! Monotonic price feed with a staleness gate.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use openrwa_types::{
    Clock, Event, EventLog, EventRecord, FeedConfig, Identity, Price, PriceSource, Result, Role,
    RwaError,
};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Observable feed state, derived from the clock on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Attestation age within the staleness bound.
    Fresh,
    /// Attestation older than the staleness bound.
    Stale,
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => write!(f, "FRESH"),
            Self::Stale => write!(f, "STALE"),
        }
    }
}

/// Price per value unit, attested by a designated updater.
///
/// Invariant: `price` never decreases over the lifetime of the instance.
pub struct ValuationFeed {
    owner: Identity,
    updater: Identity,
    price: Price,
    last_attested_at: DateTime<Utc>,
    max_staleness: Duration,
    clock: Arc<dyn Clock>,
    events: EventLog,
}

impl ValuationFeed {
    /// Starts at a price of 1.0, attested at construction time.
    pub fn new(config: &FeedConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let now = clock.now();
        Ok(Self {
            owner: config.owner,
            updater: config.updater,
            price: Price::ONE,
            last_attested_at: now,
            max_staleness: config.max_staleness(),
            clock,
            events: EventLog::new(),
        })
    }

    // -----------------------------------------------------------------
    // Updater
    // -----------------------------------------------------------------

    /// Attest a new price. Equal prices are accepted and refresh the
    /// attestation time.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the updater
    /// - `PriceDecreased` if `new_price` is below the current price
    pub fn update_price(&mut self, caller: Identity, new_price: Price) -> Result<()> {
        if caller != self.updater {
            return Err(RwaError::Unauthorized {
                role: Role::FeedUpdater,
                caller,
            });
        }
        if new_price < self.price {
            tracing::warn!(
                current = %self.price,
                attempted = %new_price,
                "Price decrease rejected"
            );
            return Err(RwaError::PriceDecreased {
                current: self.price,
                attempted: new_price,
            });
        }

        let now = self.clock.now();
        let old_price = std::mem::replace(&mut self.price, new_price);
        self.last_attested_at = now;
        self.events.append(
            now,
            Event::PriceUpdated {
                old_price,
                new_price,
                timestamp: now,
            },
        );
        tracing::info!(old = %old_price, new = %new_price, "Price attested");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// Informational price; ignores staleness.
    #[must_use]
    pub fn read_price(&self) -> Price {
        self.price
    }

    /// Price for live conversions.
    ///
    /// # Errors
    /// `StalePrice` when the feed is [`Freshness::Stale`].
    pub fn read_validated_price(&self) -> Result<Price> {
        match self.freshness() {
            Freshness::Fresh => Ok(self.price),
            Freshness::Stale => {
                tracing::warn!(
                    last_attested_at = %self.last_attested_at,
                    max_staleness_secs = self.max_staleness.num_seconds(),
                    "Validated read on stale price"
                );
                Err(RwaError::StalePrice {
                    last_attested_at: self.last_attested_at,
                    max_staleness_secs: self.max_staleness.num_seconds(),
                })
            }
        }
    }

    #[must_use]
    pub fn freshness(&self) -> Freshness {
        if self.clock.now() - self.last_attested_at > self.max_staleness {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }

    #[must_use]
    pub fn last_attested_at(&self) -> DateTime<Utc> {
        self.last_attested_at
    }

    #[must_use]
    pub fn max_staleness(&self) -> Duration {
        self.max_staleness
    }

    #[must_use]
    pub fn owner(&self) -> Identity {
        self.owner
    }

    #[must_use]
    pub fn updater(&self) -> Identity {
        self.updater
    }

    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }

    pub fn take_events(&mut self) -> Vec<EventRecord> {
        self.events.take()
    }

    #[must_use]
    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    // -----------------------------------------------------------------
    // Owner
    // -----------------------------------------------------------------

    pub fn set_updater(&mut self, caller: Identity, updater: Identity) -> Result<()> {
        self.require_owner(caller)?;
        if updater.is_null() {
            return Err(RwaError::InvalidIdentity);
        }
        let previous = std::mem::replace(&mut self.updater, updater);
        self.events
            .append(self.clock.now(), Event::UpdaterChanged { previous, updater });
        tracing::info!(%previous, %updater, "Feed updater changed");
        Ok(())
    }

    /// # Errors
    /// `ZeroDuration` for a zero (or negative) bound.
    pub fn set_max_staleness(&mut self, caller: Identity, max_staleness: Duration) -> Result<()> {
        self.require_owner(caller)?;
        if max_staleness <= Duration::zero() {
            return Err(RwaError::ZeroDuration);
        }
        let previous = std::mem::replace(&mut self.max_staleness, max_staleness);
        self.events.append(
            self.clock.now(),
            Event::MaxStalenessChanged {
                previous_secs: previous.num_seconds(),
                max_staleness_secs: max_staleness.num_seconds(),
            },
        );
        tracing::info!(
            previous_secs = previous.num_seconds(),
            max_staleness_secs = max_staleness.num_seconds(),
            "Feed staleness bound changed"
        );
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: Identity, new_owner: Identity) -> Result<()> {
        self.require_owner(caller)?;
        if new_owner.is_null() {
            return Err(RwaError::InvalidIdentity);
        }
        let previous = std::mem::replace(&mut self.owner, new_owner);
        self.events.append(
            self.clock.now(),
            Event::RoleTransferred {
                role: Role::FeedOwner,
                previous,
                holder: new_owner,
            },
        );
        tracing::info!(%previous, owner = %new_owner, "Feed ownership transferred");
        Ok(())
    }

    fn require_owner(&self, caller: Identity) -> Result<()> {
        if caller != self.owner {
            return Err(RwaError::Unauthorized {
                role: Role::FeedOwner,
                caller,
            });
        }
        Ok(())
    }
}

impl PriceSource for ValuationFeed {
    fn current_price(&self) -> Price {
        self.read_price()
    }

    fn validated_price(&self) -> Result<Price> {
        self.read_validated_price()
    }
}

// ---------------------------------------------------------------------------
// SharedFeed
// ---------------------------------------------------------------------------

/// Feed shared between its updater/owner and the ledgers that price off it.
#[derive(Clone)]
pub struct SharedFeed {
    inner: Arc<RwLock<ValuationFeed>>,
}

impl SharedFeed {
    #[must_use]
    pub fn new(feed: ValuationFeed) -> Self {
        Self {
            inner: Arc::new(RwLock::new(feed)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ValuationFeed> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ValuationFeed> {
        self.inner.write()
    }

    /// Handle to pass to a settlement ledger.
    #[must_use]
    pub fn as_source(&self) -> Arc<dyn PriceSource> {
        Arc::new(self.clone())
    }
}

impl PriceSource for SharedFeed {
    fn current_price(&self) -> Price {
        self.inner.read().read_price()
    }

    fn validated_price(&self) -> Result<Price> {
        self.inner.read().read_validated_price()
    }
}
