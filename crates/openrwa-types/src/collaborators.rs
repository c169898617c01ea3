//! Seams between the settlement ledger and the components it consults.
//!
//! The ledger never owns its collaborators. It holds `Arc<dyn ...>` handles
//! fixed at construction and re-queries them on every operation; nothing
//! returned here is cached by callers.

use crate::{Amount, Identity, Price, Result};

/// Live eligibility answer: whitelisted AND NOT frozen.
pub trait EligibilityCheck: Send + Sync {
    fn is_eligible(&self, identity: &Identity) -> bool;
}

/// Price collaborator.
pub trait PriceSource: Send + Sync {
    /// Informational price. Never fails, ignores staleness.
    fn current_price(&self) -> Price;

    /// Price for economically consequential conversions.
    ///
    /// # Errors
    /// `StalePrice` if the last attestation is older than the staleness bound.
    fn validated_price(&self) -> Result<Price>;
}

/// External payment-asset ledger that holds the reserve in custody.
///
/// Both movements are all-or-nothing: on `Err` no funds moved.
pub trait PaymentRail: Send + Sync {
    /// Declared fractional precision of the payment asset.
    fn decimals(&self) -> u8;

    /// Pull `amount` from `from` into custody.
    fn collect(&self, from: Identity, amount: Amount) -> Result<()>;

    /// Pay `amount` out of custody to `to`.
    fn disburse(&self, to: Identity, amount: Amount) -> Result<()>;
}
