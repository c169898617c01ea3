//! Supply conservation invariant checker.
//!
//! Mathematical invariant enforced on every ledger:
//! ```text
//! Σ(balances) == total_supply == Σ(minted) - Σ(burned)
//! ```
//!
//! Invest, admin mint and the mint path of the movement hook add to
//! `minted`; redeem and admin burn add to `burned`. Transfers move value
//! between holders and leave both untouched.

use openrwa_types::{Amount, Result, RwaError};

/// Cumulative mint/burn tracker.
///
/// Counters wrap on overflow; their difference stays exact modulo 2^128,
/// and real supply always fits in 128 bits.
#[derive(Debug, Clone, Default)]
pub struct SupplyConservation {
    minted: Amount,
    burned: Amount,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_mint(&mut self, amount: Amount) {
        self.minted = self.minted.wrapping_add(amount);
    }

    pub fn record_burn(&mut self, amount: Amount) {
        self.burned = self.burned.wrapping_add(amount);
    }

    /// Expected outstanding supply: minted - burned.
    #[must_use]
    pub fn expected_supply(&self) -> Amount {
        self.minted.wrapping_sub(self.burned)
    }

    /// Check the sum of balances and the running counter against the
    /// mint/burn history.
    ///
    /// # Errors
    /// Returns [`RwaError::SupplyInvariantViolation`] on any mismatch.
    pub fn verify(&self, balance_sum: Option<Amount>, total_supply: Amount) -> Result<()> {
        let expected = self.expected_supply();
        let Some(balance_sum) = balance_sum else {
            return Err(RwaError::SupplyInvariantViolation {
                reason: "sum of balances overflows".to_string(),
            });
        };
        if balance_sum != total_supply || total_supply != expected {
            return Err(RwaError::SupplyInvariantViolation {
                reason: format!(
                    "balances {balance_sum}, total_supply {total_supply}, expected {expected} \
                     (minted={}, burned={})",
                    self.minted, self.burned,
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn total_minted(&self) -> Amount {
        self.minted
    }

    #[must_use]
    pub fn total_burned(&self) -> Amount {
        self.burned
    }
}
