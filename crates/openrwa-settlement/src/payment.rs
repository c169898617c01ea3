//! In-memory payment-asset ledger.
//!
//! Stands in for the external payment asset (e.g. a 6-decimal stablecoin)
//! in simulations and tests. Participants approve the custody account,
//! and the settlement ledger pulls from them via [`PaymentRail::collect`].
//! Every movement is all-or-nothing.

use std::collections::HashMap;

use openrwa_types::{Amount, Identity, PaymentRail, Result, RwaError};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct PaymentBook {
    balances: HashMap<Identity, Amount>,
    allowances: HashMap<(Identity, Identity), Amount>,
    offline: bool,
}

impl PaymentBook {
    fn balance(&self, who: &Identity) -> Amount {
        self.balances.get(who).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Identity, spender: &Identity) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn move_funds(&mut self, from: Identity, to: Identity, amount: Amount) -> Result<()> {
        if self.offline {
            return Err(RwaError::PaymentTransferFailed {
                reason: "payment rail offline".to_string(),
            });
        }
        let available = self.balance(&from);
        if available < amount {
            return Err(RwaError::PaymentTransferFailed {
                reason: format!("balance of {from} is {available}, need {amount}"),
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(&to)
            .checked_add(amount)
            .ok_or(RwaError::AmountOverflow {
                context: "payment credit",
            })?;
        self.balances.insert(from, available - amount);
        self.balances.insert(to, credited);
        Ok(())
    }
}

/// Payment asset with balances, allowances, and one custody account.
#[derive(Debug)]
pub struct InMemoryPaymentAsset {
    symbol: String,
    decimals: u8,
    custody: Identity,
    book: Mutex<PaymentBook>,
}

impl InMemoryPaymentAsset {
    #[must_use]
    pub fn new(symbol: impl Into<String>, decimals: u8, custody: Identity) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            custody,
            book: Mutex::new(PaymentBook::default()),
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Account holding the settlement reserve.
    #[must_use]
    pub fn custody(&self) -> Identity {
        self.custody
    }

    /// Credit `amount` out of thin air (faucet for simulations).
    pub fn issue(&self, to: Identity, amount: Amount) -> Result<()> {
        let mut book = self.book.lock();
        let next = book
            .balance(&to)
            .checked_add(amount)
            .ok_or(RwaError::AmountOverflow {
                context: "payment issue",
            })?;
        book.balances.insert(to, next);
        Ok(())
    }

    pub fn approve(&self, owner: Identity, spender: Identity, amount: Amount) {
        self.book.lock().allowances.insert((owner, spender), amount);
    }

    /// Approve the custody account to pull `amount` from `owner`.
    pub fn approve_custody(&self, owner: Identity, amount: Amount) {
        self.approve(owner, self.custody, amount);
    }

    pub fn transfer(&self, from: Identity, to: Identity, amount: Amount) -> Result<()> {
        self.book.lock().move_funds(from, to, amount)
    }

    #[must_use]
    pub fn balance_of(&self, who: &Identity) -> Amount {
        self.book.lock().balance(who)
    }

    #[must_use]
    pub fn allowance(&self, owner: &Identity, spender: &Identity) -> Amount {
        self.book.lock().allowance(owner, spender)
    }

    /// Simulate an outage: every movement fails until brought back.
    pub fn set_offline(&self, offline: bool) {
        self.book.lock().offline = offline;
    }
}

impl PaymentRail for InMemoryPaymentAsset {
    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn collect(&self, from: Identity, amount: Amount) -> Result<()> {
        let mut book = self.book.lock();
        let allowed = book.allowance(&from, &self.custody);
        if allowed < amount {
            return Err(RwaError::PaymentTransferFailed {
                reason: format!("allowance of {from} to custody is {allowed}, need {amount}"),
            });
        }
        book.move_funds(from, self.custody, amount)?;
        book.allowances
            .insert((from, self.custody), allowed - amount);
        Ok(())
    }

    fn disburse(&self, to: Identity, amount: Amount) -> Result<()> {
        self.book.lock().move_funds(self.custody, to, amount)
    }
}
