//! # openrwa-settlement
//!
//! **Settlement ledger**: converts a payment asset into value units and
//! back at a validated price, gated by live eligibility.
//!
//! ## Architecture
//!
//! A [`SettlementLedger`] owns balances, supply, the payment reserve and a
//! [`RateLimitWindow`]. It borrows three collaborators through trait
//! handles fixed at construction ([`Collaborators`]):
//!
//! - an eligibility check (whitelisted and not frozen), consulted on every call
//! - a price source, read through its staleness gate for invest/redeem
//! - a payment rail that moves the payment asset in and out of custody
//!
//! ## Atomicity
//!
//! Operations run every guard before the single external rail call and
//! commit local state only after it succeeds. A rejected operation leaves
//! balances, supply, reserve and the rate-limit window exactly as they were.
//!
//! ## Invariants
//!
//! - `Σ(balances) == total_supply == minted - burned` ([`SupplyConservation`])
//! - redemption never takes the reserve below zero
//! - burns skip eligibility; mints and transfers do not

pub mod ledger;
pub mod payment;
pub mod rate_limit;
pub mod supply_conservation;

pub use ledger::{Collaborators, SettlementLedger, SharedLedger};
pub use payment::InMemoryPaymentAsset;
pub use rate_limit::{Flow, RateLimitWindow, WindowTicket};
pub use supply_conservation::SupplyConservation;
