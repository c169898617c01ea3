//! # openrwa-valuation
//!
//! **Valuation feed**: the price of one value unit in payment-asset terms.
//!
//! ## State Machine
//!
//! ```text
//!            now - last_attested_at > max_staleness
//!   ┌───────┐ ───────────────────────────────────▶ ┌───────┐
//!   │ FRESH │                                      │ STALE │
//!   └───────┘ ◀─────────────────────────────────── └───────┘
//!                       update_price()
//! ```
//!
//! There is no explicit transition operation: every read re-evaluates the
//! state against the clock. Prices never decrease.

pub mod feed;

pub use feed::{Freshness, SharedFeed, ValuationFeed};
