//! # openrwa-registry
//!
//! **Eligibility registry**: per-identity whitelist and freeze flags,
//! mutated only by the compliance officer.
//!
//! An identity is eligible when it is whitelisted AND NOT frozen. The
//! answer is re-derived from the flags on every query; a freeze takes
//! effect on the very next check made by any ledger.
//!
//! ## Batch policy
//!
//! Batch operations are atomic. The whole batch is validated (including
//! duplicates inside the batch) before any flag changes; a rejected batch
//! leaves the registry untouched and emits no events.

pub mod registry;

pub use registry::{EligibilityRecord, EligibilityRegistry, SharedRegistry};
