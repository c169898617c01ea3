//! # openrwa-types
//!
//! Shared types, errors, and configuration for the **OpenRWA** settlement engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Identity`], [`Role`]
//! - **Amounts**: [`Amount`], [`Price`], [`PaymentScale`] and the floor-rounding scale math
//! - **Collaborator seams**: [`EligibilityCheck`], [`PriceSource`], [`PaymentRail`]
//! - **Time**: [`Clock`], [`SystemClock`], [`ManualClock`]
//! - **Audit trail**: [`Event`], [`EventRecord`], [`EventLog`]
//! - **Asset metadata**: [`AssetClass`], [`AssetProfile`]
//! - **Configuration**: [`RegistryConfig`], [`FeedConfig`], [`LedgerConfig`], [`EngineConfig`]
//! - **Errors**: [`RwaError`] with `RWA_ERR_` prefix codes
//! - **Constants**: scales, window length, defaults

pub mod asset;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod scale;

pub use asset::*;
pub use clock::*;
pub use collaborators::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use scale::*;

// Constants are accessed via `openrwa_types::constants::FOO`
// (not re-exported to avoid name collisions).
