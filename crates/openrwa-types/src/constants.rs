//! System-wide constants for the OpenRWA settlement engine.

/// Fractional digits of the value unit.
pub const UNIT_DECIMALS: u8 = 18;

/// One whole value unit in base units (`10^18`). Also the price scale:
/// a price of `UNIT_SCALE` means one payment unit per value unit.
pub const UNIT_SCALE: u128 = 1_000_000_000_000_000_000;

/// Highest payment-asset precision a ledger accepts.
pub const MAX_PAYMENT_DECIMALS: u8 = UNIT_DECIMALS;

/// Length of the invest/redeem rate-limit window in seconds (one day).
pub const RATE_LIMIT_WINDOW_SECS: i64 = 86_400;

/// Default maximum price attestation age in seconds.
pub const DEFAULT_MAX_STALENESS_SECS: i64 = 86_400;

/// Digest of the empty audit log (chain genesis).
pub const GENESIS_DIGEST: [u8; 32] = [0u8; 32];

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenRWA";
