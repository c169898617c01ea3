//! Configuration types for OpenRWA components.
//!
//! Amount limits are written in human units (`"250000.00"`) and converted
//! to base units with the precision of the asset they bound.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Amount, AssetProfile, Identity, RwaError, Result, constants, parse_units};

/// Construction parameters for an eligibility registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Compliance officer allowed to whitelist and freeze.
    pub officer: Identity,
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        require_identity("registry.officer", self.officer)
    }
}

/// Construction parameters for a valuation feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub owner: Identity,
    pub updater: Identity,
    /// Maximum attestation age before validated reads fail.
    #[serde(default = "default_max_staleness_secs")]
    pub max_staleness_secs: i64,
}

impl FeedConfig {
    #[must_use]
    pub fn new(owner: Identity, updater: Identity) -> Self {
        Self {
            owner,
            updater,
            max_staleness_secs: constants::DEFAULT_MAX_STALENESS_SECS,
        }
    }

    #[must_use]
    pub fn max_staleness(&self) -> Duration {
        Duration::seconds(self.max_staleness_secs)
    }

    pub fn validate(&self) -> Result<()> {
        require_identity("feed.owner", self.owner)?;
        require_identity("feed.updater", self.updater)?;
        if self.max_staleness_secs <= 0 {
            return Err(RwaError::Configuration(format!(
                "feed.max_staleness_secs must be positive, got {}",
                self.max_staleness_secs
            )));
        }
        Ok(())
    }
}

fn default_max_staleness_secs() -> i64 {
    constants::DEFAULT_MAX_STALENESS_SECS
}

/// Construction parameters for a settlement ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub owner: Identity,
    pub name: String,
    pub symbol: String,
    /// Declared fractional precision of the payment asset.
    pub payment_decimals: u8,
    /// Daily invest cap in payment-asset human units (0 = unlimited).
    #[serde(default)]
    pub daily_invest_cap: Decimal,
    /// Daily redeem cap in value-unit human units (0 = unlimited).
    #[serde(default)]
    pub daily_redeem_cap: Decimal,
    /// Descriptive metadata; never interpreted by settlement.
    #[serde(default)]
    pub asset: Option<AssetProfile>,
}

impl LedgerConfig {
    /// Unlimited caps, no metadata.
    #[must_use]
    pub fn new(owner: Identity, payment_decimals: u8) -> Self {
        Self {
            owner,
            name: "OpenRWA Unit".to_string(),
            symbol: "RWA".to_string(),
            payment_decimals,
            daily_invest_cap: Decimal::ZERO,
            daily_redeem_cap: Decimal::ZERO,
            asset: None,
        }
    }

    /// Invest cap in payment base units.
    pub fn invest_cap_base_units(&self) -> Result<Amount> {
        parse_units(self.daily_invest_cap, self.payment_decimals)
    }

    /// Redeem cap in value base units.
    pub fn redeem_cap_base_units(&self) -> Result<Amount> {
        parse_units(self.daily_redeem_cap, constants::UNIT_DECIMALS)
    }

    pub fn validate(&self) -> Result<()> {
        require_identity("ledger.owner", self.owner)?;
        if self.payment_decimals > constants::MAX_PAYMENT_DECIMALS {
            return Err(RwaError::Configuration(format!(
                "ledger.payment_decimals {} exceeds maximum {}",
                self.payment_decimals,
                constants::MAX_PAYMENT_DECIMALS
            )));
        }
        if self.symbol.trim().is_empty() {
            return Err(RwaError::Configuration(
                "ledger.symbol must not be empty".to_string(),
            ));
        }
        self.invest_cap_base_units()?;
        self.redeem_cap_base_units()?;
        Ok(())
    }
}

/// All three components of one deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub registry: RegistryConfig,
    pub feed: FeedConfig,
    pub ledger: LedgerConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RwaError::Configuration(format!("invalid engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.registry.validate()?;
        self.feed.validate()?;
        self.ledger.validate()
    }
}

fn require_identity(field: &str, identity: Identity) -> Result<()> {
    if identity.is_null() {
        return Err(RwaError::Configuration(format!(
            "{field} must not be the null identity"
        )));
    }
    Ok(())
}
