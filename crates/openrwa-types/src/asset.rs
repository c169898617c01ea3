//! Descriptive asset-class metadata attached to a settlement ledger.
//!
//! The settlement core carries an [`AssetProfile`] as an opaque payload and
//! never branches on it. Display and provisioning layers read it.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The class of real-world asset a ledger represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Bond,
    RealEstate,
    Commodity,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bond => write!(f, "BOND"),
            Self::RealEstate => write!(f, "REAL_ESTATE"),
            Self::Commodity => write!(f, "COMMODITY"),
        }
    }
}

/// Fixed-income terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondTerms {
    pub isin: String,
    pub maturity: NaiveDate,
    /// Annual coupon in basis points.
    pub coupon_bps: u32,
    /// Face value per whole unit, in payment-asset human units.
    pub face_value: Decimal,
}

/// Property terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTerms {
    pub property_id: String,
    pub jurisdiction: String,
    pub appraised_value: Decimal,
    pub appraised_on: NaiveDate,
}

/// Commodity terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommodityTerms {
    pub commodity: String,
    /// Physical unit, e.g. `troy_oz`.
    pub unit: String,
    /// Physical units backing one whole value unit.
    pub units_per_token: Decimal,
    pub custodian: String,
}

/// Metadata payload tagged by asset class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", content = "terms")]
pub enum AssetProfile {
    Bond(BondTerms),
    RealEstate(PropertyTerms),
    Commodity(CommodityTerms),
}

impl AssetProfile {
    #[must_use]
    pub fn class(&self) -> AssetClass {
        match self {
            Self::Bond(_) => AssetClass::Bond,
            Self::RealEstate(_) => AssetClass::RealEstate,
            Self::Commodity(_) => AssetClass::Commodity,
        }
    }
}
