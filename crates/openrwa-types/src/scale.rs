//! Fixed-point amounts, prices, and the payment ↔ value-unit scale math.
//!
//! All conversions between payment-asset amounts and value units live here
//! and round toward zero. Flooring favours the ledger over the participant
//! and is part of the public contract: invest, redeem and display valuation
//! all go through [`PaymentScale`].
//!
//! Intermediate products are computed at 256-bit width so that
//! `amount * 10^18` never overflows before the division.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{RwaError, Result, constants};

/// Raw base-unit amount (value units at 18 decimals, payment units at the
/// payment asset's precision).
pub type Amount = u128;

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

/// Payment value of one value unit, scaled by [`constants::UNIT_SCALE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u128);

impl Price {
    /// 1.0: one payment unit per value unit.
    pub const ONE: Self = Self(constants::UNIT_SCALE);

    #[must_use]
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// Parse a human price such as `1.05`.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        parse_units(value, constants::UNIT_DECIMALS).map(Self)
    }

    /// Human-readable price, `None` if it does not fit a `Decimal`.
    #[must_use]
    pub fn to_decimal(self) -> Option<Decimal> {
        to_decimal(self.0, constants::UNIT_DECIMALS)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(d) => write!(f, "{d}"),
            None => write!(f, "{}e-{}", self.0, constants::UNIT_DECIMALS),
        }
    }
}

// ---------------------------------------------------------------------------
// PaymentScale
// ---------------------------------------------------------------------------

/// Conversion between a payment asset of lower precision and the 18-decimal
/// value unit. Computed once per ledger and never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentScale {
    payment_decimals: u8,
    factor: u128,
}

impl PaymentScale {
    /// # Errors
    /// `Configuration` if the payment asset declares more than 18 decimals.
    pub fn new(payment_decimals: u8) -> Result<Self> {
        if payment_decimals > constants::MAX_PAYMENT_DECIMALS {
            return Err(RwaError::Configuration(format!(
                "payment asset precision {payment_decimals} exceeds maximum {}",
                constants::MAX_PAYMENT_DECIMALS
            )));
        }
        let exponent = u32::from(constants::UNIT_DECIMALS - payment_decimals);
        Ok(Self {
            payment_decimals,
            factor: 10u128.pow(exponent),
        })
    }

    #[must_use]
    pub fn payment_decimals(&self) -> u8 {
        self.payment_decimals
    }

    /// Multiplier from payment base units to 18-decimal base units.
    #[must_use]
    pub fn factor(&self) -> u128 {
        self.factor
    }

    /// `floor(payment * factor * UNIT_SCALE / price)`.
    pub fn units_for_payment(&self, payment: Amount, price: Price) -> Result<Amount> {
        mul_div_floor(payment, self.factor * constants::UNIT_SCALE, price.raw()).ok_or(
            RwaError::AmountOverflow {
                context: "units conversion",
            },
        )
    }

    /// `floor(units * price / (UNIT_SCALE * factor))`, one division so the
    /// 256-bit intermediate covers every balance the ledger can mint.
    pub fn payment_for_units(&self, units: Amount, price: Price) -> Result<Amount> {
        mul_div_floor(units, price.raw(), constants::UNIT_SCALE * self.factor).ok_or(
            RwaError::AmountOverflow {
                context: "payment conversion",
            },
        )
    }
}

// ---------------------------------------------------------------------------
// 256-bit mul-div
// ---------------------------------------------------------------------------

/// `floor(a * b / d)` with a 256-bit intermediate product.
///
/// Returns `None` when `d == 0` or the quotient does not fit in 128 bits.
#[must_use]
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    let (hi, lo) = widening_mul(a, b);
    if hi == 0 {
        return Some(lo / d);
    }
    if hi >= d {
        return None;
    }

    // Restoring long division of (hi:lo) by d; hi < d keeps the quotient
    // inside 128 bits.
    let mut rem = hi;
    let mut quotient: u128 = 0;
    for bit in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> bit) & 1);
        quotient <<= 1;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quotient |= 1;
        }
    }
    Some(quotient)
}

/// Full 256-bit product as `(high, low)` halves.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = (1u128 << 64) - 1;
    let (a_hi, a_lo) = (a >> 64, a & MASK);
    let (b_hi, b_lo) = (b >> 64, b & MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
    let lo = (ll & MASK) | (mid << 64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

// ---------------------------------------------------------------------------
// Human-unit conversion
// ---------------------------------------------------------------------------

/// Render a base-unit amount in human units, `None` if out of `Decimal` range.
#[must_use]
pub fn to_decimal(amount: Amount, decimals: u8) -> Option<Decimal> {
    let mantissa = i128::try_from(amount).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, u32::from(decimals))
        .ok()
        .map(|d| d.normalize())
}

/// Convert a human-unit amount (e.g. `1000.50`) to base units.
///
/// # Errors
/// `Configuration` if the value is negative or carries more fractional
/// digits than `decimals`; `AmountOverflow` if it does not fit.
pub fn parse_units(value: Decimal, decimals: u8) -> Result<Amount> {
    let value = value.normalize();
    if value.is_sign_negative() && !value.is_zero() {
        return Err(RwaError::Configuration(format!(
            "amount {value} must not be negative"
        )));
    }
    let scale = value.scale();
    let decimals = u32::from(decimals);
    if scale > decimals {
        return Err(RwaError::Configuration(format!(
            "amount {value} has more than {decimals} fractional digits"
        )));
    }
    let mantissa = u128::try_from(value.mantissa()).map_err(|_| {
        RwaError::Configuration(format!("amount {value} must not be negative"))
    })?;
    mantissa
        .checked_mul(10u128.pow(decimals - scale))
        .ok_or(RwaError::AmountOverflow {
            context: "human amount",
        })
}
