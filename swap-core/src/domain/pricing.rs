//! Fixed-point pricing of capacity in asset units.
//!
//! A price is the number of asset units one CKB costs, carried with six fractional digits.
//! Asset amounts on chain use the same six-digit scale.

use crate::foundation::{Result, SwapError, PRICE_DECIMALS, SHANNONS_PER_CKB};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parses a positive decimal price, truncated to the price scale.
pub fn parse_price(value: &str) -> Result<Decimal> {
    let price = Decimal::from_str(value.trim()).map_err(|err| SwapError::invalid_input(format!("invalid price '{}': {}", value, err)))?;
    let price = price.round_dp_with_strategy(PRICE_DECIMALS, RoundingStrategy::ToZero);
    if price <= Decimal::ZERO {
        return Err(SwapError::invalid_input(format!("price must be positive: {}", value)));
    }
    Ok(price)
}

fn non_negative(value: Decimal, what: &str) -> Result<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(SwapError::ConfigError(format!("{} must not be negative: {}", what, value)));
    }
    Ok(value)
}

/// Validates an incentive given in percent (`1.5` = 1.5%).
pub fn incentive_percent(value: Decimal) -> Result<Decimal> {
    non_negative(value, "incentive percent")
}

/// Converts a CKB amount into shannons.
pub fn ckb_to_shannons(value: Decimal) -> Result<u64> {
    non_negative(value, "CKB amount")?
        .checked_mul(Decimal::from(SHANNONS_PER_CKB))
        .and_then(|shannons| shannons.trunc().to_u64())
        .ok_or_else(|| SwapError::ConfigError(format!("CKB amount out of range: {}", value)))
}

/// Converts whole asset units (up to six decimals) into base units.
pub fn asset_units(value: Decimal) -> Result<u128> {
    non_negative(value, "asset amount")?
        .checked_mul(Decimal::from(10u64.pow(PRICE_DECIMALS)))
        .and_then(|scaled| scaled.trunc().to_u128())
        .ok_or_else(|| SwapError::ConfigError(format!("asset amount out of range: {}", value)))
}

/// Asset units charged for `capacity` shannons at `price`, including the incentive.
///
/// `round(capacity_in_ckb × price × (1 + incentive_percent / 100))` on the six-digit asset scale,
/// rounding half away from zero.
pub fn calculate_bid_udts(price: Decimal, incentive_percent: Decimal, capacity: u64) -> Result<u128> {
    let overflow = || SwapError::Message(format!("price calculation overflow for capacity {}", capacity));
    let ckb = Decimal::from(capacity) / Decimal::from(SHANNONS_PER_CKB);
    let factor = Decimal::ONE + incentive_percent / Decimal::ONE_HUNDRED;
    let scale = Decimal::from(10u64.pow(PRICE_DECIMALS));
    let units = ckb.checked_mul(price).and_then(|v| v.checked_mul(factor)).and_then(|v| v.checked_mul(scale)).ok_or_else(overflow)?;
    units.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero).to_u128().ok_or_else(overflow)
}
