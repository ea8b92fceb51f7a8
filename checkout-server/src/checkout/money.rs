//! Money calculation utilities using rust_decimal for precision
//!
//! All arithmetic is done using `Decimal` internally, then converted to
//! `f64` (2 decimal places, half-up) for storage/serialization.

use super::error::CheckoutError;
use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line
const MAX_QUANTITY: i64 = 9_999;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Line subtotal: unit price × quantity
pub fn line_subtotal(unit_price: f64, quantity: i64) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}

/// Order total: sum of line subtotals
pub fn order_total<I: IntoIterator<Item = f64>>(subtotals: I) -> f64 {
    let total: Decimal = subtotals.into_iter().map(to_decimal).sum();
    to_f64(total)
}

/// Validate a unit price (finite, non-negative, bounded)
pub fn validate_price(price: f64) -> Result<(), CheckoutError> {
    if !price.is_finite() {
        return Err(CheckoutError::Validation(format!(
            "price must be a finite number, got {}",
            price
        )));
    }
    if price < 0.0 {
        return Err(CheckoutError::Validation(format!(
            "price must be non-negative, got {}",
            price
        )));
    }
    if price > MAX_PRICE {
        return Err(CheckoutError::Validation(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, price
        )));
    }
    Ok(())
}

/// Validate a line quantity (positive, bounded)
pub fn validate_quantity(quantity: i64) -> Result<(), CheckoutError> {
    if quantity <= 0 {
        return Err(CheckoutError::Validation(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(CheckoutError::Validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}
