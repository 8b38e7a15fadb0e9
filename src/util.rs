//! Shared helpers for money handling at the JSON boundary.
//!
//! The API speaks decimal reais; storage is integer cents. Conversion is the
//! single place where "positive, finite, at most two decimal places" is
//! enforced.

use crate::error::{msg, AppError, Result};

/// Convert a decimal amount to integer cents, rejecting non-finite values
/// and amounts with more than two decimal places. Zero is allowed here;
/// callers that require a strictly positive amount check that first.
pub fn amount_to_cents(amount: f64) -> Result<i64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::Validation(msg::AMOUNT_INVALID.into()));
    }
    let scaled = amount * 100.0;
    let cents = scaled.round();
    // Tolerance covers float representation of two-decimal values (49.90
    // scales to 4989.999...), not genuine sub-cent precision.
    if (scaled - cents).abs() > 1e-6 {
        return Err(AppError::Validation(msg::AMOUNT_TOO_PRECISE.into()));
    }
    Ok(cents as i64)
}

pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}
