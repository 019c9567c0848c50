//! Validation utilities

use crate::types::*;
use bigdecimal::BigDecimal;

/// Validate that a weight or threshold lies in [0, 1]
pub fn validate_unit_interval(name: &str, value: f64) -> ReconResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ReconError::Validation(format!(
            "{name} must be between 0 and 1, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a tolerance is not negative
pub fn validate_non_negative_amount(name: &str, amount: &BigDecimal) -> ReconResult<()> {
    if *amount < BigDecimal::from(0) {
        Err(ReconError::Validation(format!(
            "{name} cannot be negative, got {amount}"
        )))
    } else {
        Ok(())
    }
}

/// Validate that a day window is not negative
pub fn validate_day_window(name: &str, days: i64) -> ReconResult<()> {
    if days < 0 {
        Err(ReconError::Validation(format!(
            "{name} cannot be negative, got {days}"
        )))
    } else {
        Ok(())
    }
}

/// Validate that a coarse window is at least as wide as the one it pre-filters for
pub fn validate_window_covers<T: PartialOrd + std::fmt::Display>(
    outer_name: &str,
    outer: &T,
    inner_name: &str,
    inner: &T,
) -> ReconResult<()> {
    if outer < inner {
        return Err(ReconError::Validation(format!(
            "{outer_name} ({outer}) must be at least {inner_name} ({inner})"
        )));
    }
    Ok(())
}
