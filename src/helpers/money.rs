//! Bounds on money amounts accepted from requests.

use rust_decimal::Decimal;
use validator::ValidationError;

use crate::error::ApiError;

/// Whole units that fit the `(16, 4)` money columns.
const MAX_WHOLE_UNITS: i64 = 1_000_000_000_000;

/// Smallest amount that is rejected.
pub fn amount_limit() -> Decimal {
    Decimal::new(MAX_WHOLE_UNITS, 0)
}

/// Validator for money fields: not negative and below [`amount_limit`].
pub fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    if *value >= amount_limit() {
        return Err(ValidationError::new("amount_too_large"));
    }
    Ok(())
}

/// `unit * quantity`, rejected when it overflows or leaves the accepted range.
pub fn checked_total(unit: Decimal, quantity: i32) -> Result<Decimal, ApiError> {
    unit.checked_mul(Decimal::from(quantity))
        .filter(|total| *total < amount_limit())
        .ok_or_else(|| ApiError::Validation("Deal total is too large".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(validate_amount(&Decimal::ZERO).is_ok());
        assert!(validate_amount(&Decimal::new(-0, 2)).is_ok());
        assert!(validate_amount(&Decimal::new(-1, 2)).is_err());
        assert!(validate_amount(&Decimal::new(999_999_999_999_9999, 4)).is_ok());
        assert!(validate_amount(&amount_limit()).is_err());
        assert!(validate_amount(&Decimal::MAX).is_err());
    }

    #[test]
    fn total_overflow_is_a_validation_error() {
        assert_eq!(checked_total(Decimal::new(250, 0), 4).unwrap(), Decimal::new(1000, 0));
        assert!(matches!(checked_total(Decimal::MAX, 10), Err(ApiError::Validation(_))));
        assert!(matches!(
            checked_total(Decimal::new(999_999_999_999, 0), i32::MAX),
            Err(ApiError::Validation(_))
        ));
    }
}
