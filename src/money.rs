//! Money Conversion Module
//!
//! Converts client-facing decimal amounts into integer smallest-unit values
//! (satoshi-style subunits). All output amounts MUST go through this module.
//!
//! Rounding is always FLOOR: the emitted integer never exceeds the decimal
//! amount the caller specified, so an output can never overspend the funding
//! sources it is drawn from.

use rust_decimal::prelude::*;
use thiserror::Error;

/// Fractional digits carried by the UTXO chain (1 coin = 10^8 subunits).
pub const SUBUNIT_EXPONENT: u32 = 8;

#[derive(Debug, Error)]
pub enum MoneyError {
    #[error("Amount must not be negative")]
    Negative,

    #[error("Amount must be greater than zero")]
    Zero,

    #[error("Amount too large, would overflow")]
    Overflow,
}

/// Convert a decimal amount to integer subunits with FLOOR rounding.
///
/// `to_subunits(0.0005, 8)` is `50_000`; a value with more than `exponent`
/// fractional digits is floored, never rounded up.
pub fn to_subunits(amount: Decimal, exponent: u32) -> Result<u64, MoneyError> {
    if amount.is_sign_negative() {
        return Err(MoneyError::Negative);
    }

    let multiplier = Decimal::from(10u64.checked_pow(exponent).ok_or(MoneyError::Overflow)?);
    let scaled = amount.checked_mul(multiplier).ok_or(MoneyError::Overflow)?;

    scaled.floor().to_u64().ok_or(MoneyError::Overflow)
}

/// Subunit conversion for transfer outputs: floor conversion plus the
/// strictly-positive invariant on destination amounts.
pub fn output_subunits(amount: Decimal) -> Result<u64, MoneyError> {
    if amount.is_sign_negative() {
        return Err(MoneyError::Negative);
    }
    if amount.is_zero() {
        return Err(MoneyError::Zero);
    }
    let value = to_subunits(amount, SUBUNIT_EXPONENT)?;
    // Sub-subunit dust (e.g. 0.000000001) floors to zero and cannot be emitted.
    if value == 0 {
        return Err(MoneyError::Zero);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_basic_conversion() {
        assert_eq!(to_subunits(d("0.0005"), 8).unwrap(), 50_000);
        assert_eq!(to_subunits(d("1"), 8).unwrap(), 100_000_000);
        assert_eq!(to_subunits(d("1.5"), 8).unwrap(), 150_000_000);
        assert_eq!(to_subunits(d("0.00000001"), 8).unwrap(), 1);
    }

    #[test]
    fn test_floor_never_rounds_up() {
        // 9 fractional digits: the trailing digit is dropped, not rounded
        assert_eq!(to_subunits(d("0.000000019"), 8).unwrap(), 1);
        assert_eq!(to_subunits(d("0.999999999"), 8).unwrap(), 99_999_999);
        assert_eq!(to_subunits(d("1.000000009"), 8).unwrap(), 100_000_000);
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            to_subunits(d("-0.1"), 8),
            Err(MoneyError::Negative)
        ));
    }

    #[test]
    fn test_zero_allowed_by_converter_rejected_for_outputs() {
        // Raw conversion of zero is legal...
        assert_eq!(to_subunits(Decimal::ZERO, 8).unwrap(), 0);
        // ...but a transfer destination must carry a positive amount.
        assert!(matches!(output_subunits(Decimal::ZERO), Err(MoneyError::Zero)));
        assert!(matches!(
            output_subunits(d("0.000000001")),
            Err(MoneyError::Zero)
        ));
    }

    #[test]
    fn test_other_exponents() {
        assert_eq!(to_subunits(d("1.23"), 2).unwrap(), 123);
        assert_eq!(to_subunits(d("1.239"), 2).unwrap(), 123);
        assert_eq!(to_subunits(d("100"), 0).unwrap(), 100);
    }

    #[test]
    fn test_overflow() {
        let huge = Decimal::from_str("79000000000000000000000000000").unwrap_or(Decimal::MAX);
        assert!(matches!(to_subunits(huge, 8), Err(MoneyError::Overflow)));
    }
}
