//! Money arithmetic.
//!
//! All amounts are `rust_decimal::Decimal` with two decimal places. Every derived amount
//! goes through [`round_money`], and comparisons between amounts use [`MONEY_TOLERANCE`]
//! so rounding residue never flips a payment status.

use rust_decimal::prelude::*;

/// Decimal places for currency amounts.
pub const DECIMAL_PLACES: u32 = 2;

/// Smallest currency unit. Two amounts closer than this are equal.
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, DECIMAL_PLACES);

/// Round to currency precision, half away from zero.
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

#[inline]
pub fn money_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < MONEY_TOLERANCE
}

/// `a` is larger than `b` by at least one currency unit.
#[inline]
pub fn money_exceeds(a: Decimal, b: Decimal) -> bool {
    a - b >= MONEY_TOLERANCE
}

/// A caller-supplied amount is usable as money: non-negative with at most two decimals.
pub fn is_valid_amount(value: Decimal) -> bool {
    !value.is_sign_negative() && value.normalize().scale() <= DECIMAL_PLACES
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(d("10.005")), d("10.01"));
        assert_eq!(round_money(d("10.004")), d("10.00"));
        assert_eq!(round_money(d("-2.345")), d("-2.35"));
    }

    #[test]
    fn tolerance_is_one_minor_unit() {
        assert!(money_eq(d("100.00"), d("100.004")));
        assert!(!money_eq(d("100.00"), d("100.01")));
        assert!(money_exceeds(d("100.01"), d("100.00")));
        assert!(!money_exceeds(d("100.009"), d("100.00")));
    }

    #[test]
    fn validates_amount_precision() {
        assert!(is_valid_amount(d("12.50")));
        assert!(is_valid_amount(d("12.500")));
        assert!(!is_valid_amount(d("12.505")));
        assert!(!is_valid_amount(d("-1")));
    }
}
