//! Saturating Decimal arithmetic.
//!
//! `Decimal`'s operators panic on overflow. Projections run on stored and
//! imported reports with unbounded rates, balances and horizons, so the
//! calculations clamp to `Decimal::MAX`/`Decimal::MIN` instead.

use rust_decimal::Decimal;

fn bound(negative: bool) -> Decimal {
    if negative {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

pub fn add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| bound(a.is_sign_negative()))
}

pub fn sub(a: Decimal, b: Decimal) -> Decimal {
    a.checked_sub(b).unwrap_or_else(|| bound(a.is_sign_negative()))
}

pub fn mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b)
        .unwrap_or_else(|| bound(a.is_sign_negative() != b.is_sign_negative()))
}

/// Division by a non-zero denominator; callers guard zero themselves
pub fn div(a: Decimal, b: Decimal) -> Decimal {
    a.checked_div(b)
        .unwrap_or_else(|| bound(a.is_sign_negative() != b.is_sign_negative()))
}

pub fn sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, add)
}

/// True once a value has been clamped to either bound
pub fn is_saturated(value: Decimal) -> bool {
    value == Decimal::MAX || value == Decimal::MIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_matches_operators() {
        let a = Decimal::new(12345, 2);
        let b = Decimal::new(-678, 1);
        assert_eq!(add(a, b), a + b);
        assert_eq!(sub(a, b), a - b);
        assert_eq!(mul(a, b), a * b);
        assert_eq!(div(a, b), a / b);
        assert_eq!(sum([a, b, Decimal::ONE]), a + b + Decimal::ONE);
    }

    #[test]
    fn test_overflow_clamps_by_sign() {
        assert_eq!(add(Decimal::MAX, Decimal::ONE), Decimal::MAX);
        assert_eq!(add(Decimal::MIN, Decimal::NEGATIVE_ONE), Decimal::MIN);
        assert_eq!(sub(Decimal::MIN, Decimal::ONE), Decimal::MIN);
        assert_eq!(sub(Decimal::MAX, Decimal::NEGATIVE_ONE), Decimal::MAX);
        assert_eq!(mul(Decimal::MAX, Decimal::TWO), Decimal::MAX);
        assert_eq!(mul(Decimal::MAX, Decimal::from(-2)), Decimal::MIN);
        assert_eq!(div(Decimal::MAX, Decimal::new(1, 3)), Decimal::MAX);
        assert_eq!(sum([Decimal::MAX, Decimal::MAX]), Decimal::MAX);
        assert!(is_saturated(mul(Decimal::MIN, Decimal::TEN)));
    }
}
