//! Overflow-checked decimal arithmetic.
//!
//! `Decimal` operators panic once a result leaves the 96-bit mantissa. Every
//! computation fed by caller-supplied amounts or compounded growth goes
//! through these instead, so an out-of-range input surfaces as
//! [`UnderwritingError::Numeric`].

use rust_decimal::Decimal;

use crate::error::UnderwritingError;
use crate::UnderwritingResult;

pub(crate) fn add(a: Decimal, b: Decimal, context: &str) -> UnderwritingResult<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow(context))
}

pub(crate) fn sub(a: Decimal, b: Decimal, context: &str) -> UnderwritingResult<Decimal> {
    a.checked_sub(b).ok_or_else(|| overflow(context))
}

pub(crate) fn mul(a: Decimal, b: Decimal, context: &str) -> UnderwritingResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow(context))
}

/// Division failing on a zero divisor as well as on overflow.
pub(crate) fn div(a: Decimal, b: Decimal, context: &str) -> UnderwritingResult<Decimal> {
    if b.is_zero() {
        return Err(UnderwritingError::numeric(format!("{context} (division by zero)")));
    }
    a.checked_div(b).ok_or_else(|| overflow(context))
}

/// Sum of `values`, failing on the first overflow.
pub(crate) fn sum<I>(values: I, context: &str) -> UnderwritingResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| add(acc, v, context))
}

fn overflow(context: &str) -> UnderwritingError {
    UnderwritingError::numeric(format!("{context} (overflow)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_in_range_results() {
        assert_eq!(add(dec!(1.5), dec!(2.25), "t").unwrap(), dec!(3.75));
        assert_eq!(sub(dec!(1.5), dec!(2.25), "t").unwrap(), dec!(-0.75));
        assert_eq!(mul(dec!(1.5), dec!(2), "t").unwrap(), dec!(3.0));
        assert_eq!(div(dec!(3), dec!(2), "t").unwrap(), dec!(1.5));
        assert_eq!(sum([dec!(1), dec!(2), dec!(3)], "t").unwrap(), dec!(6));
    }

    #[test]
    fn test_overflow_is_numeric_fault() {
        let err = mul(Decimal::MAX, dec!(2), "grown revenue").unwrap_err();
        assert_eq!(err, UnderwritingError::numeric("grown revenue (overflow)"));
        assert!(add(Decimal::MAX, Decimal::MAX, "t").is_err());
        assert!(sub(Decimal::MIN, Decimal::MAX, "t").is_err());
        assert!(div(Decimal::MAX, dec!(0.5), "t").is_err());
        assert!(sum([Decimal::MAX, Decimal::ONE], "t").is_err());
    }

    #[test]
    fn test_zero_divisor_is_numeric_fault() {
        let err = div(dec!(1), Decimal::ZERO, "annuity factor").unwrap_err();
        assert!(err.to_string().contains("division by zero"), "{err}");
    }
}
