//! Rounding applied at every computation boundary.
//!
//! Amounts are rounded as soon as they are produced, not at output time:
//! schedule reconciliation and the projection both compare already-rounded
//! figures. Midpoints round away from zero (-0.375 becomes -0.38).

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a monetary amount to cents.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a ratio to four decimal places.
pub fn round4(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}
