use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::UnderwritingError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Per-period rates expressed as decimals (0.045 = 4.5%). Never as percentages.
pub type Rate = Decimal;

/// Coverage multiples (e.g., 1.25x DSCR)
pub type Multiple = Decimal;

/// Period counts (months or years, caller-defined)
pub type Periods = u32;

/// When within each period a level payment falls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentTiming {
    /// Payment at the end of each period (ordinary annuity)
    #[default]
    End,
    /// Payment at the start of each period (annuity due)
    Begin,
}

impl PaymentTiming {
    /// Integer code used by external callers: 0 = End, 1 = Begin.
    pub fn code(self) -> i64 {
        match self {
            PaymentTiming::End => 0,
            PaymentTiming::Begin => 1,
        }
    }

    /// The `t` term of the annuity formulas.
    pub(crate) fn factor(self) -> Decimal {
        Decimal::from(self.code())
    }
}

impl TryFrom<i64> for PaymentTiming {
    type Error = UnderwritingError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(PaymentTiming::End),
            1 => Ok(PaymentTiming::Begin),
            other => Err(UnderwritingError::validation(
                "payment_type",
                other,
                "The value must be 0 (End) or 1 (Begin)",
            )),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit_round_half_away_2dp".to_string(),
        },
    }
}
