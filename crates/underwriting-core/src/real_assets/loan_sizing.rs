use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::checked;
use crate::error::UnderwritingError;
use crate::rounding::round2;
use crate::time_value::{
    amortization_schedule, interest_only_payment, payment, present_value, MAX_PERIODS,
};
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, PaymentTiming, Periods, Rate};
use crate::UnderwritingResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Underwriting terms for sizing a loan against an income-producing property.
///
/// Periods and the rate share one unit (years with an annual rate, or months
/// with a monthly rate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSizingInput {
    /// Maximum loan-to-value ratio (e.g. 0.70 = 70%)
    pub max_ltv: Rate,
    /// Minimum debt service coverage ratio (NOI / debt service)
    pub min_dscr: Multiple,
    /// Amortization period in periods
    pub amortization: Periods,
    /// Loan term in periods; the balloon falls due at its end
    pub term: Periods,
    /// Interest-only periods at the start of the term
    pub io_period: Periods,
    /// Interest rate per period
    pub rate: Rate,
    /// Appraised property value
    pub property_value: Money,
    /// Net operating income per period
    pub noi: Money,
    /// Amount the borrower asked for
    pub requested_loan_amount: Money,
    /// Origination fee as a fraction of the loan amount
    pub loan_origination_fees: Rate,
}

/// The limit that determined the loan amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanConstraint {
    LoanToValue,
    DebtServiceCoverage,
    RequestedAmount,
}

impl LoanConstraint {
    pub fn label(&self) -> &'static str {
        match self {
            LoanConstraint::LoanToValue => "max LTV",
            LoanConstraint::DebtServiceCoverage => "min DSCR",
            LoanConstraint::RequestedAmount => "requested amount",
        }
    }
}

/// A loan sized from a [`LoanSizingInput`].
///
/// Only [`resolve`] builds one, and nothing mutates it afterwards: the
/// amounts, the amortization schedule and the terms always belong together.
/// Changed terms mean a new resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizedLoan {
    #[serde(flatten)]
    terms: LoanSizingInput,
    ltv_loan_amount: Money,
    dscr_loan_amount: Money,
    binding_constraint: LoanConstraint,
    maximum_loan_amount: Money,
    #[serde(rename = "yearly_loan_payment")]
    loan_payment: Money,
    #[serde(rename = "yearly_io_loan_payment")]
    io_loan_payment: Money,
    balloon_payment: Money,
    #[serde(skip)]
    amortizing_principal: Vec<Money>,
    #[serde(skip)]
    amortizing_interest: Vec<Money>,
}

/// Period-aligned debt service split, one entry per period of the term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDistribution {
    pub principal: Vec<Money>,
    pub interest: Vec<Money>,
}

impl SizedLoan {
    pub fn terms(&self) -> &LoanSizingInput {
        &self.terms
    }

    /// Ceiling implied by the maximum loan-to-value ratio.
    pub fn ltv_loan_amount(&self) -> Money {
        self.ltv_loan_amount
    }

    /// Ceiling whose payment consumes exactly NOI / min DSCR.
    pub fn dscr_loan_amount(&self) -> Money {
        self.dscr_loan_amount
    }

    pub fn binding_constraint(&self) -> LoanConstraint {
        self.binding_constraint
    }

    pub fn maximum_loan_amount(&self) -> Money {
        self.maximum_loan_amount
    }

    /// Amortizing payment per period (negative: paid by the borrower).
    pub fn loan_payment(&self) -> Money {
        self.loan_payment
    }

    /// Payment per period during the interest-only periods.
    pub fn io_loan_payment(&self) -> Money {
        self.io_loan_payment
    }

    /// Balance outstanding at the end of the term.
    pub fn balloon_payment(&self) -> Money {
        self.balloon_payment
    }

    /// Principal and interest per period of the term.
    ///
    /// The interest-only periods come first: no principal, and interest equal
    /// to the constant IO payment. The amortizing schedule follows, so its
    /// first period lines up with the first period after the IO periods.
    pub fn payment_distribution(&self) -> PaymentDistribution {
        let io = self.terms.io_period as usize;
        let term = self.terms.term as usize;

        let principal = std::iter::repeat(Decimal::ZERO)
            .take(io)
            .chain(self.amortizing_principal.iter().copied())
            .take(term)
            .collect();
        let interest = std::iter::repeat(self.io_loan_payment)
            .take(io)
            .chain(self.amortizing_interest.iter().copied())
            .take(term)
            .collect();

        PaymentDistribution {
            principal,
            interest,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Size the loan at the most restrictive of the LTV, DSCR and requested
/// amount limits, then derive its payments and balloon.
pub fn resolve(input: &LoanSizingInput) -> UnderwritingResult<SizedLoan> {
    validate_input(input)?;

    // -- Ceilings ------------------------------------------------------------
    let ltv_loan_amount = checked::mul(input.max_ltv, input.property_value, "LTV ceiling")?.floor();
    let dscr_loan_amount = dscr_ceiling(input)?;

    let candidates = [
        (LoanConstraint::LoanToValue, ltv_loan_amount),
        (LoanConstraint::DebtServiceCoverage, dscr_loan_amount),
        (LoanConstraint::RequestedAmount, input.requested_loan_amount),
    ];
    let (binding_constraint, maximum_loan_amount) = candidates[1..]
        .iter()
        .fold(candidates[0], |best, c| if c.1 < best.1 { *c } else { best });

    debug!(
        "Loan ceilings: ltv {ltv_loan_amount}, dscr {dscr_loan_amount}, requested {}; binding {:?}",
        input.requested_loan_amount, binding_constraint
    );

    // -- Payments ------------------------------------------------------------
    let loan_payment = payment(
        input.rate,
        input.amortization,
        maximum_loan_amount,
        Decimal::ZERO,
        PaymentTiming::End,
    )?;
    let io_loan_payment = interest_only_payment(input.rate, maximum_loan_amount)?;

    // -- Balloon -------------------------------------------------------------
    let schedule = amortization_schedule(
        input.rate,
        input.amortization,
        maximum_loan_amount,
        Decimal::ZERO,
        PaymentTiming::End,
    )?;

    let mut sized = SizedLoan {
        terms: input.clone(),
        ltv_loan_amount,
        dscr_loan_amount,
        binding_constraint,
        maximum_loan_amount,
        loan_payment,
        io_loan_payment,
        balloon_payment: Decimal::ZERO,
        amortizing_principal: schedule.principal(),
        amortizing_interest: schedule.interest(),
    };

    let repaid = checked::sum(sized.payment_distribution().principal, "balloon")?;
    sized.balloon_payment = round2(checked::add(maximum_loan_amount, repaid, "balloon")?);

    Ok(sized)
}

/// Resolve the loan and wrap it with warnings and computation metadata.
pub fn size_loan(input: &LoanSizingInput) -> UnderwritingResult<ComputationOutput<SizedLoan>> {
    let start = Instant::now();

    let sized = resolve(input)?;
    let warnings = sizing_warnings(&sized);

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Loan Sizing (binding minimum of LTV, DSCR and requested amount)",
        input,
        warnings,
        elapsed,
        sized,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Loan whose level payment over the amortization consumes NOI / min DSCR.
fn dscr_ceiling(input: &LoanSizingInput) -> UnderwritingResult<Money> {
    let max_debt_service = checked::div(-input.noi, input.min_dscr, "DSCR ceiling")?;
    let amount = present_value(
        input.rate,
        input.amortization,
        max_debt_service,
        Decimal::ZERO,
        PaymentTiming::End,
    )?;
    Ok(amount.floor())
}

fn validate_input(input: &LoanSizingInput) -> UnderwritingResult<()> {
    if input.amortization == 0 {
        return Err(UnderwritingError::validation(
            "amortization",
            input.amortization,
            "Amortization must be at least 1 period",
        ));
    }

    if input.amortization > MAX_PERIODS {
        return Err(UnderwritingError::validation(
            "amortization",
            input.amortization,
            format!("Amortization cannot exceed {MAX_PERIODS} periods"),
        ));
    }

    if input.term == 0 {
        return Err(UnderwritingError::validation(
            "term",
            input.term,
            "Term must be at least 1 period",
        ));
    }

    if input.term > MAX_PERIODS {
        return Err(UnderwritingError::validation(
            "term",
            input.term,
            format!("Term cannot exceed {MAX_PERIODS} periods"),
        ));
    }

    if input.term > input.amortization {
        return Err(UnderwritingError::validation(
            "term",
            input.term,
            format!(
                "Term cannot exceed the amortization period ({})",
                input.amortization
            ),
        ));
    }

    if input.io_period > input.term {
        return Err(UnderwritingError::validation(
            "io_period",
            input.io_period,
            format!("Interest-only periods cannot exceed the term ({})", input.term),
        ));
    }

    if input.min_dscr <= Decimal::ZERO {
        return Err(UnderwritingError::validation(
            "min_dscr",
            input.min_dscr,
            "Minimum DSCR must be positive",
        ));
    }

    if input.max_ltv < Decimal::ZERO || input.max_ltv > Decimal::ONE {
        return Err(UnderwritingError::validation(
            "max_ltv",
            input.max_ltv,
            "Maximum LTV must be between 0 and 1",
        ));
    }

    if input.loan_origination_fees < Decimal::ZERO || input.loan_origination_fees >= Decimal::ONE {
        return Err(UnderwritingError::validation(
            "loan_origination_fees",
            input.loan_origination_fees,
            "Origination fees must be between 0 and 1 (exclusive upper)",
        ));
    }

    for (field, value) in [
        ("property_value", input.property_value),
        ("noi", input.noi),
        ("requested_loan_amount", input.requested_loan_amount),
    ] {
        if value < Decimal::ZERO {
            return Err(UnderwritingError::validation(
                field,
                value,
                "The value cannot be negative",
            ));
        }
    }

    Ok(())
}

fn sizing_warnings(sized: &SizedLoan) -> Vec<String> {
    let mut warnings = Vec::new();
    let terms = sized.terms();

    if terms.requested_loan_amount > sized.maximum_loan_amount {
        warnings.push(format!(
            "Requested amount {} exceeds the {} ceiling; loan sized down to {}",
            terms.requested_loan_amount,
            sized.binding_constraint.label(),
            sized.maximum_loan_amount
        ));
    }

    if terms.max_ltv > dec!(0.80) {
        warnings.push(format!(
            "Maximum LTV {} exceeds 80%, above typical commercial lending norms",
            terms.max_ltv
        ));
    }

    if terms.min_dscr < dec!(1.20) {
        warnings.push(format!(
            "Minimum DSCR {}x is below 1.20x, thin coverage for commercial debt",
            terms.min_dscr
        ));
    }

    if terms.io_period == terms.term && !sized.maximum_loan_amount.is_zero() {
        warnings.push(format!(
            "Loan is interest-only for the full term; balloon of {} equals the loan amount",
            sized.balloon_payment
        ));
    }

    warnings
}
