use log::warn;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::checked;
use crate::error::UnderwritingError;
use crate::rounding::round2;
use crate::types::{Money, PaymentTiming, Periods, Rate};
use crate::UnderwritingResult;

const CENT: Decimal = dec!(0.01);

/// Longest annuity accepted: 100 years of monthly periods.
pub const MAX_PERIODS: Periods = 1200;

/// One row of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    /// 1-based period index
    pub period: Periods,
    pub interest: Money,
    pub principal: Money,
    /// Running capital balance after this period's principal
    pub balance: Money,
}

/// Level-payment amortization of `pv` down to the target future value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub payment: Money,
    pub periods: Vec<SchedulePeriod>,
    /// Balance outstanding at the end of the final period
    pub closing_balance: Money,
}

impl AmortizationSchedule {
    pub fn interest(&self) -> Vec<Money> {
        self.periods.iter().map(|p| p.interest).collect()
    }

    pub fn principal(&self) -> Vec<Money> {
        self.periods.iter().map(|p| p.principal).collect()
    }
}

/// Level payment (PMT) for a constant-rate annuity.
///
/// Sign convention follows cash flows: a positive `present_value` received
/// produces a negative payment.
pub fn payment(
    rate: Rate,
    num_periods: Periods,
    present_value: Money,
    future_value: Money,
    timing: PaymentTiming,
) -> UnderwritingResult<Money> {
    validate_periods(num_periods)?;

    if rate.is_zero() {
        let total = checked::add(present_value, future_value, "payment")?;
        return Ok(round2(checked::div(-total, Decimal::from(num_periods), "payment")?));
    }

    let factor = growth_factor(rate, num_periods, "payment")?;
    let annuity = annuity_factor(rate, factor, "payment")?;
    let grown_pv = checked::mul(present_value, factor, "payment")?;
    let timing_adjustment = timing_adjustment(rate, timing, "payment timing")?;

    let owed = checked::sub(-future_value, grown_pv, "payment")?;
    let pmt = checked::div(owed, timing_adjustment, "payment timing")?;
    let pmt = checked::div(pmt, annuity, "payment annuity factor")?;
    Ok(round2(pmt))
}

/// Present value (PV) of a constant-rate annuity.
pub fn present_value(
    rate: Rate,
    num_periods: Periods,
    pmt: Money,
    future_value: Money,
    timing: PaymentTiming,
) -> UnderwritingResult<Money> {
    validate_periods(num_periods)?;

    if rate.is_zero() {
        let paid = checked::mul(pmt, Decimal::from(num_periods), "present value")?;
        return Ok(round2(checked::sub(-future_value, paid, "present value")?));
    }

    let factor = growth_factor(rate, num_periods, "present value")?;
    let annuity = annuity_factor(rate, factor, "present value")?;
    let timing_adjustment = timing_adjustment(rate, timing, "present value")?;

    let adjusted = checked::mul(-pmt, timing_adjustment, "present value")?;
    let paid = checked::mul(adjusted, annuity, "present value")?;
    let owed = checked::sub(paid, future_value, "present value")?;
    let pv = checked::div(owed, factor, "present value discount factor")?;
    Ok(round2(pv))
}

/// Interest-only payment on `present_value` for one period.
pub fn interest_only_payment(rate: Rate, present_value: Money) -> UnderwritingResult<Money> {
    Ok(round2(checked::mul(-present_value, rate, "interest-only payment")?))
}

/// Split each level payment into interest and principal.
///
/// Under `Begin` timing the first payment falls before any interest accrues,
/// so period 1 is all principal.
pub fn amortization_schedule(
    rate: Rate,
    num_periods: Periods,
    present_value: Money,
    future_value: Money,
    timing: PaymentTiming,
) -> UnderwritingResult<AmortizationSchedule> {
    let pmt = payment(rate, num_periods, present_value, future_value, timing)?;
    schedule_for_payment(rate, num_periods, present_value, future_value, timing, pmt)
}

/// Amortize `present_value` with a payment fixed elsewhere, such as a quoted
/// lender payment.
///
/// The closing balance must reconcile with `future_value` within the drift
/// that cent rounding can explain. A payment that does not retire the loan
/// to `future_value` is rejected as a validation error on `pv`.
pub fn schedule_for_payment(
    rate: Rate,
    num_periods: Periods,
    present_value: Money,
    future_value: Money,
    timing: PaymentTiming,
    pmt: Money,
) -> UnderwritingResult<AmortizationSchedule> {
    validate_periods(num_periods)?;

    let mut capital = present_value;
    let mut periods = Vec::with_capacity(num_periods as usize);

    for period in 1..=num_periods {
        let (interest, principal) = if timing == PaymentTiming::Begin && period == 1 {
            (Decimal::ZERO, pmt)
        } else {
            let interest = round2(-checked::mul(capital, rate, "schedule interest")?);
            (interest, round2(checked::sub(pmt, interest, "schedule principal")?))
        };
        capital = checked::add(capital, principal, "schedule balance")?;
        periods.push(SchedulePeriod {
            period,
            interest,
            principal,
            balance: round2(capital),
        });
    }

    // A Begin payment opens the final period; the balance left after it
    // still accrues to the end of the period, where the future value falls.
    let closing_balance = match timing {
        PaymentTiming::End => round2(capital),
        PaymentTiming::Begin => {
            let accrual = checked::add(Decimal::ONE, rate, "schedule closing balance")?;
            round2(checked::mul(capital, accrual, "schedule closing balance")?)
        }
    };

    let tolerance = rounding_tolerance(rate, num_periods, timing)?;
    reconcile(closing_balance, future_value, tolerance)?;

    Ok(AmortizationSchedule {
        payment: pmt,
        periods,
        closing_balance,
    })
}

/// Principal portion of every payment.
pub fn principal_payments(
    rate: Rate,
    num_periods: Periods,
    present_value: Money,
    future_value: Money,
    timing: PaymentTiming,
) -> UnderwritingResult<Vec<Money>> {
    amortization_schedule(rate, num_periods, present_value, future_value, timing)
        .map(|s| s.principal())
}

/// Interest portion of every payment.
pub fn interest_payments(
    rate: Rate,
    num_periods: Periods,
    present_value: Money,
    future_value: Money,
    timing: PaymentTiming,
) -> UnderwritingResult<Vec<Money>> {
    amortization_schedule(rate, num_periods, present_value, future_value, timing)
        .map(|s| s.interest())
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_periods(num_periods: Periods) -> UnderwritingResult<()> {
    if num_periods == 0 {
        return Err(UnderwritingError::validation(
            "num_periods",
            num_periods,
            "The value must be greater than 0",
        ));
    }
    if num_periods > MAX_PERIODS {
        return Err(UnderwritingError::validation(
            "num_periods",
            num_periods,
            format!("The value cannot exceed {MAX_PERIODS}"),
        ));
    }
    Ok(())
}

/// (1 + rate)^n
fn growth_factor(rate: Rate, num_periods: Periods, context: &str) -> UnderwritingResult<Decimal> {
    checked::add(Decimal::ONE, rate, context)?
        .checked_powi(i64::from(num_periods))
        .ok_or_else(|| UnderwritingError::numeric(format!("{context} growth factor")))
}

/// ((1 + rate)^n - 1) / rate
fn annuity_factor(rate: Rate, factor: Decimal, context: &str) -> UnderwritingResult<Decimal> {
    checked::div(checked::sub(factor, Decimal::ONE, context)?, rate, context)
}

/// 1 + rate under `Begin` timing, 1 under `End`.
fn timing_adjustment(rate: Rate, timing: PaymentTiming, context: &str) -> UnderwritingResult<Decimal> {
    checked::add(Decimal::ONE, rate * timing.factor(), context)
}

/// Largest closing-balance gap that per-period cent rounding can produce.
///
/// The rounded payment is off by up to half a cent every period, and so is
/// each rounded interest charge; both errors compound with the balance. The
/// bound therefore never rejects a schedule walked at the payment
/// [`payment`] computes, only one walked at a payment that does not fit.
fn rounding_tolerance(
    rate: Rate,
    num_periods: Periods,
    timing: PaymentTiming,
) -> UnderwritingResult<Decimal> {
    let compounded = if rate.is_zero() {
        Decimal::from(num_periods)
    } else {
        let factor = growth_factor(rate, num_periods, "rounding tolerance")?;
        annuity_factor(rate, factor, "rounding tolerance")?.abs()
    };
    let adjustment = timing_adjustment(rate, timing, "rounding tolerance")?.abs();
    let compounded = checked::mul(compounded, adjustment, "rounding tolerance")?;
    Ok(checked::mul(CENT, compounded, "rounding tolerance")? + CENT)
}

/// The outstanding balance must offset the future value cash flow.
fn reconcile(closing_balance: Money, future_value: Money, tolerance: Decimal) -> UnderwritingResult<()> {
    let gap = checked::add(closing_balance, future_value, "schedule reconciliation")?.abs();
    if gap > tolerance {
        warn!(
            "Schedule does not reconcile: closing balance {closing_balance}, future value {future_value}, gap {gap}"
        );
        return Err(UnderwritingError::validation(
            "pv",
            closing_balance,
            format!(
                "Closing balance does not match the future value {future_value} at the end of the periods"
            ),
        ));
    }
    Ok(())
}
