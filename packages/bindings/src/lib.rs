use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use underwriting_core::real_assets::{investment, loan_sizing};
use underwriting_core::time_value;
use underwriting_core::types::{Money, PaymentTiming, Periods, Rate};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Loan sizing
// ---------------------------------------------------------------------------

#[napi]
pub fn size_loan(input_json: String) -> NapiResult<String> {
    let input: loan_sizing::LoanSizingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_sizing::size_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Investment analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_investment(input_json: String) -> NapiResult<String> {
    let input: investment::InvestmentAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = investment::analyze_investment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Annuity formulas
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ScheduleRequest {
    rate: Rate,
    num_periods: Periods,
    present_value: Money,
    #[serde(default)]
    future_value: Money,
    /// 0 = end of period, 1 = beginning
    #[serde(default)]
    payment_type: i64,
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let req: ScheduleRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let timing = PaymentTiming::try_from(req.payment_type).map_err(to_napi_error)?;
    let schedule = time_value::amortization_schedule(
        req.rate,
        req.num_periods,
        req.present_value,
        req.future_value,
        timing,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&schedule).map_err(to_napi_error)
}
