use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use underwriting_core::time_value;
use underwriting_core::types::{Money, PaymentTiming, Periods, Rate};

/// Annuity terms shared by the formula commands
#[derive(Args)]
pub struct AnnuityArgs {
    /// Interest rate per period
    #[arg(long)]
    pub rate: Rate,

    /// Number of periods
    #[arg(long)]
    pub periods: Periods,

    /// Future value to reach after the last period
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub fv: Money,

    /// Payment timing: 0 = end of period, 1 = beginning
    #[arg(long, default_value = "0", value_parser = parse_timing)]
    pub timing: PaymentTiming,
}

/// Arguments for the level payment (PMT)
#[derive(Args)]
pub struct PaymentArgs {
    #[command(flatten)]
    pub annuity: AnnuityArgs,

    /// Present value (loan amount received is positive)
    #[arg(long, allow_hyphen_values = true)]
    pub pv: Money,
}

/// Arguments for present value (PV)
#[derive(Args)]
pub struct PresentValueArgs {
    #[command(flatten)]
    pub annuity: AnnuityArgs,

    /// Level payment per period (paid out is negative)
    #[arg(long, allow_hyphen_values = true)]
    pub pmt: Money,
}

/// Arguments for a full amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub annuity: AnnuityArgs,

    /// Present value (loan amount received is positive)
    #[arg(long, allow_hyphen_values = true)]
    pub pv: Money,
}

#[derive(Debug, Serialize)]
struct PaymentOutput {
    payment: Money,
    rate: Rate,
    num_periods: Periods,
    present_value: Money,
    future_value: Money,
    payment_type: i64,
}

#[derive(Debug, Serialize)]
struct PresentValueOutput {
    present_value: Money,
    rate: Rate,
    num_periods: Periods,
    payment: Money,
    future_value: Money,
    payment_type: i64,
}

fn parse_timing(raw: &str) -> Result<PaymentTiming, String> {
    let code: i64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not an integer timing code"))?;
    PaymentTiming::try_from(code).map_err(|e| e.to_string())
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let a = &args.annuity;
    let payment = time_value::payment(a.rate, a.periods, args.pv, a.fv, a.timing)?;
    let output = PaymentOutput {
        payment,
        rate: a.rate,
        num_periods: a.periods,
        present_value: args.pv,
        future_value: a.fv,
        payment_type: a.timing.code(),
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_present_value(args: PresentValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let a = &args.annuity;
    let present_value = time_value::present_value(a.rate, a.periods, args.pmt, a.fv, a.timing)?;
    let output = PresentValueOutput {
        present_value,
        rate: a.rate,
        num_periods: a.periods,
        payment: args.pmt,
        future_value: a.fv,
        payment_type: a.timing.code(),
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let a = &args.annuity;
    let schedule = time_value::amortization_schedule(a.rate, a.periods, args.pv, a.fv, a.timing)?;
    let total_interest: Decimal = schedule.interest().iter().sum();
    let mut value = serde_json::to_value(&schedule)?;
    if let Value::Object(ref mut map) = value {
        map.insert("total_interest".into(), serde_json::to_value(total_interest)?);
    }
    Ok(value)
}
