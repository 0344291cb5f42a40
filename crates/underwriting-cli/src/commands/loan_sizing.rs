use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use underwriting_core::real_assets::loan_sizing::{self, LoanSizingInput};
use underwriting_core::types::Periods;

use crate::input;

/// Arguments for loan sizing
#[derive(Args)]
pub struct SizeLoanArgs {
    /// Path to JSON/YAML input file (overrides the flags below)
    #[arg(long)]
    pub input: Option<String>,

    /// Maximum loan-to-value ratio (e.g. 0.70)
    #[arg(long)]
    pub max_ltv: Option<Decimal>,

    /// Minimum debt service coverage ratio (e.g. 1.25)
    #[arg(long)]
    pub min_dscr: Option<Decimal>,

    /// Amortization period in periods
    #[arg(long)]
    pub amortization: Option<Periods>,

    /// Loan term in periods
    #[arg(long)]
    pub term: Option<Periods>,

    /// Interest-only periods at the start of the term
    #[arg(long, default_value = "0")]
    pub io_period: Periods,

    /// Interest rate per period
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Appraised property value
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Net operating income per period
    #[arg(long)]
    pub noi: Option<Decimal>,

    /// Requested loan amount
    #[arg(long)]
    pub requested_loan_amount: Option<Decimal>,

    /// Origination fee as a fraction of the loan
    #[arg(long, default_value = "0")]
    pub loan_origination_fees: Decimal,
}

impl SizeLoanArgs {
    fn has_flags(&self) -> bool {
        self.property_value.is_some() || self.noi.is_some() || self.rate.is_some()
    }

    fn to_input(&self) -> Result<LoanSizingInput, Box<dyn std::error::Error>> {
        Ok(LoanSizingInput {
            max_ltv: required(self.max_ltv, "max-ltv")?,
            min_dscr: required(self.min_dscr, "min-dscr")?,
            amortization: required(self.amortization, "amortization")?,
            term: required(self.term, "term")?,
            io_period: self.io_period,
            rate: required(self.rate, "rate")?,
            property_value: required(self.property_value, "property-value")?,
            noi: required(self.noi, "noi")?,
            requested_loan_amount: required(self.requested_loan_amount, "requested-loan-amount")?,
            loan_origination_fees: self.loan_origination_fees,
        })
    }
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T, Box<dyn std::error::Error>> {
    value.ok_or_else(|| format!("--{flag} is required when sizing from flags").into())
}

pub fn run_size_loan(args: SizeLoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanSizingInput = if args.input.is_none() && args.has_flags() {
        args.to_input()?
    } else {
        input::load(args.input.as_deref(), "loan sizing")?
    };
    let result = loan_sizing::size_loan(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rust_decimal_macros::dec;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: SizeLoanArgs,
    }

    #[test]
    fn test_size_loan_from_flags() {
        let harness = Harness::parse_from([
            "uw",
            "--max-ltv", "0.70",
            "--min-dscr", "1.25",
            "--amortization", "30",
            "--term", "10",
            "--io-period", "2",
            "--rate", "0.045",
            "--property-value", "6500000",
            "--noi", "387500",
            "--requested-loan-amount", "5000000",
            "--loan-origination-fees", "0.01",
        ]);
        let value = run_size_loan(harness.args).unwrap();
        let amount: Decimal = value["result"]["maximum_loan_amount"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(amount, dec!(4_550_000));
        assert_eq!(value["result"]["binding_constraint"], "LoanToValue");
    }

    #[test]
    fn test_size_loan_missing_flag() {
        let harness = Harness::parse_from(["uw", "--noi", "387500"]);
        let err = harness.args.to_input().unwrap_err();
        assert!(err.to_string().contains("--max-ltv"));
        assert_eq!(harness.args.loan_origination_fees, dec!(0));
    }
}
