use clap::Args;
use serde_json::Value;

use underwriting_core::real_assets::investment::{self, InvestmentAnalysisInput};

use crate::input;

/// Arguments for a leveraged investment projection
#[derive(Args)]
pub struct InvestmentArgs {
    /// Path to JSON/YAML file with `deal`, `tax`, `sale` and `loan` sections
    #[arg(long)]
    pub input: Option<String>,

    /// Print only the yearly projection instead of the full envelope
    #[arg(long)]
    pub projection_only: bool,
}

pub fn run_investment(args: InvestmentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis_input: InvestmentAnalysisInput =
        input::load(args.input.as_deref(), "investment analysis")?;
    let output = investment::analyze_investment(&analysis_input)?;

    if args.projection_only {
        return Ok(serde_json::to_value(&output.result.net_cash_flow_projection)?);
    }
    Ok(serde_json::to_value(output)?)
}
