use log::{info, warn};
use warp::reply::Json;
use warp::Rejection;

use underwriting_core::real_assets::investment::{analyze_investment, InvestmentAnalysisInput};

use super::error::ApiError;

pub async fn post_investment_analysis(input: InvestmentAnalysisInput) -> Result<Json, Rejection> {
    info!("Handling investment analysis request.");

    let output =
        analyze_investment(&input).map_err(|e| warp::reject::custom(ApiError::from(e)))?;
    for w in &output.warnings {
        warn!("Investment analysis: {}", w);
    }

    Ok(warp::reply::json(&output.result))
}
