use log::{info, warn};
use warp::reply::Json;
use warp::Rejection;

use underwriting_core::real_assets::loan_sizing::{size_loan, LoanSizingInput};

use super::error::ApiError;

pub async fn post_loan_sizing(input: LoanSizingInput) -> Result<Json, Rejection> {
    info!("Handling loan sizing request.");

    let output = size_loan(&input).map_err(|e| warp::reject::custom(ApiError::from(e)))?;
    for w in &output.warnings {
        warn!("Loan sizing: {}", w);
    }

    info!(
        "Sized loan at {} ({} binding)",
        output.result.maximum_loan_amount(),
        output.result.binding_constraint().label()
    );
    Ok(warp::reply::json(&output.result))
}
