use chrono::{DateTime, Utc};
use serde::Serialize;
use std::convert::Infallible;
use warp::reply::Json;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}

pub async fn get_health() -> Result<Json, Infallible> {
    Ok(warp::reply::json(&HealthStatus {
        status: "ok",
        now: Utc::now(),
    }))
}
