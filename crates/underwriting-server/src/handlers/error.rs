use log::error;
use std::fmt;
use warp::http::StatusCode;
use warp::reject::Reject;

use underwriting_core::UnderwritingError;

/// Whether a failure is the caller's fault or ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    BadRequest,
    Internal,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::BadRequest,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::Internal,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            ApiErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client. Internal detail stays in the log.
    pub fn public_message(&self) -> &str {
        match self.kind {
            ApiErrorKind::BadRequest => &self.message,
            ApiErrorKind::Internal => "Internal Server Error",
        }
    }
}

impl From<UnderwritingError> for ApiError {
    fn from(e: UnderwritingError) -> Self {
        if e.is_validation() {
            ApiError::bad_request(e.to_string())
        } else {
            error!("Underwriting computation failed: {}", e);
            ApiError::internal(e.to_string())
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err: ApiError = UnderwritingError::validation("term", 0, "Term must be at least 1 period").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.public_message().contains("term"));
    }

    #[test]
    fn test_numeric_fault_is_hidden() {
        let err: ApiError = UnderwritingError::numeric("growth factor").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal Server Error");
        assert!(err.message.contains("growth factor"));
    }
}
