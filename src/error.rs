//! Request-scoped error taxonomy, mapped straight to HTTP statuses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures a request can surface. All are terminal for the request and
/// short-circuit before any state mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A required field is missing or has the wrong type.
    #[error("{0}")]
    Validation(String),
    /// Unknown room key, unknown player ID, or no test running.
    #[error("{0}")]
    NotFound(String),
    /// Caller is not the host, or a test is already running.
    #[error("{0}")]
    Forbidden(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        };

        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = ApiError::Validation("No player name provided.".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError::NotFound("Room not found.".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ApiError::Forbidden("Not the host!".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
