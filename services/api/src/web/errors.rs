//! services/api/src/web/errors.rs
//!
//! Maps core errors onto HTTP status codes.

use axum::http::StatusCode;
use debt_tracker_core::DebtError;
use tracing::error;

/// The `(status, message)` pair handlers return for a failed core operation.
pub fn debt_error_response(err: DebtError) -> (StatusCode, String) {
    match err {
        e if e.is_validation() => (StatusCode::BAD_REQUEST, e.to_string()),
        e @ (DebtError::AlreadyPaid | DebtError::Conflict(_)) => {
            (StatusCode::CONFLICT, e.to_string())
        }
        DebtError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden".to_string()),
        DebtError::NotFound(_) => (StatusCode::NOT_FOUND, "not found".to_string()),
        e => {
            error!("Debt operation failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}
