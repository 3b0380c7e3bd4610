//! Error types for the tutoring server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::clients::ClientError;
use crate::models::ErrorResponse;

// == Tutor Error Enum ==
/// Unified error type for the tutoring server.
#[derive(Error, Debug)]
pub enum TutorError {
    /// Malformed request body (missing or empty required field)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Retrieval or generation service unreachable, timed out, or malformed
    #[error("Upstream service failure: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ClientError> for TutorError {
    fn from(err: ClientError) -> Self {
        TutorError::Upstream(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for TutorError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            TutorError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // Upstream detail is logged but never leaked to the caller
            TutorError::Upstream(msg) => {
                error!("upstream failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "The answering service is temporarily unavailable. Please try again shortly."
                        .to_string(),
                )
            }
            TutorError::Internal(msg) => {
                error!("internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the tutoring server.
pub type Result<T> = std::result::Result<T, TutorError>;
