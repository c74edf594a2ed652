use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use feed_store::StoreError;
use feed_types::api::ErrorResponse;

use crate::verifier::VerifyError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

// Verification causes are logged by the verifier and never reach the client.
impl From<VerifyError> for ApiError {
    fn from(_: VerifyError) -> Self {
        ApiError::Unauthorized
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthorized => return StatusCode::UNAUTHORIZED.into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_UNAVAILABLE",
                "post storage is unavailable".to_string(),
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        (status, Json(ErrorResponse { error: message, code })).into_response()
    }
}
