//! Mapping of gateway failures onto HTTP responses

use super::types::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use bucketgate_core::{GatewayError, StorageError};
use tracing::{error, warn};

/// Failure of an object handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFileUploaded,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Internal(GatewayError),
}

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Validation { .. } => ApiError::NoFileUploaded,
            GatewayError::Storage(e) => ApiError::Storage(e),
            other => ApiError::Internal(other),
        }
    }
}

impl ApiError {
    /// Status code and client-facing message. Store details stay in the logs.
    pub fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NoFileUploaded => (StatusCode::BAD_REQUEST, "No file uploaded"),
            ApiError::Storage(e) => match e {
                StorageError::NotFound { .. } => (StatusCode::NOT_FOUND, "File not found"),
                StorageError::WriteFailed { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Upload failed")
                }
                StorageError::ListFailed { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list files")
                }
                StorageError::ReadFailed { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Download failed")
                }
                StorageError::DeleteFailed { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Delete failed")
                }
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        match &self {
            ApiError::NoFileUploaded => warn!("Upload request without a file"),
            ApiError::Storage(StorageError::NotFound { key }) => {
                warn!(%key, "Requested object does not exist")
            }
            ApiError::Storage(e) => error!(
                operation = e.operation(),
                error = %e,
                source = ?std::error::Error::source(e),
                "Content store operation failed"
            ),
            ApiError::Internal(e) => e.log(),
        }

        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}
