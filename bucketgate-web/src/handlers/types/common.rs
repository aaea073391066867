//! Common types used across multiple handlers

use serde::Serialize;
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Content store backend in use
    #[schema(example = "s3")]
    pub backend: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error body returned by every failing JSON endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "File not found")]
    pub error: String,
}
