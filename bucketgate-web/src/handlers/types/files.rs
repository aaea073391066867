//! Object operation types

use serde::Serialize;
use utoipa::ToSchema;

/// Result of an upload or a delete
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileOperationResponse {
    #[schema(example = true)]
    pub success: bool,
    /// Object key the operation applied to
    #[schema(example = "1700000000000-report.pdf")]
    pub file_name: String,
}

impl FileOperationResponse {
    pub fn ok(file_name: impl Into<String>) -> Self {
        Self {
            success: true,
            file_name: file_name.into(),
        }
    }
}
