//! OpenAPI specification for the Bucketgate HTTP surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::auth::handlers::{LoginRequest, LoginResponse};
use crate::handlers::{ErrorResponse, FileOperationResponse, HealthResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bucketgate API",
        description = "Session-gated access to an S3-compatible bucket",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:4000", description = "Local development server")
    ),
    paths(
        crate::handlers::health_check,
        crate::auth::handlers::login_json,
        crate::handlers::upload_file,
        crate::handlers::list_files,
        crate::handlers::download_file,
        crate::handlers::delete_file,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            FileOperationResponse,
            LoginRequest,
            LoginResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Session login"),
        (name = "Files", description = "Upload, list, download and delete objects"),
    ),
    modifiers(&SessionCookieAddon)
)]
pub struct ApiDoc;

/// Documents the session cookie the object routes require.
pub struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("bucketgate.sid"))),
            );
        }
    }
}

/// Get the OpenAPI specification as JSON
pub fn get_openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

/// `GET /api/openapi.json`
pub async fn openapi_json() -> Response {
    match get_openapi_json() {
        Ok(json) => (
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            json,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize OpenAPI document");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
