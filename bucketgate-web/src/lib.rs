//! Bucketgate Web Server
//!
//! HTTP surface of the gateway: login flow, access gate middleware and the
//! object routes backed by [`bucketgate_core::ObjectGateway`].

pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;
pub mod templates;

// Re-export main types
pub use server::{GatewayServer, GatewayServerBuilder};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use bucketgate_core::GatewayError;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);
    let body_limit = state.config.server.max_upload_bytes();

    Router::new()
        // Login flow and pages
        .merge(routes::auth_routes())
        .merge(routes::page_routes())
        // Object operations
        .merge(routes::object_routes())
        // Health and OpenAPI
        .nest("/api", routes::api_routes())
        // Static files
        .merge(routes::static_routes(&state.config.server.static_dir))
        // Every request, static and fallback included, passes the gate
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::access_gate,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Permissive CORS unless explicit origins are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([ACCEPT, CONTENT_TYPE])
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Storage setup failed: {0}")]
    Storage(#[from] bucketgate_core::StorageError),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;
