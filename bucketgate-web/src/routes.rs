//! Route definitions for the Bucketgate web server

use crate::{auth::handlers as auth, handlers, openapi, AppState};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::path::Path;
use tower_http::services::ServeDir;

/// Login flow
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login_json))
        .route("/do-login", post(auth::do_login))
        .route("/logout", get(auth::logout))
}

/// Main application page
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index_page))
        .route("/index.html", get(handlers::index_page))
}

/// Object operations
pub fn object_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(handlers::upload_file))
        .route("/files", get(handlers::list_files))
        .route("/download/{filename}", get(handlers::download_file))
        .route("/delete/{filename}", delete(handlers::delete_file))
}

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(openapi::openapi_json))
}

/// Static files from `static_dir`, under each public asset prefix
pub fn static_routes(static_dir: &Path) -> Router<AppState> {
    Router::new()
        .nest_service("/static", ServeDir::new(static_dir))
        .nest_service("/assets", ServeDir::new(static_dir))
        .nest_service("/public", ServeDir::new(static_dir))
}
