//! Template system for server-side rendering
//!
//! The login page and the main page, rendered with Askama.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

/// Login page template
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub title: String,
    /// Notice shown above the form after a failed login
    pub error: Option<String>,
}

/// Main page template
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub version: String,
    pub username: String,
}

impl LoginTemplate {
    pub fn new(error: Option<String>) -> Self {
        Self {
            title: "Bucketgate - Sign in".to_string(),
            error,
        }
    }
}

impl IndexTemplate {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            title: "Bucketgate - Files".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            username: username.into(),
        }
    }
}

/// Renders a template into an HTML response, 500 if rendering fails.
pub struct HtmlTemplate<T>(pub T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!(error = %e, "Failed to render template");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
            }
        }
    }
}
