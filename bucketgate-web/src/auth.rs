//! Session cookies and the authenticated-caller extractor

pub mod handlers;


use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use bucketgate_core::{Session, SessionConfig};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

/// The caller behind a live session, attached to the request by the access
/// gate middleware.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub username: String,
    #[serde(skip)]
    pub session_id: String,
}

impl From<&Session> for CurrentUser {
    fn from(session: &Session) -> Self {
        Self {
            username: session.username.clone(),
            session_id: session.id.clone(),
        }
    }
}

/// Rejection when a handler needs a user but the request carries none.
#[derive(Debug)]
pub struct NotAuthenticated;

impl IntoResponse for NotAuthenticated {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = NotAuthenticated;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(NotAuthenticated)
    }
}

/// Optional user extractor - doesn't fail if user is not authenticated
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(parts.extensions.get::<CurrentUser>().cloned()))
    }
}

/// Session token carried by the request, if any.
pub fn session_token(jar: &CookieJar, config: &SessionConfig) -> Option<String> {
    jar.get(&config.cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Cookie handing `session` to the browser: HttpOnly, SameSite=Lax, and a
/// `Max-Age` only for remember-me sessions.
pub fn session_cookie(session: &Session, config: &SessionConfig, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((config.cookie_name.clone(), session.id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();

    if let Some(remaining) = session.max_age(Utc::now()) {
        cookie.set_max_age(time::Duration::seconds(remaining.num_seconds()));
    }

    cookie
}

/// Cookie that, passed to [`CookieJar::remove`], clears the session cookie.
pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), ""))
        .path("/")
        .build()
}
