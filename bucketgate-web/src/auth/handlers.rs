//! Login, logout and the login page

use super::{removal_cookie, session_cookie, session_token, OptionalUser};
use crate::templates::{HtmlTemplate, LoginTemplate};
use crate::AppState;
use axum::{
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use bucketgate_core::Session;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;
use utoipa::ToSchema;

/// Login credentials, posted either as a form or as JSON.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[schema(example = "admin")]
    pub username: String,
    #[serde(default)]
    #[schema(example = "secret")]
    pub password: String,
    /// Keep the session for the configured number of days
    #[serde(default, deserialize_with = "truthy")]
    #[schema(value_type = bool, example = true)]
    pub remember: bool,
}

/// JSON login outcome
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Invalid credentials")]
    pub error: Option<String>,
}

/// Accept `true`, `"on"`, `"1"` and friends; checkboxes post `on` and are
/// absent when unchecked.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(flag) => flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "false" | "0" | "off" | "no"
        ),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Login body read as JSON when the request says so, as a form otherwise.
///
/// A body that cannot be read yields empty credentials, so the login fails
/// with the usual "Invalid credentials" response instead of a bare 4xx.
#[derive(Debug)]
pub struct LoginBody(pub LoginRequest);

impl<S> FromRequest<S> for LoginBody
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| {
                let mime = content_type.split(';').next().unwrap_or_default().trim();
                mime == "application/json" || mime.ends_with("+json")
            });

        let parsed = if is_json {
            Json::<LoginRequest>::from_request(req, state)
                .await
                .map(|Json(request)| request)
                .map_err(|rejection| rejection.body_text())
        } else {
            Form::<LoginRequest>::from_request(req, state)
                .await
                .map(|Form(request)| request)
                .map_err(|rejection| rejection.body_text())
        };

        Ok(LoginBody(parsed.unwrap_or_else(|reason| {
            debug!(%reason, "Unreadable login body");
            LoginRequest::default()
        })))
    }
}

/// Log in and swap the caller's cookie for the new session. Any session the
/// request already carried is revoked.
async fn open_session(
    state: &AppState,
    jar: CookieJar,
    request: &LoginRequest,
) -> Result<CookieJar, bucketgate_core::AuthError> {
    let session: Session = state
        .auth
        .login(&request.username, &request.password, request.remember)
        .await?;

    let previous = session_token(&jar, &state.config.session);
    if previous.is_some() {
        debug!("Revoking session presented at login");
        state.auth.logout(previous.as_deref()).await;
    }

    Ok(jar.add(session_cookie(
        &session,
        &state.config.session,
        state.config.server.secure_cookies,
    )))
}

/// Login page; already logged-in callers go straight to the app.
pub async fn login_page(OptionalUser(user): OptionalUser) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    HtmlTemplate(LoginTemplate::new(None)).into_response()
}

/// HTML form login
pub async fn do_login(
    State(state): State<AppState>,
    jar: CookieJar,
    LoginBody(request): LoginBody,
) -> Response {
    match open_session(&state, jar, &request).await {
        Ok(jar) => (jar, Redirect::to("/")).into_response(),
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            HtmlTemplate(LoginTemplate::new(Some(e.to_string()))),
        )
            .into_response(),
    }
}

/// JSON login; form-encoded bodies are accepted too
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body(content = LoginRequest, description = "JSON or application/x-www-form-urlencoded credentials"),
    responses(
        (status = 200, description = "Logged in, session cookie set", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = LoginResponse)
    )
)]
pub async fn login_json(
    State(state): State<AppState>,
    jar: CookieJar,
    LoginBody(request): LoginBody,
) -> Response {
    match open_session(&state, jar, &request).await {
        Ok(jar) => (
            jar,
            Json(LoginResponse {
                success: true,
                error: None,
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            Json(LoginResponse {
                success: false,
                error: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}

/// Destroy the session and clear the cookie. Safe to call repeatedly.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let token = session_token(&jar, &state.config.session);
    state.auth.logout(token.as_deref()).await;

    (
        jar.remove(removal_cookie(&state.config.session)),
        Redirect::to("/login"),
    )
}
