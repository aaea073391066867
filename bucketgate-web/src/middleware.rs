//! Access gate middleware
//!
//! Resolves the session cookie, asks [`bucketgate_core::AccessGate`] what to
//! do with the request and attaches [`CurrentUser`] when the caller is logged
//! in.

use crate::auth::{session_token, CurrentUser, NotAuthenticated};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header::ACCEPT,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use bucketgate_core::{GateDecision, ResponseFormat};
use tracing::debug;

pub async fn access_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = session_token(&jar, &state.config.session);
    let session = state.auth.session(token.as_deref()).await;

    let format = ResponseFormat::from_accept(
        request
            .headers()
            .get(ACCEPT)
            .and_then(|value| value.to_str().ok()),
    );

    let path = request.uri().path().to_owned();
    match state.gate.classify(&path, session.is_some(), format) {
        GateDecision::Allow => {
            if let Some(session) = &session {
                request.extensions_mut().insert(CurrentUser::from(session));
            }
            next.run(request).await
        }
        GateDecision::RedirectLogin => {
            debug!(%path, "Unauthenticated request redirected to login");
            Redirect::to("/login").into_response()
        }
        GateDecision::Unauthorized => {
            debug!(%path, "Unauthenticated JSON request rejected");
            NotAuthenticated.into_response()
        }
    }
}
