//! Auth routes: Google sign-in, who-am-i and logout.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use super::session::CurrentSession;
use crate::services::auth::{AuthError, AuthService};
use crate::services::identity::IdentityError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NameResponse {
    pub name: String,
}

pub(crate) fn auth_error_to_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidBody(_)
        | AuthError::Verification(_)
        | AuthError::Claims(_)
        | AuthError::Identity(IdentityError::MissingName) => StatusCode::BAD_REQUEST,
        AuthError::Identity(IdentityError::Lookup(_) | IdentityError::Create(_)) | AuthError::Session(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
    }
}

/// Log the failure and answer with a bare status code.
fn error_response(op: &str, err: &AuthError) -> Response {
    let status = auth_error_to_status(err);
    if status.is_server_error() {
        tracing::error!(op, error = %err, "request failed");
    } else {
        tracing::warn!(op, error = %err, "request rejected");
    }
    status.into_response()
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /authGoogle`: exchange a Google ID token for a logged-in session.
pub async fn auth_google(State(state): State<AppState>, body: Bytes) -> Response {
    match state.auth.login(&body).await {
        Ok(login) => (login.cookies, Json(NameResponse { name: login.name })).into_response(),
        Err(e) => error_response("auth-google", &e),
    }
}

/// `GET /whoami`: display name of the logged-in user.
pub async fn whoami(CurrentSession(session): CurrentSession) -> Response {
    match AuthService::who_am_i(session.as_ref()) {
        Ok(name) => Json(NameResponse { name: name.to_owned() }).into_response(),
        Err(_) => (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "error": "unauthorized" }))).into_response(),
    }
}

/// `POST /logout`: re-issue the session cookie as logged out.
pub async fn logout(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> Response {
    match state.auth.logout(session) {
        Ok(Some(jar)) => (jar, "logged out").into_response(),
        Ok(None) => StatusCode::OK.into_response(),
        Err(e) => error_response("logout", &e),
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
