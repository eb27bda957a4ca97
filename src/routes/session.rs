//! Session middleware and extractor.
//!
//! The middleware decrypts the session cookie once per request and stores
//! the result in request extensions; handlers take it as a [`CurrentSession`]
//! parameter. A cookie that cannot be trusted ends the request with 400 and
//! a deletion header before any handler runs.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::services::session::{SESSION_COOKIE_NAME, Session};
use crate::state::AppState;

/// The session attached by [`session_middleware`], if any.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<Session>);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Session>().cloned()))
    }
}

/// Load the session cookie and attach it to the request.
///
/// A valid session cookie is re-issued on the way out to slide the
/// inactivity window, unless the handler already set a new one.
pub async fn session_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let session = match state.sessions.load(req.headers()) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting invalid session cookie");
            return (state.sessions.clear(), StatusCode::BAD_REQUEST).into_response();
        }
    };

    let Some(session) = session else {
        return next.run(req).await;
    };

    req.extensions_mut().insert(session.clone());
    let response = next.run(req).await;

    if sets_session_cookie(response.headers()) {
        return response;
    }
    match state.sessions.set(&session) {
        Ok(jar) => (jar, response).into_response(),
        Err(e) => {
            tracing::error!(error = %e, user_id = session.user_id, "session refresh failed");
            response
        }
    }
}

fn sets_session_cookie(headers: &HeaderMap) -> bool {
    let prefix = format!("{SESSION_COOKIE_NAME}=");
    headers
        .get_all(SET_COOKIE)
        .iter()
        .any(|value| value.to_str().is_ok_and(|v| v.starts_with(&prefix)))
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
