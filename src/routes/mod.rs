//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Layers run outside-in: CORS answers preflights before anything else,
//! `TraceLayer` opens a span per request, and the session middleware
//! resolves the cookie before any handler sees the request.

pub mod auth;
pub mod session;

use axum::Router;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router. `frontend_origin` is the only origin
/// allowed to make credentialed cross-origin requests.
pub fn app(state: AppState, frontend_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(frontend_origin)
        .allow_credentials(true)
        .allow_headers([header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/authGoogle", post(auth::auth_google))
        .route("/whoami", get(auth::whoami))
        .route("/logout", post(auth::logout))
        .route("/healthz", get(healthz))
        .layer(from_fn_with_state(state.clone(), session::session_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
