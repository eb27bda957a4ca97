//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Collaborators are held as trait objects so tests can swap the token
//! verifier, user store and session manager for in-memory doubles.

use std::sync::Arc;

use crate::services::auth::AuthService;
use crate::services::session::SessionManager;
use crate::services::users::UserStore;
use crate::services::verifier::TokenVerifier;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    /// Also used directly by the session middleware.
    pub sessions: Arc<dyn SessionManager>,
}

impl AppState {
    #[must_use]
    pub fn new(
        audience: String,
        verifier: Arc<dyn TokenVerifier>,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionManager>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(audience, verifier, users, sessions.clone()));
        Self { auth, sessions }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
