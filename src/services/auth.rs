//! Login, who-am-i and logout.
//!
//! Login runs verify → decode claims → resolve identity → issue session and
//! stops at the first failure. The caller maps [`AuthError`] to a status code;
//! nothing in here knows about HTTP beyond the cookie jars it hands back.

use std::sync::Arc;

use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;

use super::claims::{self, ClaimError};
use super::identity::{IdentityError, IdentityResolver};
use super::session::{Session, SessionError, SessionManager};
use super::users::UserStore;
use super::verifier::{TokenVerifier, VerifyError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    id_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid login request body: {0}")]
    InvalidBody(#[source] serde_json::Error),
    #[error("id token verification failed: {0}")]
    Verification(#[from] VerifyError),
    #[error("id token claims rejected: {0}")]
    Claims(#[from] ClaimError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("failed to set session: {0}")]
    Session(#[from] SessionError),
    #[error("not logged in")]
    Unauthorized,
}

/// Result of a successful login.
pub struct Login {
    /// Display name of the resolved user.
    pub name: String,
    /// Jar carrying the new session cookie.
    pub cookies: PrivateCookieJar,
}

pub struct AuthService {
    audience: String,
    verifier: Arc<dyn TokenVerifier>,
    identities: IdentityResolver,
    sessions: Arc<dyn SessionManager>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        audience: String,
        verifier: Arc<dyn TokenVerifier>,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionManager>,
    ) -> Self {
        Self { audience, verifier, identities: IdentityResolver::new(users), sessions }
    }

    /// Exchange a `{"idToken": ...}` body for a logged-in session.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] of the first step that fails.
    pub async fn login(&self, body: &[u8]) -> Result<Login, AuthError> {
        let request: LoginRequest = serde_json::from_slice(body).map_err(AuthError::InvalidBody)?;

        self.verifier.verify(&request.id_token, &self.audience).await?;

        let claims = claims::decode_claims(&request.id_token)?;
        let email = claims::string_claim(&claims, "email")?;
        // Only required when the user has to be created.
        let name = claims::string_claim(&claims, "name").ok();

        let identity = self.identities.resolve(email, name).await?;

        let session = Session::logged_in(identity.user_id, identity.name.clone());
        let cookies = self.sessions.set(&session)?;

        tracing::info!(user_id = identity.user_id, "user logged in");
        Ok(Login { name: identity.name, cookies })
    }

    /// Display name of the logged-in user.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthorized`] without a logged-in session.
    pub fn who_am_i(session: Option<&Session>) -> Result<&str, AuthError> {
        match session {
            Some(session) if session.is_logged_in => Ok(&session.name),
            _ => Err(AuthError::Unauthorized),
        }
    }

    /// Clear the logged-in flag and re-issue the cookie.
    ///
    /// Returns `Ok(None)` when there was nothing to log out.
    ///
    /// # Errors
    ///
    /// [`AuthError::Session`] if the logged-out cookie cannot be written.
    pub fn logout(&self, session: Option<Session>) -> Result<Option<PrivateCookieJar>, AuthError> {
        let Some(mut session) = session.filter(|s| s.is_logged_in) else {
            return Ok(None);
        };

        session.is_logged_in = false;
        let cookies = self.sessions.set(&session)?;
        tracing::info!(user_id = session.user_id, "user logged out");
        Ok(Some(cookies))
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
