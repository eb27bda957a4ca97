//! Cookie-backed sessions.
//!
//! ARCHITECTURE
//! ============
//! There is no session table. The cookie value is the JSON-serialized
//! [`Session`] plus its issue time, sealed with AES-256-GCM through
//! `PrivateCookieJar`, so decryption doubles as the integrity check. Any
//! cookie that cannot be opened and parsed is rejected as a whole, and so is
//! one issued more than an inactivity window ago.
//!
//! TRADE-OFFS
//! ==========
//! A cookie-only session cannot be revoked by deleting a row. Writing a
//! logged-out session records its session id in an in-process list for one
//! inactivity window, and loading a logged-in cookie with a revoked id
//! downgrades it to logged out. The list is per process and is lost on
//! restart.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration as StdDuration, Instant};

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, Key, PrivateCookieJar};
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

pub const SESSION_COOKIE_NAME: &str = "_id";

/// Inactivity window: cookie max-age and the oldest issue time we accept.
pub const SESSION_MAX_AGE_SECS: i64 = 15 * 60;

// =============================================================================
// SESSION
// =============================================================================

/// Authorization state carried inside the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "userID")]
    pub user_id: i64,
    pub name: String,
    #[serde(rename = "isLoggedIn")]
    pub is_logged_in: bool,
    /// Random per-login id, used to revoke the session on logout.
    #[serde(rename = "sid")]
    pub session_id: Uuid,
}

impl Session {
    /// A freshly logged-in session with a new session id.
    #[must_use]
    pub fn logged_in(user_id: i64, name: impl Into<String>) -> Self {
        Self { user_id, name: name.into(), is_logged_in: true, session_id: Uuid::new_v4() }
    }
}

#[derive(Serialize)]
struct SealedRef<'a> {
    session: &'a Session,
    issued_at: i64,
}

#[derive(Deserialize)]
struct Sealed {
    session: Session,
    issued_at: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session cookie failed to decrypt")]
    Undecryptable,
    #[error("session cookie payload is malformed: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("session cookie expired")]
    Expired,
    #[error("failed to encode session: {0}")]
    Encode(#[source] serde_json::Error),
}

// =============================================================================
// KEYS AND CONFIG
// =============================================================================

/// Sign and encrypt keys for the session cookie. Built once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKeys {
    sign: [u8; 32],
    encrypt: [u8; 32],
}

impl SessionKeys {
    #[must_use]
    pub fn new(sign: [u8; 32], encrypt: [u8; 32]) -> Self {
        Self { sign, encrypt }
    }

    /// Random keys. Sessions issued with them do not survive a restart.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        Self { sign: rng.random(), encrypt: rng.random() }
    }

    /// Both keys feed the HKDF master, so changing either one invalidates
    /// every cookie sealed under the old pair.
    fn cookie_key(&self) -> Key {
        let mut master = [0u8; 64];
        master[..32].copy_from_slice(&self.sign);
        master[32..].copy_from_slice(&self.encrypt);
        Key::derive_from(&master)
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKeys(..)")
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub keys: SessionKeys,
    /// Set the `Secure` attribute on the cookie.
    pub secure: bool,
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

/// Reads and writes the session cookie.
pub trait SessionManager: Send + Sync {
    /// Read the session from request headers.
    ///
    /// `Ok(None)` when no session cookie was sent.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if a cookie is present but cannot be trusted.
    fn load(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError>;

    /// Seal `session` into a jar that sets the cookie when returned as a response part.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the session cannot be encoded.
    fn set(&self, session: &Session) -> Result<PrivateCookieJar, SessionError>;

    /// A jar that tells the client to drop the session cookie.
    fn clear(&self) -> CookieJar;
}

pub struct CookieSessionManager {
    key: Key,
    secure: bool,
    revoked: RevocationList,
}

impl CookieSessionManager {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            key: config.keys.cookie_key(),
            secure: config.secure,
            revoked: RevocationList::new(REVOCATION_WINDOW),
        }
    }

    fn load_at(&self, headers: &HeaderMap, now: OffsetDateTime) -> Result<Option<Session>, SessionError> {
        if CookieJar::from_headers(headers).get(SESSION_COOKIE_NAME).is_none() {
            return Ok(None);
        }

        let jar = PrivateCookieJar::from_headers(headers, self.key.clone());
        let cookie = jar
            .get(SESSION_COOKIE_NAME)
            .ok_or(SessionError::Undecryptable)?;
        let sealed: Sealed = serde_json::from_str(cookie.value()).map_err(SessionError::Malformed)?;

        if now.unix_timestamp() - sealed.issued_at > SESSION_MAX_AGE_SECS {
            return Err(SessionError::Expired);
        }

        let mut session = sealed.session;
        if session.is_logged_in && self.revoked.contains(session.session_id) {
            tracing::debug!(user_id = session.user_id, "replayed session was logged out");
            session.is_logged_in = false;
        }
        Ok(Some(session))
    }

    fn set_at(&self, session: &Session, now: OffsetDateTime) -> Result<PrivateCookieJar, SessionError> {
        let value = serde_json::to_string(&SealedRef { session, issued_at: now.unix_timestamp() })
            .map_err(SessionError::Encode)?;

        if !session.is_logged_in {
            self.revoked.revoke(session.session_id);
        }

        let cookie = Cookie::build((SESSION_COOKIE_NAME, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .max_age(Duration::seconds(SESSION_MAX_AGE_SECS));
        Ok(PrivateCookieJar::new(self.key.clone()).add(cookie))
    }
}

impl SessionManager for CookieSessionManager {
    fn load(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        self.load_at(headers, OffsetDateTime::now_utc())
    }

    fn set(&self, session: &Session) -> Result<PrivateCookieJar, SessionError> {
        self.set_at(session, OffsetDateTime::now_utc())
    }

    fn clear(&self) -> CookieJar {
        let cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .max_age(Duration::ZERO);
        CookieJar::new().add(cookie)
    }
}

// =============================================================================
// REVOCATION LIST
// =============================================================================

/// How long a logged-out session id is remembered. The expiry check still
/// accepts a cookie whose age is exactly the max age in whole seconds, so
/// entries must outlive it by at least the one second lost to flooring.
const REVOCATION_WINDOW: StdDuration = StdDuration::from_secs(SESSION_MAX_AGE_SECS.unsigned_abs() + 1);

/// Session ids logged out within the last window.
struct RevocationList {
    entries: Mutex<HashMap<Uuid, Instant>>,
    window: StdDuration,
}

impl RevocationList {
    fn new(window: StdDuration) -> Self {
        Self { entries: Mutex::new(HashMap::new()), window }
    }

    fn revoke(&self, id: Uuid) {
        self.revoke_at(id, Instant::now());
    }

    fn contains(&self, id: Uuid) -> bool {
        self.contains_at(id, Instant::now())
    }

    fn revoke_at(&self, id: Uuid, now: Instant) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        prune(&mut entries, now, self.window);
        entries.insert(id, now);
    }

    fn contains_at(&self, id: Uuid, now: Instant) -> bool {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        prune(&mut entries, now, self.window);
        entries.contains_key(&id)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

fn prune(entries: &mut HashMap<Uuid, Instant>, now: Instant, window: StdDuration) {
    entries.retain(|_, revoked_at| now.saturating_duration_since(*revoked_at) < window);
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
