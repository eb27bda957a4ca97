//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the auth logic and storage concerns so route handlers
//! can stay focused on protocol translation. `claims` and `verifier` judge
//! the ID token and `identity` maps it to a `users` row. `auth` composes
//! them with `session`, which seals the result into a cookie.

pub mod auth;
pub mod claims;
pub mod identity;
pub mod session;
pub mod users;
pub mod verifier;
