//! Local user storage.
//!
//! SYSTEM CONTEXT
//! ==============
//! Login needs exactly two things from storage: find a user by email and
//! create one. Both sit behind [`UserStore`] so the identity resolver can be
//! exercised without Postgres. "No such user" is reported as
//! [`StoreError::NotFound`] and is expected on every first login; callers
//! match on it rather than treating it as a failure.

use sqlx::{PgPool, Row};

/// A row of the `local_user` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUser {
    pub id: i64,
    pub email: String,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no matching user")]
    NotFound,
    #[error("a user with that email already exists")]
    Conflict,
    #[error("database error: {0}")]
    Db(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => Self::Conflict,
            other => Self::Db(other),
        }
    }
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no user has this email.
    async fn find_by_email(&self, email: &str) -> Result<LocalUser, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::Conflict`] when the email is already taken.
    async fn create(&self, email: &str, name: &str) -> Result<LocalUser, StoreError>;
}

/// Postgres-backed [`UserStore`]. Email uniqueness is enforced by the table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<LocalUser, StoreError> {
        let row = sqlx::query("SELECT id, email, name FROM local_user WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(LocalUser { id: row.get("id"), email: row.get("email"), name: row.get("name") })
    }

    async fn create(&self, email: &str, name: &str) -> Result<LocalUser, StoreError> {
        let row = sqlx::query("INSERT INTO local_user (email, name) VALUES ($1, $2) RETURNING id")
            .bind(email)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(LocalUser { id: row.get("id"), email: email.to_owned(), name: name.to_owned() })
    }
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
