//! Find-or-create resolution of verified identities to local users.

use std::sync::Arc;

use super::users::{LocalUser, StoreError, UserStore};

/// The local identity a login resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    /// Display name as stored at creation time.
    pub name: String,
}

impl From<LocalUser> for Identity {
    fn from(user: LocalUser) -> Self {
        Self { user_id: user.id, name: user.name }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("a display name is required to create a new user")]
    MissingName,
    #[error("local-auth failed looking up user: {0}")]
    Lookup(#[source] StoreError),
    #[error("local-auth failed creating user: {0}")]
    Create(#[source] StoreError),
}

pub struct IdentityResolver {
    users: Arc<dyn UserStore>,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Return the local identity for `email`, creating the user if absent.
    ///
    /// An existing user keeps its stored display name and `name` is ignored.
    /// `name` is only consulted when a user has to be created.
    ///
    /// Two concurrent first logins for one email can both miss the lookup;
    /// the loser's insert fails on the unique constraint and is returned as
    /// [`IdentityError::Create`] without retrying the lookup.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::MissingName`] if a user must be created and `name` is `None`.
    /// - [`IdentityError::Lookup`] / [`IdentityError::Create`] for storage failures.
    pub async fn resolve(&self, email: &str, name: Option<&str>) -> Result<Identity, IdentityError> {
        match self.users.find_by_email(email).await {
            Ok(user) => Ok(user.into()),
            Err(StoreError::NotFound) => {
                let name = name.ok_or(IdentityError::MissingName)?;
                let user = self
                    .users
                    .create(email, name)
                    .await
                    .map_err(IdentityError::Create)?;
                tracing::info!(user_id = user.id, "created local user");
                Ok(user.into())
            }
            Err(e) => Err(IdentityError::Lookup(e)),
        }
    }
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
