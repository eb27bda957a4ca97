//! Third-party ID-token verification.
//!
//! The rest of the login flow treats verification as a pass/fail capability
//! behind [`TokenVerifier`]. The production implementation asks Google's
//! tokeninfo endpoint, which checks the signature and expiry for us; we then
//! check the audience and issuer it reports.

use serde::Deserialize;

pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("token rejected by provider: {0}")]
    Rejected(String),
    #[error("token audience does not match")]
    AudienceMismatch,
    #[error("token issuer {0:?} is not trusted")]
    UntrustedIssuer(String),
    #[error("verifier request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Validates an ID token's signature and intended audience.
#[async_trait::async_trait]
pub trait TokenVerifier: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`VerifyError`] if the token is not valid for `audience`.
    async fn verify(&self, id_token: &str, audience: &str) -> Result<(), VerifyError>;
}

/// Fields of the tokeninfo response that we check.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenInfo {
    pub aud: String,
    pub iss: String,
}

pub(crate) fn check_token_info(info: &TokenInfo, audience: &str) -> Result<(), VerifyError> {
    if info.aud != audience {
        return Err(VerifyError::AudienceMismatch);
    }
    if !GOOGLE_ISSUERS.contains(&info.iss.as_str()) {
        return Err(VerifyError::UntrustedIssuer(info.iss.clone()));
    }
    Ok(())
}

/// Verifies Google ID tokens via the tokeninfo endpoint.
pub struct GoogleTokenVerifier {
    client: reqwest::Client,
    tokeninfo_url: String,
}

impl GoogleTokenVerifier {
    #[must_use]
    pub fn new(tokeninfo_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), tokeninfo_url: tokeninfo_url.into() }
    }
}

#[async_trait::async_trait]
impl TokenVerifier for GoogleTokenVerifier {
    async fn verify(&self, id_token: &str, audience: &str) -> Result<(), VerifyError> {
        // The token rides in the query string; strip the URL from transport errors so it never reaches logs.
        let resp = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !resp.status().is_success() {
            return Err(VerifyError::Rejected(resp.status().to_string()));
        }

        let info = resp
            .json::<TokenInfo>()
            .await
            .map_err(reqwest::Error::without_url)?;
        check_token_info(&info, audience)
    }
}

#[cfg(test)]
#[path = "verifier_test.rs"]
mod tests;
