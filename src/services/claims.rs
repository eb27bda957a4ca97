//! ID-token claim extraction.
//!
//! Splits a compact `header.payload.signature` token and decodes the payload
//! segment into a claim set. Nothing here checks the signature or expiry: a
//! token must already have passed a [`TokenVerifier`](super::verifier::TokenVerifier)
//! before its claims are trusted.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::{Map, Value};

/// Decoded token payload. Keys are claim names, values are untyped JSON.
pub type ClaimSet = Map<String, Value>;

const LENIENT_PADDING: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Standard alphabet, padded or unpadded.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_PADDING);

/// URL-safe alphabet, padded or unpadded. Issued ID tokens use this one.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_PADDING);

#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("malformed token: expected 3 segments, found {segments}")]
    MalformedToken { segments: usize },
    #[error("token payload is not valid base64: {0}")]
    Decoding(#[from] base64::DecodeError),
    #[error("token payload is not a JSON object: {0}")]
    ClaimParse(#[from] serde_json::Error),
    #[error("claim {key:?} is missing")]
    MissingClaim { key: &'static str },
    #[error("claim {key:?} is not a string")]
    NotAString { key: &'static str },
}

/// Decode the payload segment of a compact token into a [`ClaimSet`].
///
/// # Errors
///
/// - [`ClaimError::MalformedToken`] unless the token has exactly three
///   dot-separated segments.
/// - [`ClaimError::Decoding`] if the payload is not base64.
/// - [`ClaimError::ClaimParse`] if the decoded bytes are not a JSON object.
pub fn decode_claims(token: &str) -> Result<ClaimSet, ClaimError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(ClaimError::MalformedToken { segments: segments.len() });
    };

    let bytes = engine_for(payload).decode(payload)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Look up a claim that must be a JSON string.
///
/// # Errors
///
/// Returns [`ClaimError::MissingClaim`] if absent and
/// [`ClaimError::NotAString`] for any other JSON type.
pub fn string_claim<'a>(claims: &'a ClaimSet, key: &'static str) -> Result<&'a str, ClaimError> {
    match claims.get(key) {
        None => Err(ClaimError::MissingClaim { key }),
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(ClaimError::NotAString { key }),
    }
}

fn engine_for(segment: &str) -> &'static GeneralPurpose {
    if segment.contains(['-', '_']) { &URL_SAFE_LENIENT } else { &STANDARD_LENIENT }
}

#[cfg(test)]
#[path = "claims_test.rs"]
mod tests;
