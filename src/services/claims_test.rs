use super::*;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

fn token_with_payload(payload: &str) -> String {
    format!("xxx.{payload}.zzz")
}

// =============================================================================
// decode_claims: happy paths
// =============================================================================

#[test]
fn decodes_standard_padded_payload() {
    let payload = STANDARD.encode(r#"{"email":"foo@bar.com","name":"foo bar"}"#);
    let claims = decode_claims(&token_with_payload(&payload)).unwrap();
    assert_eq!(claims.get("email").and_then(Value::as_str), Some("foo@bar.com"));
    assert_eq!(claims.get("name").and_then(Value::as_str), Some("foo bar"));
}

#[test]
fn decodes_url_safe_unpadded_payload() {
    // "~" and ">" push 6-bit groups into the 62/63 range, which differ between alphabets.
    let json = r#"{"email":"a@b.c","n":"~~~?>"}"#;
    let payload = URL_SAFE_NO_PAD.encode(json);
    assert!(payload.contains(['-', '_']), "fixture should exercise url-safe alphabet: {payload}");
    let claims = decode_claims(&token_with_payload(&payload)).unwrap();
    assert_eq!(claims.get("n").and_then(Value::as_str), Some("~~~?>"));
}

#[test]
fn decodes_standard_payload_without_padding() {
    let json = r#"{"email":"x@y.z"}"#;
    let payload = STANDARD.encode(json);
    let trimmed = payload.trim_end_matches('=');
    let claims = decode_claims(&token_with_payload(trimmed)).unwrap();
    assert_eq!(claims.get("email").and_then(Value::as_str), Some("x@y.z"));
}

#[test]
fn keeps_non_string_claims_untyped() {
    let payload = STANDARD.encode(r#"{"email_verified":true,"exp":1700000000}"#);
    let claims = decode_claims(&token_with_payload(&payload)).unwrap();
    assert_eq!(claims.get("email_verified"), Some(&Value::Bool(true)));
    assert_eq!(claims.get("exp").and_then(Value::as_i64), Some(1_700_000_000));
}

#[test]
fn ignores_header_and_signature_segments() {
    let payload = STANDARD.encode(r#"{"email":"foo@bar.com"}"#);
    let token = format!("not-base64!!.{payload}.also not base64");
    assert!(decode_claims(&token).is_ok());
}

// =============================================================================
// decode_claims: malformed tokens
// =============================================================================

#[test]
fn rejects_wrong_segment_counts() {
    for token in ["", "abc", "a.b", "a.b.c.d", "a.b.c.d.e", "...."] {
        match decode_claims(token) {
            Err(ClaimError::MalformedToken { segments }) => {
                assert_eq!(segments, token.split('.').count(), "token {token:?}");
            }
            other => panic!("expected MalformedToken for {token:?}, got {other:?}"),
        }
    }
}

#[test]
fn rejects_invalid_base64_payload() {
    let err = decode_claims("xxx.!!!not*base64!!!.zzz").unwrap_err();
    assert!(matches!(err, ClaimError::Decoding(_)), "got {err:?}");
}

#[test]
fn rejects_payload_that_is_not_json() {
    let payload = STANDARD.encode("definitely not json");
    let err = decode_claims(&token_with_payload(&payload)).unwrap_err();
    assert!(matches!(err, ClaimError::ClaimParse(_)), "got {err:?}");
}

#[test]
fn rejects_json_that_is_not_an_object() {
    for json in ["[1,2,3]", "\"email\"", "42", "null", "true"] {
        let payload = STANDARD.encode(json);
        let err = decode_claims(&token_with_payload(&payload)).unwrap_err();
        assert!(matches!(err, ClaimError::ClaimParse(_)), "{json}: got {err:?}");
    }
}

#[test]
fn rejects_empty_payload_segment() {
    let err = decode_claims("xxx..zzz").unwrap_err();
    assert!(matches!(err, ClaimError::ClaimParse(_)), "got {err:?}");
}

#[test]
fn malformed_token_message_omits_token_contents() {
    let err = decode_claims("secret-token-value").unwrap_err();
    assert!(!err.to_string().contains("secret-token-value"));
}

// =============================================================================
// string_claim
// =============================================================================

fn claims_from(json: &str) -> ClaimSet {
    serde_json::from_str(json).unwrap()
}

#[test]
fn string_claim_returns_value() {
    let claims = claims_from(r#"{"email":"foo@bar.com"}"#);
    assert_eq!(string_claim(&claims, "email").unwrap(), "foo@bar.com");
}

#[test]
fn string_claim_missing_key() {
    let claims = claims_from(r#"{"name":"foo"}"#);
    let err = string_claim(&claims, "email").unwrap_err();
    assert!(matches!(err, ClaimError::MissingClaim { key: "email" }));
}

#[test]
fn string_claim_wrong_type() {
    let claims = claims_from(r#"{"email":123,"name":null}"#);
    assert!(matches!(string_claim(&claims, "email"), Err(ClaimError::NotAString { key: "email" })));
    assert!(matches!(string_claim(&claims, "name"), Err(ClaimError::NotAString { key: "name" })));
}
