//! Service configuration parsed from environment variables.
//!
//! Parsing goes through a lookup function so tests can feed a map instead
//! of mutating the process environment.

use std::net::{IpAddr, Ipv4Addr};

use axum::http::HeaderValue;

use crate::services::session::SessionKeys;
use crate::services::verifier::DEFAULT_TOKENINFO_URL;

pub const DEFAULT_WEB_URI: &str = "http://localhost:3000";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is required")]
    Missing { var: &'static str },
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("SESSION_SIGN_KEY and SESSION_ENCRYPT_KEY must be set together")]
    PartialSessionKeys,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Audience every ID token must be issued for.
    pub google_client_id: String,
    /// The single origin allowed to make credentialed requests.
    pub frontend_origin: HeaderValue,
    pub bind_addr: IpAddr,
    pub port: u16,
    /// `None` when no keys were configured; the caller generates ephemeral ones.
    pub session_keys: Option<SessionKeys>,
    pub cookie_secure: bool,
    pub db_max_connections: u32,
    pub tokeninfo_url: String,
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `DATABASE_URL`
    /// - `GOOGLE_CLIENT_ID`
    ///
    /// Optional:
    /// - `WEB_URI`: default `http://localhost:3000`
    /// - `PORT`: default 8080
    /// - `BIND_ADDR`: default `127.0.0.1`
    /// - `SESSION_SIGN_KEY`, `SESSION_ENCRYPT_KEY`: 64 hex chars each, both or neither
    /// - `COOKIE_SECURE`: defaults to whether `WEB_URI` is https
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `GOOGLE_TOKENINFO_URL`: default Google's tokeninfo endpoint
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or invalid variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let require = |var: &'static str| get(var).ok_or(ConfigError::Missing { var });

        let database_url = require("DATABASE_URL")?;
        let google_client_id = require("GOOGLE_CLIENT_ID")?;

        let web_uri = get("WEB_URI").unwrap_or_else(|| DEFAULT_WEB_URI.to_owned());
        let web_uri = web_uri.trim_end_matches('/');
        let frontend_origin = HeaderValue::from_str(web_uri)
            .map_err(|e| ConfigError::Invalid { var: "WEB_URI", reason: e.to_string() })?;

        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let bind_addr = parse_or("BIND_ADDR", get("BIND_ADDR"), DEFAULT_BIND_ADDR)?;
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), DEFAULT_DB_MAX_CONNECTIONS)?;

        let session_keys = match (get("SESSION_SIGN_KEY"), get("SESSION_ENCRYPT_KEY")) {
            (Some(sign), Some(encrypt)) => Some(SessionKeys::new(
                parse_key("SESSION_SIGN_KEY", &sign)?,
                parse_key("SESSION_ENCRYPT_KEY", &encrypt)?,
            )),
            (None, None) => None,
            _ => return Err(ConfigError::PartialSessionKeys),
        };

        let cookie_secure = match get("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "COOKIE_SECURE",
                reason: format!("not a boolean: {raw}"),
            })?,
            None => web_uri.starts_with("https://"),
        };

        let tokeninfo_url = get("GOOGLE_TOKENINFO_URL").unwrap_or_else(|| DEFAULT_TOKENINFO_URL.to_owned());

        Ok(Self {
            database_url,
            google_client_id,
            frontend_origin,
            bind_addr,
            port,
            session_keys,
            cookie_secure,
            db_max_connections,
            tokeninfo_url,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::Invalid { var, reason: e.to_string() }),
        None => Ok(default),
    }
}

fn parse_key(var: &'static str, raw: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = hex::decode(raw).map_err(|e| ConfigError::Invalid { var, reason: e.to_string() })?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| ConfigError::Invalid {
        var,
        reason: format!("expected 32 bytes (64 hex chars), got {}", bytes.len()),
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
