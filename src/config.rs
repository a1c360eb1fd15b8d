// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup and shared read-only through `AppState`.

use std::env;

/// Default access token lifetime (10 minutes).
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 10 * 60;
/// Default refresh token lifetime (7 days).
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
/// Default email confirmation / password reset token lifetime (7 days).
pub const DEFAULT_EMAIL_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
/// Default lifetime of a cached user snapshot.
pub const DEFAULT_SESSION_CACHE_TTL_SECS: u64 = 1000;
/// Upper bound for any configured token lifetime (10 years).
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Public base URL of this API, used in email links
    pub public_base_url: String,
    /// GCP project ID; `None` selects the in-memory store
    pub gcp_project_id: Option<String>,
    /// Server port
    pub port: u16,

    /// JWT signing key (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub email_token_ttl_secs: i64,
    pub session_cache_ttl_secs: u64,

    /// Key rate limits on `X-Real-IP`. Only enable behind a proxy that sets it.
    pub trust_proxy_headers: bool,
}

impl Config {
    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
            gcp_project_id: None,
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            email_token_ttl_secs: DEFAULT_EMAIL_TOKEN_TTL_SECS,
            session_cache_ttl_secs: DEFAULT_SESSION_CACHE_TTL_SECS,
            trust_proxy_headers: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = parse_or("PORT", 8080u16);

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            gcp_project_id: env::var("GCP_PROJECT_ID")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            port,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .trim()
                .as_bytes()
                .to_vec(),
            access_token_ttl_secs: token_ttl("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL_SECS)?,
            refresh_token_ttl_secs: token_ttl(
                "REFRESH_TOKEN_TTL_SECS",
                DEFAULT_REFRESH_TOKEN_TTL_SECS,
            )?,
            email_token_ttl_secs: token_ttl("EMAIL_TOKEN_TTL_SECS", DEFAULT_EMAIL_TOKEN_TTL_SECS)?,
            session_cache_ttl_secs: parse_or(
                "SESSION_CACHE_TTL_SECS",
                DEFAULT_SESSION_CACHE_TTL_SECS,
            ),
            trust_proxy_headers: parse_or("TRUST_PROXY_HEADERS", false),
        })
    }
}

/// Read and parse an env var, falling back to `default` if unset or malformed.
fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Token lifetime from the environment, which must lie in `1..=MAX_TOKEN_TTL_SECS`.
fn token_ttl(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    let secs = parse_or(name, default);
    if (1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        Ok(secs)
    } else {
        Err(ConfigError::Invalid(name))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Environment variable out of range: {0}")]
    Invalid(&'static str),
}
