// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scoped JWT issuance and verification.
//!
//! Every token is HS256-signed and carries `sub` (email), `iat`, `exp`,
//! `scope` and a random `jti`. A token is only accepted for the scope it
//! was issued for.

use crate::config::{Config, MAX_TOKEN_TTL_SECS};
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenScope {
    #[serde(rename = "access_token")]
    Access,
    #[serde(rename = "refresh_token")]
    Refresh,
    /// Email confirmation and password reset links
    #[serde(rename = "email_token")]
    Email,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub scope: TokenScope,
    /// Unique token ID; keeps two tokens issued in the same second distinct
    pub jti: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Invalid scope for token")]
    InvalidScope,
    /// Bad signature, malformed, or expired.
    #[error("Could not validate credential")]
    Unverifiable,
}

/// Signs and verifies scoped tokens with the process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    email_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&config.jwt_signing_key),
            decoding_key: DecodingKey::from_secret(&config.jwt_signing_key),
            access_ttl: ttl(config.access_token_ttl_secs),
            refresh_ttl: ttl(config.refresh_token_ttl_secs),
            email_ttl: ttl(config.email_token_ttl_secs),
        }
    }

    /// Access token, 10 minutes unless `ttl` overrides it.
    pub fn issue_access_token(&self, email: &str, ttl: Option<Duration>) -> Result<String, AppError> {
        self.issue(email, TokenScope::Access, ttl.unwrap_or(self.access_ttl))
    }

    /// Refresh token, 7 days unless `ttl` overrides it.
    pub fn issue_refresh_token(
        &self,
        email: &str,
        ttl: Option<Duration>,
    ) -> Result<String, AppError> {
        self.issue(email, TokenScope::Refresh, ttl.unwrap_or(self.refresh_ttl))
    }

    /// Email confirmation / password reset token, 7 days.
    pub fn issue_email_token(&self, email: &str) -> Result<String, AppError> {
        self.issue(email, TokenScope::Email, self.email_ttl)
    }

    fn issue(&self, email: &str, scope: TokenScope, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Token expiry out of range")))?;
        let claims = Claims {
            sub: email.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            scope,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
    }

    /// Verify signature and expiry, then require `expected` scope.
    pub fn decode_claims(&self, token: &str, expected: TokenScope) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::Unverifiable)?
            .claims;

        if claims.scope != expected {
            return Err(TokenError::InvalidScope);
        }
        Ok(claims)
    }

    /// Decode and return the subject email.
    pub fn decode(&self, token: &str, expected: TokenScope) -> Result<String, TokenError> {
        self.decode_claims(token, expected).map(|claims| claims.sub)
    }
}

fn ttl(secs: i64) -> Duration {
    Duration::seconds(secs.clamp(0, MAX_TOKEN_TTL_SECS))
}
