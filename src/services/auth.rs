// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication service: credentials, token lifecycle and identity resolution.
//!
//! Identity resolution for a bearer token:
//! 1. Decode the token, requiring the `access_token` scope
//! 2. Check the session cache (fast path - no I/O)
//! 3. On miss, read the user directory and populate the cache
//!
//! Every write to a user goes through [`AuthService::persist`], which also
//! invalidates that user's cache entry. Step 3 only fills the cache if no
//! invalidation happened while the directory read was in flight.

use crate::config::Config;
use crate::db::UserDirectory;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::avatar::gravatar_url;
use crate::services::email::{self, EmailKind, EmailMessage, EmailSender};
use crate::services::password;
use crate::services::session_cache::SessionCache;
use crate::services::tokens::{TokenCodec, TokenError, TokenScope};
use crate::time_utils::now_rfc3339;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Access + refresh token pair returned by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of consuming an email confirmation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    AlreadyConfirmed,
}

impl ConfirmOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            ConfirmOutcome::Confirmed => "Email confirmed",
            ConfirmOutcome::AlreadyConfirmed => "Your email is already confirmed",
        }
    }
}

/// Signup details, already validated by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

fn credentials_error() -> AppError {
    AppError::unauthorized(AppError::CREDENTIALS_ERROR)
}

/// Auth core shared by every request.
#[derive(Clone)]
pub struct AuthService {
    tokens: TokenCodec,
    users: Arc<dyn UserDirectory>,
    cache: SessionCache,
    mailer: Arc<dyn EmailSender>,
}

impl AuthService {
    pub fn new(
        config: &Config,
        users: Arc<dyn UserDirectory>,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            tokens: TokenCodec::new(config),
            users,
            cache: SessionCache::new(Duration::from_secs(config.session_cache_ttl_secs)),
            mailer,
        }
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    // ─── Identity Resolution ─────────────────────────────────────────────────

    /// Resolve the user behind an access token.
    ///
    /// Any failure is reported as "Could not validate credential".
    pub async fn resolve_current_user(&self, token: &str) -> Result<User> {
        let email = self
            .tokens
            .decode(token, TokenScope::Access)
            .map_err(|_| credentials_error())?;

        if email.is_empty() {
            return Err(credentials_error());
        }

        if let Some(user) = self.cache.get(&email) {
            return Ok(user);
        }

        let generation = self.cache.generation(&email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(credentials_error)?;

        if self.cache.put_if_current(&email, &user, generation) {
            tracing::debug!(email = %email, "Session cache populated");
        } else {
            tracing::debug!(email = %email, "User changed during lookup, not caching");
        }
        Ok(user)
    }

    // ─── Registration & Login ────────────────────────────────────────────────

    /// Create an unconfirmed account and send the verification email.
    pub async fn signup(&self, new_user: NewUser, base_url: &str) -> Result<User> {
        if self.users.find_by_email(&new_user.email).await?.is_some() {
            return Err(AppError::Conflict("Account already exists".to_string()));
        }

        let password_hash = hash_password(new_user.password).await?;
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            avatar: Some(gravatar_url(&new_user.email)),
            username: new_user.username,
            email: new_user.email,
            password_hash,
            created_at: now_rfc3339(),
            refresh_token: None,
            confirmed: false,
        };

        let user = self.users.insert(user).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "User registered");

        self.send_email(EmailKind::Verification, &user, base_url)?;
        Ok(user)
    }

    /// Verify credentials of a confirmed user and start a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let mut user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid email"))?;

        if !user.confirmed {
            return Err(AppError::unauthorized("Email not confirmed"));
        }

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            tracing::info!(email = %email, "Login rejected: invalid password");
            return Err(AppError::unauthorized("Invalid password"));
        }

        let pair = self.start_session(&mut user).await?;
        tracing::info!(email = %email, "User logged in");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// Presenting anything but the last issued refresh token revokes the
    /// stored one, forcing a fresh login.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let email = self
            .tokens
            .decode(refresh_token, TokenScope::Refresh)
            .map_err(|e| match e {
                TokenError::InvalidScope => AppError::unauthorized("Invalid scope for token"),
                TokenError::Unverifiable => credentials_error(),
            })?;

        let mut user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(credentials_error)?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            tracing::warn!(email = %email, "Refresh token mismatch, revoking stored token");
            user.refresh_token = None;
            self.persist(&user).await?;
            return Err(AppError::unauthorized("Invalid refresh token"));
        }

        self.start_session(&mut user).await
    }

    /// End the session of `user` by clearing its refresh token.
    pub async fn logout(&self, user: &User) -> Result<User> {
        let mut user = self
            .users
            .find_by_email(&user.email)
            .await?
            .ok_or_else(credentials_error)?;

        if user.refresh_token.is_none() {
            return Err(AppError::unauthorized("User not authorized"));
        }

        user.refresh_token = None;
        self.persist(&user).await?;
        tracing::info!(email = %user.email, "User logged out");
        Ok(user)
    }

    // ─── Email Confirmation & Password Reset ─────────────────────────────────

    /// Mark the token's user as confirmed. Idempotent.
    pub async fn confirm_email(&self, token: &str) -> Result<ConfirmOutcome> {
        let email = self.decode_email_token(token)?;
        let mut user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::bad_request("Verification error"))?;

        if user.confirmed {
            return Ok(ConfirmOutcome::AlreadyConfirmed);
        }

        user.confirmed = true;
        self.persist(&user).await?;
        tracing::info!(email = %email, "Email confirmed");
        Ok(ConfirmOutcome::Confirmed)
    }

    /// Re-send the verification email.
    pub async fn request_email_confirmation(
        &self,
        email: &str,
        base_url: &str,
    ) -> Result<&'static str> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::bad_request("Verification error"))?;

        if user.confirmed {
            return Ok(ConfirmOutcome::AlreadyConfirmed.message());
        }

        self.send_email(EmailKind::Verification, &user, base_url)?;
        Ok("Check your email for confirmation.")
    }

    /// Send a password reset link. Does not modify the user.
    pub async fn request_password_reset(&self, email: &str, base_url: &str) -> Result<()> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Conflict("Account does not exist".to_string()))?;

        self.send_email(EmailKind::PasswordReset, &user, base_url)
    }

    /// Replace the password of the token's user.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User> {
        let email = self.decode_email_token(token)?;
        let mut user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::bad_request("Verification error"))?;

        if password != password_confirm {
            return Err(AppError::bad_request("Password doesn't confirmed"));
        }

        user.password_hash = hash_password(password.to_string()).await?;
        self.persist(&user).await?;
        tracing::info!(email = %email, "Password changed");
        Ok(user)
    }

    // ─── Profile ─────────────────────────────────────────────────────────────

    pub async fn update_avatar(&self, user: &User, avatar_url: &str) -> Result<User> {
        let mut user = self
            .users
            .find_by_email(&user.email)
            .await?
            .ok_or_else(credentials_error)?;

        user.avatar = Some(avatar_url.to_string());
        self.persist(&user).await?;
        Ok(user)
    }

    // ─── Helpers ─────────────────────────────────────────────────────────────

    /// Issue a token pair and record the refresh token on the user.
    async fn start_session(&self, user: &mut User) -> Result<TokenPair> {
        let pair = TokenPair {
            access_token: self.tokens.issue_access_token(&user.email, None)?,
            refresh_token: self.tokens.issue_refresh_token(&user.email, None)?,
        };
        user.refresh_token = Some(pair.refresh_token.clone());
        self.persist(user).await?;
        Ok(pair)
    }

    /// Write through to the directory, then drop the cached snapshot.
    async fn persist(&self, user: &User) -> Result<()> {
        self.users.save(user).await?;
        self.cache.invalidate(&user.email);
        Ok(())
    }

    fn decode_email_token(&self, token: &str) -> Result<String> {
        self.tokens
            .decode(token, TokenScope::Email)
            .map_err(|_| AppError::unauthorized("Invalid token for email verification"))
    }

    fn send_email(&self, kind: EmailKind, user: &User, base_url: &str) -> Result<()> {
        let message = EmailMessage {
            kind,
            to: user.email.clone(),
            username: user.username.clone(),
            token: self.tokens.issue_email_token(&user.email)?,
            base_url: base_url.to_string(),
        };
        email::dispatch(self.mailer.clone(), message);
        Ok(())
    }
}

/// bcrypt is deliberately slow; keep it off the async workers.
async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.into()))
}
