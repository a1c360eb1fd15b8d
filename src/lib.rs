// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contacts API: per-user contact book behind email/password authentication.
//!
//! Users register, confirm their email and log in for a short-lived access
//! token plus a rotating refresh token. Every contact operation is scoped to
//! the user resolved from the access token.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{ContactStore, UserDirectory};
use middleware::rate_limit::RateLimiter;
use services::{AuthService, ContactService, EmailSender};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
    pub contacts: ContactService,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserDirectory>,
        contacts: Arc<dyn ContactStore>,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        let auth = AuthService::new(&config, users, mailer);
        let rate_limiter = RateLimiter::new().with_proxy_headers(config.trust_proxy_headers);
        Self {
            config,
            auth,
            contacts: ContactService::new(contacts),
            rate_limiter,
        }
    }
}
