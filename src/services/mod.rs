// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod avatar;
pub mod contacts;
pub mod email;
pub mod password;
pub mod session_cache;
pub mod tokens;

pub use auth::{AuthService, ConfirmOutcome, NewUser, TokenPair};
pub use contacts::ContactService;
pub use email::{EmailKind, EmailMessage, EmailSender, LogMailer};
pub use session_cache::SessionCache;
pub use tokens::{Claims, TokenCodec, TokenError, TokenScope};
