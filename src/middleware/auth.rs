// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token authentication middleware.

use crate::error::{AppError, Result};
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use std::sync::Arc;

/// Authenticated user resolved from the access token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .ok_or_else(|| AppError::unauthorized("Not authenticated"))
}

/// Middleware that requires a valid access token.
///
/// On success the resolved [`AuthUser`] is available as a request extension.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(request.headers())?;
    let user = state.auth.resolve_current_user(&token).await?;

    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}
