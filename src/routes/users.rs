// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile and password routes under `/api/users`.

use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::{EmailRequest, MessageResponse, UserDetailResponse};
use crate::error::Result;
use crate::middleware::auth::{require_auth, AuthUser};
use crate::middleware::rate_limit::{limited, rules};
use crate::models::UserResponse;
use crate::AppState;

pub fn routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let limiter = &state.rate_limiter;
    let authenticated = middleware::from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .route(
            "/api/users/me",
            limited(get(get_me).layer(authenticated.clone()), limiter, rules::USERS_ME),
        )
        .route(
            "/api/users/avatar",
            limited(patch(update_avatar).layer(authenticated), limiter, rules::AVATAR),
        )
        .route(
            "/api/users/forgot_password",
            limited(post(forgot_password), limiter, rules::FORGOT_PASSWORD),
        )
        .route(
            "/api/users/reset_password/{token}",
            limited(post(reset_password), limiter, rules::RESET_PASSWORD),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct AvatarUpdate {
    #[validate(url)]
    pub avatar_url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 6, max = 64))]
    pub password: String,
    pub password_confirm: String,
}

async fn get_me(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<UserResponse> {
    Json((&user).into())
}

async fn update_avatar(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<AvatarUpdate>,
) -> Result<Json<UserResponse>> {
    body.validate()?;

    let user = state.auth.update_avatar(&user, &body.avatar_url).await?;
    Ok(Json((&user).into()))
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<MessageResponse>> {
    body.validate()?;

    state
        .auth
        .request_password_reset(&body.email, &state.config.public_base_url)
        .await?;
    Ok(Json(MessageResponse::new("Email was sent")))
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<UserDetailResponse>> {
    body.validate()?;

    let user = state
        .auth
        .reset_password(&token, &body.password, &body.password_confirm)
        .await?;
    Ok(Json(UserDetailResponse::new(&user, "Password was changed")))
}
