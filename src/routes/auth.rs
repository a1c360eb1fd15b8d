// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login and session routes under `/api/auth`.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    middleware,
    routing::{get, post},
    Extension, Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use super::{EmailRequest, MessageResponse, UserDetailResponse};
use crate::error::Result;
use crate::middleware::auth::{bearer_token, require_auth, AuthUser};
use crate::middleware::rate_limit::{limited, rules};
use crate::services::auth::{NewUser, TokenPair};
use crate::AppState;

pub fn routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let limiter = &state.rate_limiter;
    let authenticated = middleware::from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .route("/api/auth/signup", limited(post(signup), limiter, rules::SIGNUP))
        .route("/api/auth/login", limited(post(login), limiter, rules::LOGIN))
        .route(
            "/api/auth/refresh_token",
            limited(get(refresh_token), limiter, rules::REFRESH_TOKEN),
        )
        .route(
            "/api/auth/logout",
            limited(get(logout).layer(authenticated), limiter, rules::LOGOUT),
        )
        .route(
            "/api/auth/confirmed_email/{token}",
            limited(get(confirmed_email), limiter, rules::CONFIRMED_EMAIL),
        )
        .route(
            "/api/auth/request_email",
            limited(post(request_email), limiter, rules::REQUEST_EMAIL),
        )
}

/// Signup body.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 2, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 64))]
    pub password: String,
}

/// OAuth2-style password form; `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserDetailResponse>)> {
    body.validate()?;

    let user = state
        .auth
        .signup(
            NewUser {
                username: body.username,
                email: body.email,
                password: body.password,
            },
            &state.config.public_base_url,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserDetailResponse::new(
            &user,
            "User successfully created. Check your email for confirmation.",
        )),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>> {
    let pair = state.auth.login(&form.username, &form.password).await?;
    Ok(Json(pair.into()))
}

/// Exchange the refresh token in the `Authorization` header for a new pair.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>> {
    let token = bearer_token(&headers)?;
    let pair = state.auth.refresh(&token).await?;
    Ok(Json(pair.into()))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<UserDetailResponse>> {
    let user = state.auth.logout(&user).await?;
    Ok(Json(UserDetailResponse::new(&user, "User successfully logout")))
}

async fn confirmed_email(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>> {
    let outcome = state.auth.confirm_email(&token).await?;
    Ok(Json(MessageResponse::new(outcome.message())))
}

async fn request_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<MessageResponse>> {
    body.validate()?;

    let message = state
        .auth
        .request_email_confirmation(&body.email, &state.config.public_base_url)
        .await?;
    Ok(Json(MessageResponse::new(message)))
}
