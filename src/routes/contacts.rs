// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contact book routes (require authentication via JWT).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::middleware::auth::{require_auth, AuthUser};
use crate::models::contact::{ContactBirthday, ContactNotes};
use crate::models::{Contact, ContactFilter, ContactInput};
use crate::services::contacts::MAX_LIMIT;
use crate::time_utils::today_utc;
use crate::AppState;

pub fn routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/contacts", get(list_contacts).post(create_contact))
        .route("/api/contacts/search", get(search_contacts))
        .route("/api/contacts/birthdays", get(upcoming_birthdays))
        .route(
            "/api/contacts/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route("/api/contacts/{id}/birthday", patch(update_birthday))
        .route("/api/contacts/{id}/notes", patch(update_notes))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// Pagination parameters.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    skip: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    MAX_LIMIT
}

async fn list_contacts(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Contact>>> {
    let contacts = state
        .contacts
        .list(&user, params.skip, params.limit)
        .await?;
    Ok(Json(contacts))
}

async fn create_contact(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<ContactInput>,
) -> Result<(StatusCode, Json<Contact>)> {
    body.validate()?;

    let contact = state.contacts.create(&user, body).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn get_contact(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Contact>> {
    Ok(Json(state.contacts.get(&user, &id).await?))
}

async fn update_contact(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<ContactInput>,
) -> Result<Json<Contact>> {
    body.validate()?;

    Ok(Json(state.contacts.update(&user, &id, body).await?))
}

async fn update_birthday(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<ContactBirthday>,
) -> Result<Json<Contact>> {
    let contact = state
        .contacts
        .update_born_date(&user, &id, body.born_date)
        .await?;
    Ok(Json(contact))
}

async fn update_notes(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<ContactNotes>,
) -> Result<Json<Contact>> {
    body.validate()?;

    Ok(Json(state.contacts.update_notes(&user, &id, body.notes).await?))
}

async fn delete_contact(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Contact>> {
    Ok(Json(state.contacts.remove(&user, &id).await?))
}

async fn search_contacts(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(filter): Query<ContactFilter>,
) -> Result<Json<Vec<Contact>>> {
    filter.validate()?;

    Ok(Json(state.contacts.search(&user, &filter).await?))
}

async fn upcoming_birthdays(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Vec<Contact>>> {
    let today = today_utc();
    Ok(Json(state.contacts.upcoming_birthdays(&user, today).await?))
}
