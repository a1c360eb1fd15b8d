// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cache behavior through the full router.
//!
//! Writes to a user must never be hidden behind a cached snapshot.

use axum::http::{Method, StatusCode};
use contacts_api::db::UserDirectory;
use serde_json::json;

mod common;
use common::TestApp;

#[tokio::test]
async fn test_authenticated_request_populates_cache() {
    let app = TestApp::new();
    let token = app.access_token("a@b.com").await;
    let cache = app.state.auth.cache();

    // Login itself writes the user, which drops any cached snapshot
    assert!(cache.get("a@b.com").is_none());

    let (status, _) = app.get("/api/contacts", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let cached = cache.get("a@b.com").expect("snapshot should be cached");
    assert_eq!(cached.email, "a@b.com");
}

#[tokio::test]
async fn test_cached_snapshot_serves_without_directory() {
    let app = TestApp::new();
    let token = app.access_token("a@b.com").await;
    app.get("/api/contacts", Some(&token)).await;

    // A change made behind the service's back stays invisible within the TTL
    let mut user = app.db.find_by_email("a@b.com").await.unwrap().unwrap();
    user.username = "renamed".to_string();
    app.db.save(&user).await.unwrap();

    let (_, me) = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(me["username"], "tester");

    app.state.auth.cache().invalidate("a@b.com");
    let (_, me) = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(me["username"], "renamed");
}

#[tokio::test]
async fn test_logout_invalidates_cache() {
    let app = TestApp::new();
    let token = app.access_token("a@b.com").await;
    app.get("/api/contacts", Some(&token)).await;
    assert!(app.state.auth.cache().get("a@b.com").is_some());

    let (status, _) = app.get("/api/auth/logout", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.state.auth.cache().get("a@b.com").is_none());

    // The next resolve reads the cleared refresh token from the directory
    let (status, body) = app.get("/api/auth/logout", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "User not authorized");
}

#[tokio::test]
async fn test_avatar_update_invalidates_cache() {
    let app = TestApp::new();
    let token = app.access_token("a@b.com").await;
    app.get("/api/contacts", Some(&token)).await;

    let (status, _) = app
        .json(
            Method::PATCH,
            "/api/users/avatar",
            Some(&token),
            json!({ "avatar_url": "https://cdn.example.com/a.png" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.state.auth.cache().get("a@b.com").is_none());

    let (_, me) = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(me["avatar"], "https://cdn.example.com/a.png");
}
