// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use contacts_api::config::Config;
use contacts_api::db::{FirestoreDb, MemoryDb};
use contacts_api::routes::create_router;
use contacts_api::services::{EmailMessage, EmailSender};
use contacts_api::AppState;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Unique email per call, so emulator runs never collide.
#[allow(dead_code)]
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, uuid::Uuid::new_v4())
}

/// Mailer that keeps every message for inspection.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

#[allow(dead_code)]
impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Wait for the background dispatch to deliver at least `count` messages.
    pub async fn wait_for(&self, count: usize) -> Vec<EmailMessage> {
        for _ in 0..100 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} emails, got {}", self.sent().len());
    }
}

/// Full router over the in-memory backend.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingMailer>,
    pub db: MemoryDb,
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::test_default())
    }

    pub fn with_config(config: Config) -> Self {
        let db = MemoryDb::new();
        let mailer = Arc::new(RecordingMailer::default());
        let state = Arc::new(AppState::new(
            config,
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            mailer.clone(),
        ));

        Self {
            router: create_router(state.clone()),
            state,
            mailer,
            db,
        }
    }

    /// Send a request and decode the JSON body (`Null` when the body isn't JSON).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn signup(&self, username: &str, email: &str, password: &str) -> (StatusCode, Value) {
        self.json(
            Method::POST,
            "/api/auth/signup",
            None,
            serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }),
        )
        .await
    }

    /// Confirm `email` through the route, using a freshly issued email token.
    pub async fn confirm(&self, email: &str) -> (StatusCode, Value) {
        let token = self.state.auth.tokens().issue_email_token(email).unwrap();
        self.get(&format!("/api/auth/confirmed_email/{token}"), None)
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        let form = format!(
            "username={}&password={}",
            urlencoding::encode(email),
            urlencoding::encode(password)
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        self.send(request).await
    }

    /// Sign up, confirm and log in. Returns the login body.
    pub async fn register(&self, email: &str, password: &str) -> Value {
        let (status, _) = self.signup("tester", email, password).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = self.confirm(email).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body
    }

    /// Access token for a freshly registered user.
    pub async fn access_token(&self, email: &str) -> String {
        let body = self.register(email, "secret1").await;
        body["access_token"].as_str().unwrap().to_string()
    }
}
