// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contacts API Server
//!
//! Per-user contact book with email/password accounts, JWT sessions and
//! email confirmation.

use contacts_api::{
    config::Config,
    db::{ContactStore, FirestoreDb, MemoryDb, UserDirectory},
    services::{EmailSender, LogMailer},
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired cache entries and rate-limit windows are swept.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Contacts API");

    let (users, contacts): (Arc<dyn UserDirectory>, Arc<dyn ContactStore>) =
        match &config.gcp_project_id {
            Some(project_id) => {
                let db = FirestoreDb::new(project_id).await?;
                (Arc::new(db.clone()), Arc::new(db))
            }
            None => {
                tracing::warn!("GCP_PROJECT_ID not set, using in-memory storage");
                let db = MemoryDb::new();
                (Arc::new(db.clone()), Arc::new(db))
            }
        };

    let mailer: Arc<dyn EmailSender> = Arc::new(LogMailer);

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), users, contacts, mailer));
    tracing::info!(
        session_cache_ttl_secs = state.auth.cache().ttl().as_secs(),
        "Session cache initialized"
    );
    if state.rate_limiter.trusts_proxy_headers() {
        tracing::info!("Rate limits keyed on X-Real-IP from the fronting proxy");
    }

    spawn_maintenance(state.clone());

    // Build router
    let app = contacts_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Periodically drop expired session cache entries and idle rate-limit windows.
fn spawn_maintenance(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
        loop {
            interval.tick().await;
            let cached = state.auth.cache().purge_expired();
            let windows = state.rate_limiter.purge_stale(MAINTENANCE_INTERVAL);
            if cached + windows > 0 {
                tracing::debug!(cached, windows, "Purged stale entries");
            }
        }
    });
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contacts_api=debug,info".into()),
        )
        .with(format)
        .init();
}
