// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-route, per-client request throttling.
//!
//! Fixed-window counters live in a process-local `DashMap` keyed by
//! `(route, client)`. Limits therefore apply per instance.
//!
//! The client is the peer address. `X-Real-IP` is only honored when the
//! limiter is told a trusted proxy sets it (`TRUST_PROXY_HEADERS`), since
//! any caller can send the header.

use crate::error::{AppError, Result};
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Maximum `max_requests` per `window` for one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub name: &'static str,
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitRule {
    pub const fn per_minute(name: &'static str, max_requests: u32) -> Self {
        Self {
            name,
            max_requests,
            window: Duration::from_secs(60),
        }
    }
}

/// Limits for the throttled endpoints.
pub mod rules {
    use super::RateLimitRule;

    pub const SIGNUP: RateLimitRule = RateLimitRule::per_minute("signup", 5);
    pub const LOGIN: RateLimitRule = RateLimitRule::per_minute("login", 10);
    pub const REFRESH_TOKEN: RateLimitRule = RateLimitRule::per_minute("refresh_token", 10);
    pub const LOGOUT: RateLimitRule = RateLimitRule::per_minute("logout", 10);
    pub const CONFIRMED_EMAIL: RateLimitRule = RateLimitRule::per_minute("confirmed_email", 10);
    pub const REQUEST_EMAIL: RateLimitRule = RateLimitRule::per_minute("request_email", 3);
    pub const USERS_ME: RateLimitRule = RateLimitRule::per_minute("users_me", 10);
    pub const AVATAR: RateLimitRule = RateLimitRule::per_minute("avatar", 5);
    pub const FORGOT_PASSWORD: RateLimitRule = RateLimitRule::per_minute("forgot_password", 3);
    pub const RESET_PASSWORD: RateLimitRule = RateLimitRule::per_minute("reset_password", 3);
}

#[derive(Debug)]
struct Window {
    requests: u32,
    started: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    windows: Arc<DashMap<(&'static str, String), Window>>,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key clients on `X-Real-IP` when present. Only safe behind a proxy
    /// that overwrites the header.
    pub fn with_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    pub fn trusts_proxy_headers(&self) -> bool {
        self.trust_proxy_headers
    }

    /// Count one request from `client` against `rule`.
    ///
    /// Returns false once the window's budget is spent.
    pub fn check(&self, rule: &RateLimitRule, client: &str) -> bool {
        let mut window = self
            .windows
            .entry((rule.name, client.to_string()))
            .or_insert_with(|| Window {
                requests: 0,
                started: Instant::now(),
            });

        if window.started.elapsed() >= rule.window {
            window.requests = 0;
            window.started = Instant::now();
        }

        if window.requests >= rule.max_requests {
            return false;
        }

        window.requests += 1;
        true
    }

    /// Drop windows older than `max_age`. Returns the number removed.
    pub fn purge_stale(&self, max_age: Duration) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, w| w.started.elapsed() < max_age);
        before.saturating_sub(self.windows.len())
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// State for one throttled route.
#[derive(Clone)]
pub struct RouteLimit {
    pub limiter: RateLimiter,
    pub rule: RateLimitRule,
}

/// Identify the caller: the peer address, or the proxy-provided
/// `X-Real-IP` when `trust_proxy_headers` is set.
pub fn client_key(request: &Request, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = request
            .headers()
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware rejecting requests over the route's budget with 429.
pub async fn enforce_rate_limit(
    State(limit): State<RouteLimit>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let client = client_key(&request, limit.limiter.trusts_proxy_headers());

    if !limit.limiter.check(&limit.rule, &client) {
        tracing::warn!(route = limit.rule.name, client = %client, "Rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}

/// Wrap `route` so the limit is checked before any inner layer runs.
pub fn limited<S>(route: MethodRouter<S>, limiter: &RateLimiter, rule: RateLimitRule) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.layer(middleware::from_fn_with_state(
        RouteLimit {
            limiter: limiter.clone(),
            rule,
        },
        enforce_rate_limit,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::{routing::get, Router};
    use tower::ServiceExt; // for oneshot

    const TIGHT: RateLimitRule = RateLimitRule::per_minute("tight", 2);

    #[test]
    fn test_budget_per_client_and_route() {
        let limiter = RateLimiter::new();

        assert!(limiter.check(&TIGHT, "1.2.3.4"));
        assert!(limiter.check(&TIGHT, "1.2.3.4"));
        assert!(!limiter.check(&TIGHT, "1.2.3.4"));

        // Other clients and other routes have their own windows
        assert!(limiter.check(&TIGHT, "5.6.7.8"));
        assert!(limiter.check(&rules::LOGIN, "1.2.3.4"));
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new();
        let rule = RateLimitRule {
            name: "instant",
            max_requests: 1,
            window: Duration::ZERO,
        };

        assert!(limiter.check(&rule, "c"));
        assert!(limiter.check(&rule, "c"));
    }

    #[test]
    fn test_purge_stale() {
        let limiter = RateLimiter::new();
        limiter.check(&TIGHT, "a");
        limiter.check(&TIGHT, "b");
        assert_eq!(limiter.len(), 2);

        assert_eq!(limiter.purge_stale(Duration::from_secs(3600)), 0);
        assert_eq!(limiter.purge_stale(Duration::ZERO), 2);
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_client_key() {
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(client_key(&request, false), "unknown");

        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 9], 4242))));
        assert_eq!(client_key(&request, false), "192.168.1.9");
    }

    #[test]
    fn test_client_key_proxy_header() {
        let mut request = Request::builder()
            .uri("/")
            .header("x-real-ip", "10.0.0.7")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 9], 4242))));

        assert_eq!(client_key(&request, false), "192.168.1.9");
        assert_eq!(client_key(&request, true), "10.0.0.7");
    }

    #[tokio::test]
    async fn test_spoofed_header_does_not_reset_budget() {
        let limiter = RateLimiter::new();
        let app: Router = Router::new().route(
            "/",
            limited(get(|| async { "ok" }), &limiter, TIGHT),
        );

        let mut statuses = Vec::new();
        for i in 0..5 {
            let request = Request::builder()
                .uri("/")
                .header("x-real-ip", format!("spoof-{i}"))
                .body(Body::empty())
                .unwrap();
            statuses.push(app.clone().oneshot(request).await.unwrap().status());
        }

        use axum::http::StatusCode;
        assert_eq!(
            statuses,
            vec![
                StatusCode::OK,
                StatusCode::OK,
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::TOO_MANY_REQUESTS,
            ]
        );
    }

    #[tokio::test]
    async fn test_middleware_returns_429() {
        let limiter = RateLimiter::new();
        let app: Router = Router::new().route(
            "/",
            limited(get(|| async { "ok" }), &limiter, TIGHT),
        );

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), 200);
        }

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 429);
    }
}
