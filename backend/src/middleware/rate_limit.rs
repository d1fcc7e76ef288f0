use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use crate::cfg;
use crate::core;
use crate::services::audit::{self, AuditEvent};

/// Rate limiting entry for tracking requests
#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

/// In-memory fixed-window limiter keyed by client IP
#[derive(Clone, Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(settings: &cfg::AuthSettings) -> Self {
        Self {
            max_requests: settings.rate_limit_max_requests,
            window: Duration::from_secs(settings.rate_limit_window_secs),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Counts one request from `client_ip`; `false` once the budget is spent.
    pub async fn check(&self, client_ip: &str) -> bool {
        let now = Instant::now();
        let mut limiter = self.entries.write().await;

        // Clean up expired entries
        limiter.retain(|_, entry| now.duration_since(entry.window_start) <= self.window);

        let entry = limiter.entry(client_ip.to_string()).or_insert_with(|| RateLimitEntry {
            count: 0,
            window_start: now,
        });

        entry.count = entry.count.saturating_add(1);
        entry.count <= self.max_requests
    }
}

/// Rate limiting middleware for sign-in and sign-up
pub async fn rate_limit_middleware(State(context): State<core::ArcContext>, req: Request, next: Next) -> Response {
    let client_ip = audit::extract_client_ip(req.headers());

    if !context.rate_limiter.check(&client_ip).await {
        audit::log_event(&AuditEvent::RateLimitExceeded {
            client_ip,
            endpoint: req.uri().path().to_string(),
        });
        let body = Json(json!({
            "result": "error",
            "message": "Too many attempts, please try again later"
        }));
        return (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    }

    next.run(req).await
}
