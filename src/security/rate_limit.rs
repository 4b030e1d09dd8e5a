//! Fixed-window rate limiting middleware.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;

use crate::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Outcome of one limiter check. Ephemeral, recomputed per request.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Calls left in the current window.
    pub remaining: u32,
    /// When the current window resets.
    pub reset_at: DateTime<Utc>,
}

/// Counter store failure.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
}

/// State of one key's window after a bump.
#[derive(Debug, Clone, Copy)]
pub struct WindowState {
    pub allowed: bool,
    pub count: u32,
    /// Time left before this window resets.
    pub resets_in: Duration,
}

/// Shared counter store. In-process by default; an external key-value
/// service can implement this to coordinate across instances.
pub trait CounterStore: Send + Sync {
    /// Increment `key`'s counter unless the window already holds `limit`
    /// calls. Counters reset when the window elapses.
    fn bump(&self, key: &str, limit: u32, window: Duration) -> Result<WindowState, CounterError>;
}

struct Window {
    started: Instant,
    count: u32,
}

/// DashMap-backed in-process counter store.
#[derive(Default)]
pub struct MemoryCounterStore {
    windows: DashMap<String, Window>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryCounterStore {
    fn bump(&self, key: &str, limit: u32, window: Duration) -> Result<WindowState, CounterError> {
        let now = Instant::now();
        let mut slot = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(slot.started) >= window {
            slot.started = now;
            slot.count = 0;
        }

        let allowed = slot.count < limit;
        if allowed {
            slot.count += 1;
        }

        let elapsed = now.duration_since(slot.started);
        Ok(WindowState {
            allowed,
            count: slot.count,
            resets_in: window.saturating_sub(elapsed),
        })
    }
}

/// Fixed-window rate limiter over a pluggable counter store.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Check one request against the limiter.
    ///
    /// Policy on counter store failure: fail open. The request is allowed
    /// and a warning is logged; this is uniform across all call sites.
    pub fn check(&self, key: &str, limit: u32, window_secs: u64) -> RateLimitDecision {
        let window = Duration::from_secs(window_secs);
        match self.store.bump(key, limit, window) {
            Ok(state) => RateLimitDecision {
                allowed: state.allowed,
                remaining: limit.saturating_sub(state.count),
                reset_at: Utc::now()
                    + chrono::Duration::milliseconds(state.resets_in.as_millis() as i64),
            },
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "counter store unreachable, failing open");
                RateLimitDecision {
                    allowed: true,
                    remaining: limit,
                    reset_at: Utc::now() + chrono::Duration::seconds(window_secs as i64),
                }
            }
        }
    }
}

/// Middleware rejecting over-limit requests with 429 before any auth work.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let config = &state.config.rate_limit;
    if !config.enabled {
        return next.run(request).await;
    }

    let route = request.uri().path().to_string();
    let key = format!("{}:{}", route, addr.ip());
    let decision = state.limiter.check(&key, config.limit, config.window_secs);

    if decision.allowed {
        return next.run(request).await;
    }

    tracing::warn!(client = %addr.ip(), route = %route, "rate limit exceeded");
    metrics::record_rate_limited(&route);

    let retry_after_secs = (decision.reset_at - Utc::now()).num_seconds().max(0) as u64;
    ApiError::RateLimited { retry_after_secs }.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denies_after_limit_within_window() {
        let limiter = RateLimiter::new(Arc::new(MemoryCounterStore::new()));
        for i in 0..3 {
            let decision = limiter.check("accounts:10.0.0.1", 3, 60);
            assert!(decision.allowed, "call {} should pass", i);
            assert_eq!(decision.remaining, 2 - i);
        }
        let decision = limiter.check("accounts:10.0.0.1", 3, 60);
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(Arc::new(MemoryCounterStore::new()));
        assert!(limiter.check("a:1", 1, 60).allowed);
        assert!(!limiter.check("a:1", 1, 60).allowed);
        assert!(limiter.check("b:1", 1, 60).allowed);
    }

    #[test]
    fn window_elapse_resets_counter() {
        let limiter = RateLimiter::new(Arc::new(MemoryCounterStore::new()));
        assert!(limiter.check("k", 1, 1).allowed);
        assert!(!limiter.check("k", 1, 1).allowed);
        std::thread::sleep(Duration::from_millis(1100));
        assert!(limiter.check("k", 1, 1).allowed);
    }

    struct BrokenStore;

    impl CounterStore for BrokenStore {
        fn bump(&self, _: &str, _: u32, _: Duration) -> Result<WindowState, CounterError> {
            Err(CounterError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn store_failure_fails_open() {
        let limiter = RateLimiter::new(Arc::new(BrokenStore));
        let decision = limiter.check("k", 1, 60);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
    }
}
