//! In-memory sliding-window limiter for the anonymous auth endpoints.
use crate::error::AppError;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const DEFAULT_SWEEP_INTERVAL: usize = 256;

/// Every `sweep_interval` checks, stale identifiers are dropped inline.
#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
    calls: Arc<AtomicUsize>,
    sweep_interval: usize,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_secs: u64) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Records a hit for `identifier` and reports whether it is within the limit.
    pub async fn check(&self, identifier: &str) -> bool {
        let now = Instant::now();
        let calls = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        let mut requests = self.requests.write().await;

        if calls % self.sweep_interval == 0 {
            self.sweep(&mut requests, now);
        }

        let history = requests.entry(identifier.to_string()).or_default();
        history.retain(|&timestamp| now.duration_since(timestamp) < self.window);

        if history.len() < self.max_requests {
            history.push(now);
            true
        } else {
            false
        }
    }

    /// Drops identifiers whose whole history fell out of the window.
    pub async fn cleanup(&self) {
        let mut requests = self.requests.write().await;
        self.sweep(&mut requests, Instant::now());
    }

    fn sweep(&self, requests: &mut HashMap<String, Vec<Instant>>, now: Instant) {
        requests.retain(|_, history| {
            history.retain(|&timestamp| now.duration_since(timestamp) < self.window);
            !history.is_empty()
        });

        tracing::debug!(active = requests.len(), "Rate limiter cleanup");
    }
}

/// IP-keyed limit. Stale identifiers are swept periodically by `check`
/// and again whenever a request is rejected.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = addr.ip().to_string();

    if !limiter.check(&ip).await {
        tracing::warn!(%ip, path = %request.uri().path(), "Rate limit exceeded");
        limiter.cleanup().await;
        return AppError::RateLimited.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter() {
        let limiter = RateLimiter::new(3, 60);

        assert!(limiter.check("test_ip").await);
        assert!(limiter.check("test_ip").await);
        assert!(limiter.check("test_ip").await);

        assert!(!limiter.check("test_ip").await);

        assert!(limiter.check("other_ip").await);
    }

    #[tokio::test]
    async fn test_cleanup() {
        let limiter = RateLimiter::new(5, 1);

        limiter.check("ip1").await;
        limiter.check("ip2").await;

        tokio::time::sleep(Duration::from_millis(1100)).await;
        limiter.cleanup().await;

        let requests = limiter.requests.read().await;
        assert_eq!(requests.len(), 0);
    }

    #[tokio::test]
    async fn test_periodic_sweep_without_rejections() {
        let mut limiter = RateLimiter::new(5, 1);
        limiter.sweep_interval = 100;

        for i in 0..99 {
            assert!(limiter.check(&format!("10.0.0.{i}")).await);
        }
        assert_eq!(limiter.requests.read().await.len(), 99);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(limiter.check("10.0.1.1").await);

        let requests = limiter.requests.read().await;
        assert_eq!(requests.len(), 1);
        assert!(requests.contains_key("10.0.1.1"));
    }
}
