//! Per-client token-bucket rate limiting.
//!
//! Each client key gets a bucket that starts full at `burst` tokens and refills
//! continuously at `requests_per_minute / 60` tokens per second. A background
//! sweeper forgets clients that have been idle longer than the expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::request_log::client_ip;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(86_400);

#[derive(Debug, Clone, Copy)]
struct Visitor {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateDecision {
    Allowed,
    /// Rejected; one token will be available after `retry_after`.
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    visitors: Arc<Mutex<HashMap<String, Visitor>>>,
    capacity: f64,
    refill_per_sec: f64,
    idle_expiry: Duration,
    shutdown: CancellationToken,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32, burst: u32, idle_expiry: Duration) -> Self {
        Self {
            visitors: Arc::new(Mutex::new(HashMap::new())),
            capacity: f64::from(burst.max(1)),
            refill_per_sec: f64::from(requests_per_minute.max(1)) / 60.0,
            idle_expiry,
            shutdown: CancellationToken::new(),
        }
    }

    /// Take one token for `client` if one is available.
    pub async fn check(&self, client: &str) -> RateDecision {
        let now = Instant::now();
        let mut visitors = self.visitors.lock().await;
        let visitor = visitors.entry(client.to_string()).or_insert(Visitor {
            tokens: self.capacity,
            last_refill: now,
            last_seen: now,
        });

        let elapsed = now.duration_since(visitor.last_refill).as_secs_f64();
        visitor.tokens = (visitor.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        visitor.last_refill = now;
        visitor.last_seen = now;

        if visitor.tokens >= 1.0 {
            visitor.tokens -= 1.0;
            debug!(client, remaining = visitor.tokens, "Rate limit OK");
            RateDecision::Allowed
        } else {
            let retry_after =
                Duration::from_secs_f64((1.0 - visitor.tokens) / self.refill_per_sec);
            warn!(client, retry_after_ms = retry_after.as_millis() as u64, "Rate limit exceeded");
            RateDecision::Limited { retry_after }
        }
    }

    /// Drop clients idle for longer than the expiry. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut visitors = self.visitors.lock().await;
        let before = visitors.len();
        visitors.retain(|_, v| now.duration_since(v.last_seen) <= self.idle_expiry);
        let removed = before - visitors.len();
        if removed > 0 {
            debug!(removed, remaining = visitors.len(), "Swept idle rate-limit entries");
        }
        removed
    }

    pub async fn tracked_clients(&self) -> usize {
        self.visitors.lock().await.len()
    }

    /// Run [`sweep`](Self::sweep) every `interval` until [`shutdown`](Self::shutdown).
    /// The interval is clamped to `[1s, 1 day]`.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let interval = interval.clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL);
        let limiter = self.clone();
        let token = self.shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        limiter.sweep().await;
                    }
                }
            }
            info!("Rate limit sweeper stopped");
        })
    }

    /// Stop the sweeper. Safe to call more than once.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Middleware rejecting over-limit clients with 429 and `Retry-After`.
pub async fn enforce(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_ip(request.headers(), peer);

    match limiter.check(&client).await {
        RateDecision::Allowed => next.run(request).await,
        RateDecision::Limited { retry_after } => ApiError::rate_limited(retry_after).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPIRY: Duration = Duration::from_secs(180);

    #[tokio::test(start_paused = true)]
    async fn single_token_bucket_refills_after_a_second() {
        let limiter = RateLimiter::new(60, 1, EXPIRY);

        assert_eq!(limiter.check("1.2.3.4").await, RateDecision::Allowed);
        match limiter.check("1.2.3.4").await {
            RateDecision::Limited { retry_after } => {
                assert!(retry_after > Duration::from_millis(900));
                assert!(retry_after <= Duration::from_secs(1));
            }
            other => panic!("expected limit, got {other:?}"),
        }

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(limiter.check("1.2.3.4").await.is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn burst_then_limit() {
        let limiter = RateLimiter::new(60, 3, EXPIRY);
        for _ in 0..3 {
            assert!(limiter.check("c").await.is_allowed());
        }
        assert!(!limiter.check("c").await.is_allowed());

        // Half a second buys half a token: still limited.
        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(!limiter.check("c").await.is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn clients_have_independent_buckets() {
        let limiter = RateLimiter::new(60, 1, EXPIRY);
        assert!(limiter.check("a").await.is_allowed());
        assert!(!limiter.check("a").await.is_allowed());
        assert!(limiter.check("b").await.is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn refill_never_exceeds_capacity() {
        let limiter = RateLimiter::new(60, 2, EXPIRY);
        assert!(limiter.check("c").await.is_allowed());
        tokio::time::advance(Duration::from_secs(120)).await;
        assert!(limiter.check("c").await.is_allowed());
        assert!(limiter.check("c").await.is_allowed());
        assert!(!limiter.check("c").await.is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_forgets_idle_clients_only() {
        let limiter = RateLimiter::new(60, 5, EXPIRY);
        limiter.check("old").await;
        tokio::time::advance(Duration::from_secs(120)).await;
        limiter.check("recent").await;
        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(limiter.sweep().await, 1);
        assert_eq!(limiter.tracked_clients().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_runs_until_shutdown() {
        let limiter = RateLimiter::new(60, 5, Duration::from_secs(10));
        let handle = limiter.spawn_sweeper(Duration::from_secs(5));
        limiter.check("idle").await;

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(limiter.tracked_clients().await, 0);

        limiter.shutdown();
        limiter.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_sweep_interval_is_clamped() {
        let limiter = RateLimiter::new(60, 5, Duration::from_secs(1));
        let handle = limiter.spawn_sweeper(Duration::ZERO);
        limiter.check("idle").await;

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(limiter.tracked_clients().await, 0);

        limiter.shutdown();
        handle.await.unwrap();
    }
}
