//! # Per-Client Rate Limiting
//!
//! Token-bucket limiter keyed by client address. Each client gets a bucket
//! the first time it is seen; the bucket holds `burst` tokens and refills at
//! `per_second` tokens per second. A request spends one token or is turned
//! away with `429` and an empty body.
//!
//! Buckets live in a `DashMap`. Provisioning goes through the entry API, so
//! concurrent first requests from one client share a single bucket, and the
//! refill-and-spend step runs under that entry's shard lock.
//!
//! Idle buckets are dropped by [`RateLimiter::spawn_eviction`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tokio::task::JoinHandle;

use super::client::ProxyTrust;

/// Bucket parameters applied to every client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    /// Bucket capacity.
    pub burst: u32,
    /// Tokens restored per second.
    pub per_second: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst: 10,
            per_second: 5.0,
        }
    }
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    fn full(config: &RateLimitConfig, now: Instant) -> Self {
        Self {
            tokens: f64::from(config.burst),
            last_refill: now,
            last_seen: now,
        }
    }

    fn try_take(&mut self, config: &RateLimitConfig, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * config.per_second).min(f64::from(config.burst));
        self.last_refill = now;
        self.last_seen = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Shared limiter. Cloning shares the bucket table.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<DashMap<String, TokenBucket>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(DashMap::new()),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Spend a token for `key`. Returns `false` when the bucket is empty.
    pub fn admit(&self, key: &str) -> bool {
        self.admit_at(key, Instant::now())
    }

    pub(crate) fn admit_at(&self, key: &str, now: Instant) -> bool {
        let config = &self.config;
        let mut bucket = self
            .buckets
            .entry(key.to_owned())
            .or_insert_with(|| TokenBucket::full(config, now));
        bucket.try_take(config, now)
    }

    /// Number of tracked clients.
    pub fn tracked(&self) -> usize {
        self.buckets.len()
    }

    /// Drop buckets unused for longer than `max_idle`. Returns how many were removed.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        self.evict_idle_at(max_idle, Instant::now())
    }

    pub(crate) fn evict_idle_at(&self, max_idle: Duration, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, b| now.saturating_duration_since(b.last_seen) <= max_idle);
        before.saturating_sub(self.buckets.len())
    }

    /// Run [`evict_idle`](Self::evict_idle) every `every` on the current runtime.
    pub fn spawn_eviction(&self, every: Duration, max_idle: Duration) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = limiter.evict_idle(max_idle);
                if evicted > 0 {
                    tracing::debug!(evicted, remaining = limiter.tracked(), "evicted idle rate-limit buckets");
                }
            }
        })
    }
}

/// Admission gate. Denials short-circuit with an empty `429`.
pub async fn rate_limit_middleware(
    State((limiter, proxies)): State<(RateLimiter, ProxyTrust)>,
    request: Request,
    next: Next,
) -> Response {
    let key = proxies.client_key(&request);
    if !limiter.admit(&key) {
        return StatusCode::TOO_MANY_REQUESTS.into_response();
    }
    next.run(request).await
}
