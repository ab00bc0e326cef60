//! Rate limiting middleware
//!
//! The authentication endpoint accepts attacker-chosen keys and signatures, so
//! every `/auth/*` request passes a per-client token bucket first.

use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration, time::Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;

use crate::error::ApiError;

/// Token bucket for rate limiting
#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(max_tokens: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_update: Instant::now(),
        }
    }

    fn try_consume(&mut self, tokens_per_second: f64, max_tokens: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * tokens_per_second).min(max_tokens);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Default cap on tracked clients
pub const DEFAULT_MAX_BUCKETS: usize = 10_000;

/// Rate limiter state
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<RwLock<HashMap<String, TokenBucket>>>,
    tokens_per_second: f64,
    max_tokens: f64,
    max_buckets: usize,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    /// Create a new rate limiter allowing bursts of twice the per-second rate
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
            tokens_per_second: requests_per_second as f64,
            max_tokens: requests_per_second as f64 * 2.0,
            max_buckets: DEFAULT_MAX_BUCKETS,
            trust_proxy_headers: false,
        }
    }

    /// Key clients on `X-Forwarded-For` / `X-Real-IP`.
    ///
    /// Only safe behind a proxy that overwrites these headers.
    pub fn with_trusted_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Limit the number of clients tracked at once
    pub fn with_max_buckets(mut self, max_buckets: usize) -> Self {
        self.max_buckets = max_buckets.max(1);
        self
    }

    /// Check if a request is allowed
    pub async fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.write().await;

        if !buckets.contains_key(key) && buckets.len() >= self.max_buckets {
            // A bucket idle for a full refill is indistinguishable from a new one
            let refill = Duration::try_from_secs_f64(self.max_tokens / self.tokens_per_second)
                .unwrap_or(Duration::ZERO);
            let now = Instant::now();
            buckets.retain(|_, bucket| now.duration_since(bucket.last_update) < refill);

            if buckets.len() >= self.max_buckets {
                tracing::warn!(
                    tracked = buckets.len(),
                    "Rate limit table full, rejecting new client"
                );
                return false;
            }
        }

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.max_tokens));

        bucket.try_consume(self.tokens_per_second, self.max_tokens)
    }

    /// Drop buckets idle for longer than `max_age`
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        let mut buckets = self.buckets.write().await;
        let now = Instant::now();
        let before = buckets.len();

        buckets.retain(|_, bucket| now.duration_since(bucket.last_update) < max_age);

        before - buckets.len()
    }

    /// Sweep idle buckets every `interval` until the runtime shuts down
    pub fn spawn_cleanup(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = limiter.cleanup(interval).await;
                if removed > 0 {
                    tracing::debug!(removed, "Swept idle rate limit buckets");
                }
            }
        })
    }
}

/// Middleware rejecting clients that exhausted their bucket
pub async fn rate_limit(
    State(rate_limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client_key = client_ip(&request, rate_limiter.trust_proxy_headers);

    if !rate_limiter.check(&client_key).await {
        tracing::warn!(client = %client_key, path = %request.uri().path(), "Rate limit exceeded");
        return ApiError::TooManyRequests.into_response();
    }

    next.run(request).await
}

/// Client identity: the socket peer address, or proxy headers when trusted
pub fn client_ip(request: &Request, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_ip(request) {
            return ip;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(request: &Request) -> Option<String> {
    let headers = request.headers();

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}
