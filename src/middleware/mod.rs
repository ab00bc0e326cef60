//! Middleware for the ticketing API
//!
//! This module provides middleware for request tracing, rate limiting,
//! security headers, and session extraction.

pub mod auth;
mod rate_limiter;
mod security;
mod tracing;

pub use auth::SessionUser;
pub use rate_limiter::{client_ip, rate_limit, RateLimiter, DEFAULT_MAX_BUCKETS};
pub use security::security_headers;
pub use self::tracing::{request_tracing, REQUEST_ID_HEADER};
