//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::middleware::RateLimiter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    /// Limiter guarding the `/auth/*` routes
    pub auth_rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>, auth_rate_limiter: RateLimiter) -> Self {
        Self {
            auth_service,
            auth_rate_limiter,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for RateLimiter {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_rate_limiter.clone()
    }
}
