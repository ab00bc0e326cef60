//! Authentication routes

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::auth;
use crate::middleware::rate_limit;
use crate::state::AppState;

/// Create authentication routes, rate limited per client
pub fn auth_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/stellar", post(auth::stellar_auth))
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/test", get(auth::auth_test))
        .route_layer(middleware::from_fn_with_state(
            state.auth_rate_limiter.clone(),
            rate_limit,
        ))
}
