//! Route definitions for the ticketing API

mod auth;

use axum::{middleware, routing::get, Router};

use crate::handlers;
use crate::middleware::{request_tracing, security_headers};
use crate::state::AppState;

pub use auth::auth_routes;

/// Assemble the full application router.
///
/// CORS is left to the caller since it depends on deployment configuration.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .merge(auth_routes(&state))
        .with_state(state)
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_tracing))
}
