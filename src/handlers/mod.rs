//! API handlers for the ticketing backend

pub mod auth;

use axum::Json;

use crate::models::HealthResponse;

pub use auth::*;

// Re-export SessionUser from middleware for handler use
pub use crate::middleware::SessionUser;

/// GET / - Service health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "API is up and running successfully!".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
