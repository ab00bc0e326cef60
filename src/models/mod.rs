//! Request and response models for the ticketing API

use serde::Serialize;

pub mod auth;
pub use auth::*;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}
