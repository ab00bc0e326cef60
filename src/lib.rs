//! Ticketing API Library
//!
//! Stellar wallet authentication for the event-ticketing backend: a wallet
//! signs a fixed challenge, the account is confirmed on Horizon, and a
//! stateless JWT session is handed out as a cookie.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
