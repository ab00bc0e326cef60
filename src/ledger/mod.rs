//! Ledger domain module
//!
//! Read-only access to Stellar accounts: the lookup seam used by the
//! authenticator and its Horizon-backed implementation.

mod horizon;
mod model;

pub use horizon::HorizonClient;
pub use model::*;

use async_trait::async_trait;
use thiserror::Error;

/// Ledger lookup errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account not found")]
    AccountNotFound,

    #[error("Ledger service unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected ledger response: {0}")]
    InvalidResponse(String),
}

/// Remote read of account existence and balances
#[async_trait]
pub trait LedgerAccountLookup: Send + Sync {
    async fn fetch_account(&self, account_id: &str) -> Result<AccountRecord, LedgerError>;
}
