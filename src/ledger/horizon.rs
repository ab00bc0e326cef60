//! Horizon API client
//!
//! Account lookups go straight to Horizon over HTTP rather than through a
//! Stellar SDK.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::{AccountRecord, LedgerAccountLookup, LedgerError};

/// Account lookup against a Horizon server
#[derive(Clone)]
pub struct HorizonClient {
    horizon_url: String,
    client: Client,
}

impl HorizonClient {
    /// Create a client whose requests give up after `timeout`
    pub fn new(horizon_url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        Ok(Self {
            horizon_url: horizon_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn horizon_url(&self) -> &str {
        &self.horizon_url
    }
}

#[async_trait]
impl LedgerAccountLookup for HorizonClient {
    async fn fetch_account(&self, account_id: &str) -> Result<AccountRecord, LedgerError> {
        let url = format!("{}/accounts/{}", self.horizon_url, account_id);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                LedgerError::Unavailable(format!("request to {} timed out", url))
            } else {
                LedgerError::Unavailable(e.to_string())
            }
        })?;

        match response.status() {
            // Horizon rejects ids it cannot parse with 400
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
                return Err(LedgerError::AccountNotFound)
            }
            status if !status.is_success() => {
                return Err(LedgerError::Unavailable(format!(
                    "Horizon responded with {}",
                    status
                )))
            }
            _ => {}
        }

        let account = response
            .json::<AccountRecord>()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            account_id = %account.id,
            balances = account.balances.len(),
            "Fetched account from Horizon"
        );

        Ok(account)
    }
}
