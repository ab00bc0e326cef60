//! Authentication request/response DTOs

use serde::{Deserialize, Serialize};

use crate::ledger::{AccountRecord, Balance};

/// Body of `POST /auth/stellar`.
///
/// Both fields are optional here so that a missing field is reported as a
/// malformed request by the authenticator rather than rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct StellarAuthRequest {
    #[serde(default, alias = "publicKey")]
    pub public_key: Option<String>,
    /// Base64-encoded signature over the auth challenge
    #[serde(default, alias = "signedChallenge")]
    pub signed_challenge: Option<String>,
}

/// Account details returned after a successful login
#[derive(Debug, Serialize)]
pub struct AccountInfo {
    pub public_key: String,
    pub balances: Vec<Balance>,
}

impl AccountInfo {
    /// Response view of an account: only native-asset balances are exposed
    pub fn from_account(public_key: &str, account: &AccountRecord) -> Self {
        Self {
            public_key: public_key.to_string(),
            balances: account.native_balances(),
        }
    }
}

/// Response of a successful login
#[derive(Debug, Serialize)]
pub struct StellarAuthResponse {
    pub message: String,
    pub account_info: AccountInfo,
}

/// Response of `GET /auth/me`
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub public_key: String,
}

/// Generic acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
