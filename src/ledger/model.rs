//! Ledger account models

use serde::{Deserialize, Serialize};

/// Asset type Horizon reports for lumens
pub const NATIVE_ASSET_TYPE: &str = "native";

/// A single balance line of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset_type: String,
    /// Horizon calls this field `balance`
    #[serde(alias = "balance")]
    pub amount: String,
}

impl Balance {
    pub fn is_native(&self) -> bool {
        self.asset_type == NATIVE_ASSET_TYPE
    }
}

/// Account as returned by the ledger, fetched fresh per authentication attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: String,
    #[serde(default)]
    pub balances: Vec<Balance>,
}

impl AccountRecord {
    /// Balances in the network's native asset, in ledger order
    pub fn native_balances(&self) -> Vec<Balance> {
        self.balances
            .iter()
            .filter(|b| b.is_native())
            .cloned()
            .collect()
    }
}
