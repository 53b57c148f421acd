//! Runtime configuration for a vault deployment.
//!
//! Loaded from JSON by the binary; every field has a default so an empty
//! object (`{}`) is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::access::Role;
use crate::receipt::ReceiptMetadata;

/// Per-deployment knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultConfig {
    /// Whether accounts with `Role::Admin` may deposit like `Role::User`.
    /// When `false`, admins are limited to administrative operations.
    pub admin_may_deposit: bool,
    /// Receipt collection name.
    pub receipt_name: String,
    /// Receipt ticker symbol.
    pub receipt_symbol: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        let metadata = ReceiptMetadata::default();
        Self {
            admin_may_deposit: true,
            receipt_name: metadata.name,
            receipt_symbol: metadata.symbol,
        }
    }
}

impl VaultConfig {
    /// Parses a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Roles allowed through the deposit guard.
    pub fn depositor_roles(&self) -> &'static [Role] {
        if self.admin_may_deposit {
            &[Role::User, Role::Admin]
        } else {
            &[Role::User]
        }
    }

    /// Receipt metadata derived from this configuration.
    pub fn receipt_metadata(&self) -> ReceiptMetadata {
        ReceiptMetadata {
            name: self.receipt_name.clone(),
            symbol: self.receipt_symbol.clone(),
        }
    }
}
