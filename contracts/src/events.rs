//! Vault events
//!
//! Immutable records appended by successful operations. Events are part of
//! the vault state, so a rolled-back call leaves none behind.

use chrono::{DateTime, Utc};
use lockbox_protocol::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::access::Role;

/// Everything the vault reports to the outside world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VaultEvent {
    /// A deposit was recorded and its receipt minted.
    Deposited {
        deposit_id: u64,
        depositor: Address,
        amount: Amount,
        unlock_time: DateTime<Utc>,
    },
    /// A deposit's value was released to its receipt holder.
    Withdrawn {
        deposit_id: u64,
        recipient: Address,
        amount: Amount,
    },
    /// The registry owner changed an account's role.
    AccessChanged {
        account: Address,
        previous: Role,
        role: Role,
    },
    /// Registry ownership moved.
    OwnershipTransferred { previous: Address, owner: Address },
    /// Minting authority moved (bring-up handoff).
    MintAuthorityTransferred { previous: Address, holder: Address },
    /// A receipt changed hands, carrying its withdrawal right.
    ReceiptTransferred {
        token_id: u64,
        from: Address,
        to: Address,
    },
}

impl VaultEvent {
    /// Short, stable name of the event kind, for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            VaultEvent::Deposited { .. } => "deposited",
            VaultEvent::Withdrawn { .. } => "withdrawn",
            VaultEvent::AccessChanged { .. } => "access_changed",
            VaultEvent::OwnershipTransferred { .. } => "ownership_transferred",
            VaultEvent::MintAuthorityTransferred { .. } => "mint_authority_transferred",
            VaultEvent::ReceiptTransferred { .. } => "receipt_transferred",
        }
    }
}
