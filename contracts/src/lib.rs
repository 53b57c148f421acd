//! # Lockbox Contracts
//!
//! The ledger core of Lockbox: a custodial escrow where a depositor locks
//! value for a chosen duration and receives a non-fungible receipt that is
//! the sole credential for getting the value back once the lock expires.
//!
//! - **Access Registry** ([`access`]): who may deposit; mutated only by the
//!   owner.
//! - **Receipt Issuer** ([`receipt`]): one receipt token per deposit, minted
//!   only by whoever holds minting authority (the vault, after bring-up).
//! - **Time-Locked Vault** ([`vault`]): the controller: deposit ledger,
//!   pooled custody, time-lock and withdrawal rules.
//! - **Custody payout** ([`custody`]): the seam through which value leaves
//!   the vault, and the one place external code runs mid-operation.
//! - **Bring-up** ([`deployment`]): the staged construction sequence.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow. `checked_add` and
//!    `checked_sub` everywhere, because wrapping arithmetic and money do not
//!    mix.
//! 2. Every state-changing call is all-or-nothing. A failed call leaves no
//!    trace: no ledger entry, no stray receipt, no event.
//! 3. State is flipped before value leaves. Anything that re-enters during a
//!    payout sees the post-withdrawal world.
//! 4. Every public record type is serializable (serde) for snapshots and
//!    event export.

pub mod access;
pub mod config;
pub mod custody;
pub mod deployment;
pub mod errors;
pub mod events;
pub mod receipt;
pub mod vault;

pub use access::{AccessRegistry, Role};
pub use config::VaultConfig;
pub use custody::{Payee, PayoutError, Purse};
pub use deployment::deploy;
pub use errors::{AccessError, ReceiptError, VaultError};
pub use events::VaultEvent;
pub use receipt::{ReceiptIssuer, ReceiptMetadata, TokenId};
pub use vault::{Deposit, DepositId, DepositStatus, Readiness, TimeLockedVault};
