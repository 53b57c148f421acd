//! Contract-specific error types
//!
//! One enum per component. [`VaultError`] is the flat taxonomy callers see
//! at the controller boundary; component errors fold into it.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Access registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Unauthorized: caller is not the registry owner")]
    Unauthorized,

    #[error("Invalid role code: {0}")]
    InvalidRole(u8),
}

/// Receipt issuer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReceiptError {
    #[error("Unauthorized: caller does not hold minting authority")]
    Unauthorized,

    #[error("Caller does not own receipt {token_id}")]
    NotTokenOwner { token_id: u64 },

    #[error("Receipt does not exist: {0}")]
    NonexistentToken(u64),

    #[error("Arithmetic overflow in receipt bookkeeping")]
    Overflow,
}

/// Vault controller errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Deposit amount must be positive")]
    InvalidAmount,

    #[error("Vault not ready: minting authority has not been handed over")]
    NotReady,

    #[error("Lock duration of {secs}s overflows the unlock time")]
    InvalidLockDuration { secs: u64 },

    #[error("Deposit {deposit_id} is locked until {unlock_time}")]
    TooEarly {
        deposit_id: u64,
        unlock_time: DateTime<Utc>,
    },

    #[error("Deposit {deposit_id} already claimed")]
    AlreadyClaimed { deposit_id: u64 },

    #[error("Deposit not found: {deposit_id}")]
    NotFound { deposit_id: u64 },

    #[error("Transfer of deposit {deposit_id} failed: {reason}")]
    TransferFailed { deposit_id: u64, reason: String },

    #[error("Receipt id {minted} does not match deposit id {expected}")]
    ReceiptMismatch { expected: u64, minted: u64 },

    #[error("Issuer already minted {minted} receipts before adoption")]
    IssuerAlreadyUsed { minted: u64 },

    #[error("Arithmetic overflow in custody calculation")]
    Overflow,
}

impl From<AccessError> for VaultError {
    fn from(err: AccessError) -> Self {
        match err {
            // Role codes are validated before they reach the vault.
            AccessError::Unauthorized | AccessError::InvalidRole(_) => VaultError::Unauthorized,
        }
    }
}

impl From<ReceiptError> for VaultError {
    fn from(err: ReceiptError) -> Self {
        match err {
            ReceiptError::Unauthorized | ReceiptError::NotTokenOwner { .. } => {
                VaultError::Unauthorized
            }
            ReceiptError::NonexistentToken(id) => VaultError::NotFound { deposit_id: id },
            ReceiptError::Overflow => VaultError::Overflow,
        }
    }
}

impl VaultError {
    /// Stable snake_case name of the variant, for metrics labels and script
    /// output.
    pub fn kind(&self) -> &'static str {
        match self {
            VaultError::Unauthorized => "unauthorized",
            VaultError::InvalidAmount => "invalid_amount",
            VaultError::NotReady => "not_ready",
            VaultError::InvalidLockDuration { .. } => "invalid_lock_duration",
            VaultError::TooEarly { .. } => "too_early",
            VaultError::AlreadyClaimed { .. } => "already_claimed",
            VaultError::NotFound { .. } => "not_found",
            VaultError::TransferFailed { .. } => "transfer_failed",
            VaultError::ReceiptMismatch { .. } => "receipt_mismatch",
            VaultError::IssuerAlreadyUsed { .. } => "issuer_already_used",
            VaultError::Overflow => "overflow",
        }
    }

    /// `true` for failures caused by the caller (bad input, wrong timing,
    /// missing permission); `false` for system failures.
    pub fn is_caller_error(&self) -> bool {
        !matches!(
            self,
            VaultError::TransferFailed { .. }
                | VaultError::ReceiptMismatch { .. }
                | VaultError::IssuerAlreadyUsed { .. }
                | VaultError::Overflow
        )
    }
}
