//! Custody payout: how value leaves the vault
//!
//! A withdrawal ends with the vault handing `amount` to a [`Payee`]. This is
//! the only point where code outside the ledger runs in the middle of an
//! operation, and the payee is given mutable access to the vault so that it
//! *can* call back in. By the time the payee runs, the deposit is already
//! marked withdrawn and custody already debited, so any re-entrant withdraw
//! of the same deposit is rejected as already claimed.
//!
//! A payee that returns an error aborts the withdrawal; the vault then
//! restores its pre-call state, including whatever a nested call changed.

use lockbox_protocol::Amount;
use thiserror::Error;

use crate::vault::{DepositId, TimeLockedVault};

/// The payee refused or could not accept the value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payout rejected: {reason}")]
pub struct PayoutError {
    pub reason: String,
}

impl PayoutError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Receiver of released custody value.
pub trait Payee {
    /// Accept `amount` released from deposit `deposit_id`.
    ///
    /// `vault` is the vault performing the release. Implementations may call
    /// back into it; those calls observe the deposit as already withdrawn.
    fn receive(
        &mut self,
        vault: &mut TimeLockedVault,
        deposit_id: DepositId,
        amount: Amount,
    ) -> Result<(), PayoutError>;
}

/// A plain balance that accepts every payout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Purse {
    balance: Amount,
    received: Vec<(DepositId, Amount)>,
}

impl Purse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total value received so far.
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Every payout received, in order.
    pub fn received(&self) -> &[(DepositId, Amount)] {
        &self.received
    }
}

impl Payee for Purse {
    fn receive(
        &mut self,
        _vault: &mut TimeLockedVault,
        deposit_id: DepositId,
        amount: Amount,
    ) -> Result<(), PayoutError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| PayoutError::new("purse balance overflow"))?;
        self.received.push((deposit_id, amount));
        Ok(())
    }
}
