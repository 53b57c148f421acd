//! Time-Locked Vault: deposits, receipts, custody, and withdrawal
//!
//! The controller of the system. It owns the access registry, the receipt
//! issuer, the append-only deposit ledger and the pooled custody total.
//!
//! ```text
//! deposit(caller, value, lock)
//!     role check -> amount check -> readiness -> record deposit
//!     -> mint receipt (id must equal deposit id) -> custody += value
//!
//! withdraw(caller, id, payee)
//!     exists -> caller owns receipt -> not withdrawn -> unlocked
//!     -> withdrawn = true, custody -= amount      (effects first)
//!     -> payee.receive(vault, id, amount)          (may re-enter)
//! ```
//!
//! Every state-changing entry point runs inside [`TimeLockedVault::transact`].
//! Appends (deposits, events) are undone by truncation; in-place changes
//! (withdrawn flags, receipt moves, mints, roles, ownership, authority) are
//! written to an undo journal as they happen. A failed call, including one
//! whose payee re-entered and changed things before failing, replays the
//! journal backwards and leaves the vault exactly as it was. The cost of a
//! checkpoint does not depend on how large the ledger is.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lockbox_protocol::config::FIRST_DEPOSIT_ID;
use lockbox_protocol::time::offset_by_secs;
use lockbox_protocol::{Address, Amount, Clock};
use serde::{Deserialize, Serialize};

use crate::access::{AccessRegistry, Role};
use crate::config::VaultConfig;
use crate::custody::Payee;
use crate::errors::VaultError;
use crate::events::VaultEvent;
use crate::receipt::{ReceiptIssuer, TokenId};

/// Deposit identifier; equal to the id of its receipt.
pub type DepositId = u64;

/// A recorded unit of custody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: DepositId,
    pub depositor: Address,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
    pub unlock_time: DateTime<Utc>,
    pub withdrawn: bool,
}

/// Lifecycle position of a deposit at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositStatus {
    /// Recorded, still inside its lock period.
    Created,
    /// Lock expired, not yet withdrawn.
    Unlocked,
    /// Terminal.
    Withdrawn,
}

impl Deposit {
    /// `true` once `now` has reached the unlock time.
    pub fn is_unlocked(&self, now: DateTime<Utc>) -> bool {
        now >= self.unlock_time
    }

    /// Where this deposit stands at `now`. `Unlocked` is derived, never
    /// stored.
    pub fn status(&self, now: DateTime<Utc>) -> DepositStatus {
        if self.withdrawn {
            DepositStatus::Withdrawn
        } else if self.is_unlocked(now) {
            DepositStatus::Unlocked
        } else {
            DepositStatus::Created
        }
    }
}

/// Whether the vault can take deposits yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Readiness {
    /// Minting authority is still held by someone else.
    AwaitingHandoff { authority: Address },
    /// The vault holds minting authority.
    Ready,
}

/// Everything a failed call must leave untouched.
#[derive(Debug)]
struct VaultState {
    registry: AccessRegistry,
    issuer: ReceiptIssuer,
    deposits: Vec<Deposit>,
    custody: Amount,
    events: Vec<VaultEvent>,
}

/// An in-place change made during an operation, with what it replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Undo {
    Withdrawn { index: usize },
    Minted { token_id: TokenId },
    ReceiptMoved { token_id: TokenId, from: Address },
    Authority { previous: Address },
    Role { account: Address, previous: Role },
    Owner { previous: Address },
}

/// Where an operation started. Fixed size regardless of ledger length.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    deposits: usize,
    custody: Amount,
    events: usize,
    journal: usize,
}

/// The vault controller.
pub struct TimeLockedVault {
    address: Address,
    config: VaultConfig,
    clock: Arc<dyn Clock>,
    state: VaultState,
    /// In-place changes made by the in-flight outermost operation.
    journal: Vec<Undo>,
    /// Nesting level of in-flight operations; > 1 means re-entry.
    depth: u32,
}

impl fmt::Debug for TimeLockedVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeLockedVault")
            .field("address", &self.address)
            .field("config", &self.config)
            .field("deposits", &self.state.deposits.len())
            .field("custody", &self.state.custody)
            .finish_non_exhaustive()
    }
}

impl TimeLockedVault {
    /// Create a vault around an untouched receipt issuer.
    ///
    /// The vault starts in [`Readiness::AwaitingHandoff`]; the issuer's
    /// current authority must hand minting authority over with
    /// [`transfer_mint_authority`](Self::transfer_mint_authority) before any
    /// deposit is accepted.
    ///
    /// # Errors
    ///
    /// [`VaultError::IssuerAlreadyUsed`] if the issuer has minted anything:
    /// receipt ids and deposit ids must start in lockstep.
    pub fn new(
        owner: Address,
        issuer: ReceiptIssuer,
        config: VaultConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, VaultError> {
        if issuer.total_supply() > 0 || issuer.next_token_id() != FIRST_DEPOSIT_ID {
            return Err(VaultError::IssuerAlreadyUsed {
                minted: issuer.total_supply(),
            });
        }

        let mut seed = Vec::with_capacity(40);
        seed.extend_from_slice(issuer.address().as_bytes());
        seed.extend_from_slice(owner.as_bytes());
        let address = Address::derive("time-locked-vault", &seed);

        tracing::debug!(vault = %address, owner = %owner, issuer = %issuer.address(), "vault created");

        Ok(Self {
            address,
            config,
            clock,
            state: VaultState {
                registry: AccessRegistry::new(owner),
                issuer,
                deposits: Vec::new(),
                custody: 0,
                events: Vec::new(),
            },
            journal: Vec::new(),
            depth: 0,
        })
    }

    // ───────────────────────── Transactions ─────────────────────────

    /// Run `op` all-or-nothing: on error the state is restored to what it
    /// was on entry.
    fn transact<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        let checkpoint = self.checkpoint();
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;

        match &result {
            Err(err) => {
                self.rollback(checkpoint);
                tracing::warn!(op, depth = self.depth, error = %err, "operation rolled back");
            }
            // Nothing outside can roll a committed top-level call back.
            Ok(_) if self.depth == 0 => self.journal.clear(),
            Ok(_) => {}
        }
        result
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            deposits: self.state.deposits.len(),
            custody: self.state.custody,
            events: self.state.events.len(),
            journal: self.journal.len(),
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint.journal {
            let Some(undo) = self.journal.pop() else { break };
            self.revert(undo);
        }
        self.state.deposits.truncate(checkpoint.deposits);
        self.state.events.truncate(checkpoint.events);
        self.state.custody = checkpoint.custody;
    }

    fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::Withdrawn { index } => {
                if let Some(deposit) = self.state.deposits.get_mut(index) {
                    deposit.withdrawn = false;
                }
            }
            Undo::Minted { token_id } => self.state.issuer.revert_mint(token_id),
            Undo::ReceiptMoved { token_id, from } => {
                self.state.issuer.restore_owner(token_id, from)
            }
            Undo::Authority { previous } => self.state.issuer.restore_authority(previous),
            Undo::Role { account, previous } => {
                self.state.registry.restore_role(account, previous)
            }
            Undo::Owner { previous } => self.state.registry.restore_owner(previous),
        }
    }

    // ───────────────────────── Deposit ─────────────────────────

    /// Lock `value` for `lock_duration_secs` seconds and mint a receipt to
    /// `caller`. Returns the new deposit id.
    ///
    /// # Errors
    ///
    /// Checked in this order: [`VaultError::Unauthorized`] (role),
    /// [`VaultError::InvalidAmount`] (zero value), [`VaultError::NotReady`]
    /// (no minting authority yet), [`VaultError::InvalidLockDuration`],
    /// [`VaultError::Overflow`].
    pub fn deposit(
        &mut self,
        caller: &Address,
        value: Amount,
        lock_duration_secs: u64,
    ) -> Result<DepositId, VaultError> {
        let caller = *caller;
        self.transact("deposit", |vault| {
            vault.record_deposit(caller, value, lock_duration_secs)
        })
    }

    fn record_deposit(
        &mut self,
        caller: Address,
        value: Amount,
        lock_duration_secs: u64,
    ) -> Result<DepositId, VaultError> {
        self.state
            .registry
            .require_any(&caller, self.config.depositor_roles())?;

        if value == 0 {
            return Err(VaultError::InvalidAmount);
        }
        if !self.is_ready() {
            return Err(VaultError::NotReady);
        }

        let now = self.clock.now();
        let unlock_time =
            offset_by_secs(now, lock_duration_secs).ok_or(VaultError::InvalidLockDuration {
                secs: lock_duration_secs,
            })?;
        let custody = self
            .state
            .custody
            .checked_add(value)
            .ok_or(VaultError::Overflow)?;

        let deposit_id = FIRST_DEPOSIT_ID
            .checked_add(self.state.deposits.len() as u64)
            .ok_or(VaultError::Overflow)?;
        let token_id = self.state.issuer.mint(&self.address, caller)?;
        self.journal.push(Undo::Minted { token_id });
        if token_id != deposit_id {
            return Err(VaultError::ReceiptMismatch {
                expected: deposit_id,
                minted: token_id,
            });
        }

        self.state.deposits.push(Deposit {
            id: deposit_id,
            depositor: caller,
            amount: value,
            created_at: now,
            unlock_time,
            withdrawn: false,
        });
        self.state.custody = custody;
        self.state.events.push(VaultEvent::Deposited {
            deposit_id,
            depositor: caller,
            amount: value,
            unlock_time,
        });

        tracing::info!(
            deposit_id,
            depositor = %caller,
            amount = value,
            unlock_time = %unlock_time,
            "deposit recorded"
        );
        Ok(deposit_id)
    }

    // ───────────────────────── Withdraw ─────────────────────────

    /// Release deposit `deposit_id` to `payee` on behalf of `caller`, the
    /// current holder of its receipt. Returns the released amount.
    ///
    /// The deposit is marked withdrawn and custody debited before the payee
    /// runs; a payee that re-enters sees the deposit as already claimed.
    ///
    /// # Errors
    ///
    /// Checked in this order: [`VaultError::NotFound`],
    /// [`VaultError::Unauthorized`] (caller does not hold the receipt),
    /// [`VaultError::AlreadyClaimed`], [`VaultError::TooEarly`]. A payee
    /// failure surfaces as [`VaultError::TransferFailed`] and undoes the
    /// whole call.
    pub fn withdraw(
        &mut self,
        caller: &Address,
        deposit_id: DepositId,
        payee: &mut dyn Payee,
    ) -> Result<Amount, VaultError> {
        let caller = *caller;
        self.transact("withdraw", |vault| {
            vault.release_deposit(caller, deposit_id, payee)
        })
    }

    fn release_deposit(
        &mut self,
        caller: Address,
        deposit_id: DepositId,
        payee: &mut dyn Payee,
    ) -> Result<Amount, VaultError> {
        let index = self
            .index_of(deposit_id)
            .ok_or(VaultError::NotFound { deposit_id })?;

        // Ownership comes from the issuer, not the stored depositor, so a
        // transferred receipt carries the withdrawal right with it.
        let holder = self.state.issuer.owner_of(deposit_id)?;
        if holder != caller {
            return Err(VaultError::Unauthorized);
        }

        let deposit = &self.state.deposits[index];
        if deposit.withdrawn {
            return Err(VaultError::AlreadyClaimed { deposit_id });
        }
        if !deposit.is_unlocked(self.clock.now()) {
            return Err(VaultError::TooEarly {
                deposit_id,
                unlock_time: deposit.unlock_time,
            });
        }

        let amount = deposit.amount;
        let custody = self
            .state
            .custody
            .checked_sub(amount)
            .ok_or(VaultError::Overflow)?;

        // Effects strictly before the release.
        self.state.deposits[index].withdrawn = true;
        self.journal.push(Undo::Withdrawn { index });
        self.state.custody = custody;
        self.state.events.push(VaultEvent::Withdrawn {
            deposit_id,
            recipient: caller,
            amount,
        });

        payee
            .receive(self, deposit_id, amount)
            .map_err(|err| VaultError::TransferFailed {
                deposit_id,
                reason: err.reason,
            })?;

        tracing::info!(deposit_id, recipient = %caller, amount, "deposit withdrawn");
        Ok(amount)
    }

    // ───────────────────────── Access Registry ─────────────────────────

    /// Set `account`'s role. Registry owner only.
    pub fn set_access(
        &mut self,
        caller: &Address,
        account: Address,
        role: Role,
    ) -> Result<(), VaultError> {
        let caller = *caller;
        self.transact("set_access", |vault| {
            let previous = vault
                .state
                .registry
                .set_access(&caller, account, role)?
                .unwrap_or_default();
            vault.journal.push(Undo::Role { account, previous });
            vault.state.events.push(VaultEvent::AccessChanged {
                account,
                previous,
                role,
            });
            tracing::info!(account = %account, %previous, %role, "access changed");
            Ok(())
        })
    }

    /// Role of `account`; `Role::None` when never assigned.
    pub fn role_of(&self, account: &Address) -> Role {
        self.state.registry.role_of(account)
    }

    /// Hand the registry to `new_owner`. Registry owner only.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), VaultError> {
        let caller = *caller;
        self.transact("transfer_ownership", |vault| {
            vault.state.registry.transfer_ownership(&caller, new_owner)?;
            vault.journal.push(Undo::Owner { previous: caller });
            vault.state.events.push(VaultEvent::OwnershipTransferred {
                previous: caller,
                owner: new_owner,
            });
            tracing::info!(previous = %caller, owner = %new_owner, "ownership transferred");
            Ok(())
        })
    }

    /// Registry owner.
    pub fn owner(&self) -> &Address {
        self.state.registry.owner()
    }

    // ───────────────────────── Receipts ─────────────────────────

    /// The issuer's authority handoff, routed through the vault that owns
    /// the issuer. Only the current authority may call it.
    ///
    /// Once the vault itself holds authority the handoff is closed: the
    /// vault's address is public, so accepting it as a caller would let
    /// anyone move authority away.
    ///
    /// # Errors
    ///
    /// [`VaultError::Unauthorized`] when the vault is already ready or
    /// `caller` is not the current authority.
    pub fn transfer_mint_authority(
        &mut self,
        caller: &Address,
        new_holder: Address,
    ) -> Result<(), VaultError> {
        let caller = *caller;
        self.transact("transfer_mint_authority", |vault| {
            if vault.is_ready() {
                return Err(VaultError::Unauthorized);
            }
            let previous = vault.state.issuer.transfer_authority(&caller, new_holder)?;
            vault.journal.push(Undo::Authority { previous });
            vault.state.events.push(VaultEvent::MintAuthorityTransferred {
                previous,
                holder: new_holder,
            });
            Ok(())
        })
    }

    /// Move receipt `token_id` (and with it the withdrawal right) to `to`.
    pub fn transfer_receipt(
        &mut self,
        caller: &Address,
        to: Address,
        token_id: DepositId,
    ) -> Result<(), VaultError> {
        let caller = *caller;
        self.transact("transfer_receipt", |vault| {
            vault.state.issuer.transfer(&caller, to, token_id)?;
            if caller != to {
                vault.journal.push(Undo::ReceiptMoved { token_id, from: caller });
            }
            vault.state.events.push(VaultEvent::ReceiptTransferred {
                token_id,
                from: caller,
                to,
            });
            Ok(())
        })
    }

    /// Current holder of receipt `token_id`.
    pub fn receipt_owner(&self, token_id: DepositId) -> Result<Address, VaultError> {
        Ok(self.state.issuer.owner_of(token_id)?)
    }

    /// Number of receipts held by `account`.
    pub fn receipt_balance(&self, account: &Address) -> u64 {
        self.state.issuer.balance_of(account)
    }

    /// Read access to the receipt issuer.
    pub fn issuer(&self) -> &ReceiptIssuer {
        &self.state.issuer
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Full record of deposit `deposit_id`.
    pub fn get_deposit(&self, deposit_id: DepositId) -> Result<&Deposit, VaultError> {
        self.index_of(deposit_id)
            .map(|index| &self.state.deposits[index])
            .ok_or(VaultError::NotFound { deposit_id })
    }

    /// All deposits, by id.
    pub fn deposits(&self) -> &[Deposit] {
        &self.state.deposits
    }

    /// Deposits originally made by `account`.
    pub fn deposits_of<'a>(&'a self, account: &'a Address) -> impl Iterator<Item = &'a Deposit> {
        self.state
            .deposits
            .iter()
            .filter(move |deposit| deposit.depositor == *account)
    }

    pub fn deposit_count(&self) -> u64 {
        self.state.deposits.len() as u64
    }

    /// Value currently held in custody.
    pub fn custody(&self) -> Amount {
        self.state.custody
    }

    /// Sum of amounts over deposits not yet withdrawn.
    pub fn outstanding(&self) -> u128 {
        self.state
            .deposits
            .iter()
            .filter(|deposit| !deposit.withdrawn)
            .map(|deposit| u128::from(deposit.amount))
            .sum()
    }

    /// Custody equals the outstanding total.
    pub fn custody_invariant_holds(&self) -> bool {
        self.outstanding() == u128::from(self.state.custody)
    }

    pub fn readiness(&self) -> Readiness {
        let authority = *self.state.issuer.authority();
        if authority == self.address {
            Readiness::Ready
        } else {
            Readiness::AwaitingHandoff { authority }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.readiness() == Readiness::Ready
    }

    /// This vault's identity; the address minting authority is handed to.
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The vault's idea of "now".
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// `true` while an operation is executing, i.e. when called from inside
    /// a payee.
    pub fn in_operation(&self) -> bool {
        self.depth > 0
    }

    // ───────────────────────── Events ─────────────────────────

    pub fn events(&self) -> &[VaultEvent] {
        &self.state.events
    }

    /// Take all events, leaving the log empty.
    ///
    /// Returns nothing while an operation is in flight: those events may
    /// still be rolled back.
    pub fn drain_events(&mut self) -> Vec<VaultEvent> {
        if self.in_operation() {
            return Vec::new();
        }
        std::mem::take(&mut self.state.events)
    }

    fn index_of(&self, deposit_id: DepositId) -> Option<usize> {
        let index = usize::try_from(deposit_id.checked_sub(FIRST_DEPOSIT_ID)?).ok()?;
        (index < self.state.deposits.len()).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::{PayoutError, Purse};
    use crate::receipt::ReceiptMetadata;
    use lockbox_protocol::ManualClock;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn setup() -> (TimeLockedVault, ManualClock) {
        let clock = ManualClock::new();
        let deployer = addr("deployer");
        let issuer = ReceiptIssuer::new(deployer, ReceiptMetadata::default());
        let mut vault = TimeLockedVault::new(
            addr("owner"),
            issuer,
            VaultConfig::default(),
            Arc::new(clock.clone()),
        )
        .unwrap();
        let vault_address = *vault.address();
        vault
            .transfer_mint_authority(&deployer, vault_address)
            .unwrap();
        vault
            .set_access(&addr("owner"), addr("alice"), Role::User)
            .unwrap();
        (vault, clock)
    }

    #[test]
    fn test_deposit_records_and_mints() {
        let (mut vault, _clock) = setup();
        let id = vault.deposit(&addr("alice"), 500, 10).unwrap();
        assert_eq!(id, 0);

        let deposit = vault.get_deposit(id).unwrap();
        assert_eq!(deposit.amount, 500);
        assert_eq!(deposit.depositor, addr("alice"));
        assert!(!deposit.withdrawn);
        assert_eq!(vault.receipt_owner(id).unwrap(), addr("alice"));
        assert_eq!(vault.custody(), 500);
    }

    #[test]
    fn test_zero_value_rejected() {
        let (mut vault, _clock) = setup();
        assert_eq!(
            vault.deposit(&addr("alice"), 0, 10),
            Err(VaultError::InvalidAmount)
        );
        assert_eq!(vault.deposit_count(), 0);
    }

    #[test]
    fn test_zero_lock_is_immediately_withdrawable() {
        let (mut vault, _clock) = setup();
        let id = vault.deposit(&addr("alice"), 10, 0).unwrap();
        let mut purse = Purse::new();
        assert_eq!(vault.withdraw(&addr("alice"), id, &mut purse), Ok(10));
    }

    #[test]
    fn test_unrepresentable_lock_rejected() {
        let (mut vault, _clock) = setup();
        assert_eq!(
            vault.deposit(&addr("alice"), 10, u64::MAX),
            Err(VaultError::InvalidLockDuration { secs: u64::MAX })
        );
        assert_eq!(vault.receipt_balance(&addr("alice")), 0);
    }

    #[test]
    fn test_custody_overflow_rolls_back() {
        let (mut vault, _clock) = setup();
        vault.deposit(&addr("alice"), u64::MAX, 0).unwrap();
        assert_eq!(
            vault.deposit(&addr("alice"), 1, 0),
            Err(VaultError::Overflow)
        );
        assert_eq!(vault.deposit_count(), 1);
        assert_eq!(vault.receipt_balance(&addr("alice")), 1);
    }

    #[test]
    fn test_deposit_status_follows_clock() {
        let (mut vault, clock) = setup();
        let id = vault.deposit(&addr("alice"), 10, 60).unwrap();
        assert_eq!(
            vault.get_deposit(id).unwrap().status(vault.now()),
            DepositStatus::Created
        );
        clock.advance(60);
        assert_eq!(
            vault.get_deposit(id).unwrap().status(vault.now()),
            DepositStatus::Unlocked
        );
        vault.withdraw(&addr("alice"), id, &mut Purse::new()).unwrap();
        assert_eq!(
            vault.get_deposit(id).unwrap().status(vault.now()),
            DepositStatus::Withdrawn
        );
    }

    #[test]
    fn test_issuer_with_supply_rejected() {
        let deployer = addr("deployer");
        let mut issuer = ReceiptIssuer::new(deployer, ReceiptMetadata::default());
        issuer.mint(&deployer, deployer).unwrap();
        let result = TimeLockedVault::new(
            addr("owner"),
            issuer,
            VaultConfig::default(),
            Arc::new(ManualClock::new()),
        );
        assert!(matches!(result, Err(VaultError::IssuerAlreadyUsed { minted: 1 })));
    }

    #[test]
    fn test_get_deposit_not_found() {
        let (vault, _clock) = setup();
        assert_eq!(
            vault.get_deposit(0).unwrap_err(),
            VaultError::NotFound { deposit_id: 0 }
        );
    }

    #[test]
    fn test_deposits_of_filters_by_depositor() {
        let (mut vault, _clock) = setup();
        vault
            .set_access(&addr("owner"), addr("bob"), Role::User)
            .unwrap();
        vault.deposit(&addr("alice"), 1, 0).unwrap();
        vault.deposit(&addr("bob"), 2, 0).unwrap();
        vault.deposit(&addr("alice"), 3, 0).unwrap();

        let ids: Vec<_> = vault.deposits_of(&addr("alice")).map(|d| d.id).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn test_failed_call_leaves_no_event() {
        let (mut vault, _clock) = setup();
        let before = vault.events().len();
        let _ = vault.deposit(&addr("stranger"), 10, 0);
        assert_eq!(vault.events().len(), before);
    }

    #[test]
    fn test_drain_events() {
        let (mut vault, _clock) = setup();
        vault.deposit(&addr("alice"), 10, 0).unwrap();
        let drained = vault.drain_events();
        assert!(drained
            .iter()
            .any(|e| matches!(e, VaultEvent::Deposited { deposit_id: 0, .. })));
        assert!(vault.events().is_empty());
    }

    /// Re-enters with a deposit and a role change, then refuses.
    struct Refuse;

    impl Payee for Refuse {
        fn receive(
            &mut self,
            vault: &mut TimeLockedVault,
            _deposit_id: DepositId,
            amount: Amount,
        ) -> Result<(), PayoutError> {
            assert!(vault.drain_events().is_empty());
            let _ = vault.deposit(&addr("alice"), amount, 0);
            let _ = vault.set_access(&addr("owner"), addr("bob"), Role::Admin);
            Err(PayoutError::new("no"))
        }
    }

    #[test]
    fn test_journal_is_empty_after_commit_and_rollback() {
        let (mut vault, _clock) = setup();
        let id = vault.deposit(&addr("alice"), 10, 0).unwrap();
        assert!(vault.journal.is_empty());

        assert!(vault.withdraw(&addr("alice"), id, &mut Refuse).is_err());
        assert!(vault.journal.is_empty());
        assert_eq!(vault.deposit_count(), 1);
        assert_eq!(vault.issuer().next_token_id(), 1);
        assert_eq!(vault.role_of(&addr("bob")), Role::None);
        assert!(!vault.get_deposit(id).unwrap().withdrawn);
        assert_eq!(vault.custody(), 10);
    }

    #[test]
    fn test_nested_failure_keeps_outer_changes() {
        let (mut vault, _clock) = setup();
        let id = vault.deposit(&addr("alice"), 10, 0).unwrap();

        struct NestedFailure;
        impl Payee for NestedFailure {
            fn receive(
                &mut self,
                vault: &mut TimeLockedVault,
                _deposit_id: DepositId,
                _amount: Amount,
            ) -> Result<(), PayoutError> {
                // Unauthorized inside; only this inner call unwinds.
                let _ = vault.deposit(&addr("stranger"), 5, 0);
                Ok(())
            }
        }

        assert_eq!(vault.withdraw(&addr("alice"), id, &mut NestedFailure), Ok(10));
        assert!(vault.get_deposit(id).unwrap().withdrawn);
        assert_eq!(vault.custody(), 0);
        assert!(vault.journal.is_empty());
    }

    #[test]
    fn test_not_in_operation_between_calls() {
        let (mut vault, _clock) = setup();
        vault.deposit(&addr("alice"), 10, 0).unwrap();
        assert!(!vault.in_operation());
    }
}
