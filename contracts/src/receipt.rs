//! # Receipt Issuer
//!
//! Mints and tracks the non-fungible receipts that stand for deposits. Each
//! receipt has a sequential id starting at 0 and exactly one owner.
//!
//! ## Security Model
//!
//! - **Mint gating**: only the current *minting authority* may mint. At
//!   construction that is the deployer; during bring-up the deployer hands it
//!   to the vault with [`ReceiptIssuer::transfer_authority`] and loses it for
//!   good. After that, receipts only come into existence through a vault
//!   deposit.
//! - **Transfer authorization**: only a receipt's current owner can move it.
//!   Whoever holds the receipt holds the withdrawal right.
//! - **Supply tracking**: total supply and per-account balances are updated
//!   together; overflow is checked on every operation.

use std::collections::{BTreeMap, HashMap};

use lockbox_protocol::config::{DEFAULT_RECEIPT_NAME, DEFAULT_RECEIPT_SYMBOL, FIRST_DEPOSIT_ID};
use lockbox_protocol::Address;
use serde::{Deserialize, Serialize};

use crate::errors::ReceiptError;

/// Receipt identifier. Equal to the id of the deposit it represents.
pub type TokenId = u64;

/// Collection-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptMetadata {
    /// Human-readable collection name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
}

impl Default for ReceiptMetadata {
    fn default() -> Self {
        Self {
            name: DEFAULT_RECEIPT_NAME.to_string(),
            symbol: DEFAULT_RECEIPT_SYMBOL.to_string(),
        }
    }
}

/// The receipt ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptIssuer {
    /// This issuer's own identity.
    address: Address,
    metadata: ReceiptMetadata,
    /// Holder of the exclusive right to mint.
    authority: Address,
    next_token_id: TokenId,
    /// `token_id -> owner`. Ordered so listings come out by id.
    owners: BTreeMap<TokenId, Address>,
    /// `owner -> number of receipts held`.
    balances: HashMap<Address, u64>,
}

impl ReceiptIssuer {
    /// Creates an empty issuer. `deployer` holds minting authority until it
    /// hands it over.
    pub fn new(deployer: Address, metadata: ReceiptMetadata) -> Self {
        let address = Address::derive("receipt-issuer", deployer.as_bytes());
        tracing::debug!(
            issuer = %address,
            authority = %deployer,
            symbol = %metadata.symbol,
            "receipt issuer created"
        );
        Self {
            address,
            metadata,
            authority: deployer,
            next_token_id: FIRST_DEPOSIT_ID,
            owners: BTreeMap::new(),
            balances: HashMap::new(),
        }
    }

    /// Mints the next receipt to `to` and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::Unauthorized`] if `caller` is not the minting
    /// authority, [`ReceiptError::Overflow`] if ids are exhausted.
    pub fn mint(&mut self, caller: &Address, to: Address) -> Result<TokenId, ReceiptError> {
        self.require_authority(caller)?;

        let token_id = self.next_token_id;
        let next = token_id.checked_add(1).ok_or(ReceiptError::Overflow)?;
        let balance = self.balances.get(&to).copied().unwrap_or(0);
        let new_balance = balance.checked_add(1).ok_or(ReceiptError::Overflow)?;

        self.owners.insert(token_id, to);
        self.balances.insert(to, new_balance);
        self.next_token_id = next;

        tracing::debug!(token_id, owner = %to, "receipt minted");
        Ok(token_id)
    }

    /// Hands minting authority to `new_holder`. Only the current authority
    /// may call this, so once the vault holds authority nobody can take it
    /// back without the vault's cooperation.
    pub fn transfer_authority(
        &mut self,
        caller: &Address,
        new_holder: Address,
    ) -> Result<Address, ReceiptError> {
        self.require_authority(caller)?;
        let previous = std::mem::replace(&mut self.authority, new_holder);
        tracing::info!(from = %previous, to = %new_holder, "minting authority transferred");
        Ok(previous)
    }

    /// Moves receipt `token_id` from its owner to `to`.
    ///
    /// # Errors
    ///
    /// [`ReceiptError::NonexistentToken`] for unknown ids,
    /// [`ReceiptError::NotTokenOwner`] if `caller` does not own the receipt.
    pub fn transfer(
        &mut self,
        caller: &Address,
        to: Address,
        token_id: TokenId,
    ) -> Result<(), ReceiptError> {
        let owner = self.owner_of(token_id)?;
        if owner != *caller {
            return Err(ReceiptError::NotTokenOwner { token_id });
        }
        if owner == to {
            return Ok(());
        }

        let from_balance = self
            .balances
            .get(&owner)
            .copied()
            .unwrap_or(0)
            .checked_sub(1)
            .ok_or(ReceiptError::Overflow)?;
        let to_balance = self
            .balances
            .get(&to)
            .copied()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or(ReceiptError::Overflow)?;

        if from_balance == 0 {
            self.balances.remove(&owner);
        } else {
            self.balances.insert(owner, from_balance);
        }
        self.balances.insert(to, to_balance);
        self.owners.insert(token_id, to);

        tracing::debug!(token_id, from = %owner, to = %to, "receipt transferred");
        Ok(())
    }

    /// Removes the receipt minted as `token_id` and rewinds the id counter.
    /// Only valid for the most recent mint.
    pub(crate) fn revert_mint(&mut self, token_id: TokenId) {
        if let Some(owner) = self.owners.remove(&token_id) {
            self.debit(owner);
        }
        self.next_token_id = token_id;
    }

    /// Moves `token_id` back to `previous` without an ownership check.
    pub(crate) fn restore_owner(&mut self, token_id: TokenId, previous: Address) {
        if let Some(current) = self.owners.insert(token_id, previous) {
            self.debit(current);
        }
        let balance = self.balances.entry(previous).or_insert(0);
        *balance = balance.saturating_add(1);
    }

    pub(crate) fn restore_authority(&mut self, previous: Address) {
        self.authority = previous;
    }

    fn debit(&mut self, account: Address) {
        match self.balances.get(&account).copied() {
            Some(balance) if balance > 1 => {
                self.balances.insert(account, balance - 1);
            }
            _ => {
                self.balances.remove(&account);
            }
        }
    }

    /// Owner of `token_id`.
    pub fn owner_of(&self, token_id: TokenId) -> Result<Address, ReceiptError> {
        self.owners
            .get(&token_id)
            .copied()
            .ok_or(ReceiptError::NonexistentToken(token_id))
    }

    /// Number of receipts held by `account`.
    pub fn balance_of(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Total receipts ever minted. Receipts are never burned.
    pub fn total_supply(&self) -> u64 {
        self.owners.len() as u64
    }

    /// Ids of the receipts currently held by `account`, ascending.
    pub fn tokens_of(&self, account: &Address) -> Vec<TokenId> {
        self.owners
            .iter()
            .filter(|(_, owner)| *owner == account)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Current minting authority.
    pub fn authority(&self) -> &Address {
        &self.authority
    }

    /// This issuer's identity.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Collection metadata.
    pub fn metadata(&self) -> &ReceiptMetadata {
        &self.metadata
    }

    /// Id the next mint will assign.
    pub fn next_token_id(&self) -> TokenId {
        self.next_token_id
    }

    fn require_authority(&self, caller: &Address) -> Result<(), ReceiptError> {
        if *caller != self.authority {
            return Err(ReceiptError::Unauthorized);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn issuer() -> ReceiptIssuer {
        ReceiptIssuer::new(addr("deployer"), ReceiptMetadata::default())
    }

    #[test]
    fn mint_assigns_sequential_ids() {
        let mut issuer = issuer();
        let deployer = addr("deployer");
        assert_eq!(issuer.mint(&deployer, addr("alice")).unwrap(), 0);
        assert_eq!(issuer.mint(&deployer, addr("bob")).unwrap(), 1);
        assert_eq!(issuer.mint(&deployer, addr("alice")).unwrap(), 2);
        assert_eq!(issuer.total_supply(), 3);
        assert_eq!(issuer.balance_of(&addr("alice")), 2);
        assert_eq!(issuer.tokens_of(&addr("alice")), vec![0, 2]);
    }

    #[test]
    fn reverting_mint_restores_counter_and_balance() {
        let mut issuer = issuer();
        let deployer = addr("deployer");
        issuer.mint(&deployer, addr("alice")).unwrap();
        let second = issuer.mint(&deployer, addr("alice")).unwrap();

        issuer.revert_mint(second);
        assert_eq!(issuer.total_supply(), 1);
        assert_eq!(issuer.balance_of(&addr("alice")), 1);
        assert_eq!(issuer.next_token_id(), second);
        assert_eq!(issuer.mint(&deployer, addr("bob")).unwrap(), second);
    }

    #[test]
    fn restoring_owner_undoes_transfer() {
        let mut issuer = issuer();
        let deployer = addr("deployer");
        let id = issuer.mint(&deployer, addr("alice")).unwrap();
        issuer.transfer(&addr("alice"), addr("bob"), id).unwrap();

        issuer.restore_owner(id, addr("alice"));
        assert_eq!(issuer.owner_of(id), Ok(addr("alice")));
        assert_eq!(issuer.balance_of(&addr("alice")), 1);
        assert_eq!(issuer.balance_of(&addr("bob")), 0);
    }

    #[test]
    fn mint_by_non_authority_rejected() {
        let mut issuer = issuer();
        let result = issuer.mint(&addr("mallory"), addr("mallory"));
        assert_eq!(result, Err(ReceiptError::Unauthorized));
        assert_eq!(issuer.total_supply(), 0);
    }

    #[test]
    fn authority_handoff_is_one_directional() {
        let mut issuer = issuer();
        let deployer = addr("deployer");
        let vault = addr("vault");

        let previous = issuer.transfer_authority(&deployer, vault).unwrap();
        assert_eq!(previous, deployer);
        assert_eq!(issuer.authority(), &vault);

        // The deployer is now just another account.
        assert_eq!(
            issuer.mint(&deployer, deployer),
            Err(ReceiptError::Unauthorized)
        );
        assert_eq!(
            issuer.transfer_authority(&deployer, deployer),
            Err(ReceiptError::Unauthorized)
        );
        assert!(issuer.mint(&vault, addr("alice")).is_ok());
    }

    #[test]
    fn owner_of_unknown_token() {
        let issuer = issuer();
        assert_eq!(issuer.owner_of(42), Err(ReceiptError::NonexistentToken(42)));
    }

    #[test]
    fn transfer_moves_ownership_and_balances() {
        let mut issuer = issuer();
        let deployer = addr("deployer");
        let id = issuer.mint(&deployer, addr("alice")).unwrap();

        issuer.transfer(&addr("alice"), addr("bob"), id).unwrap();
        assert_eq!(issuer.owner_of(id).unwrap(), addr("bob"));
        assert_eq!(issuer.balance_of(&addr("alice")), 0);
        assert_eq!(issuer.balance_of(&addr("bob")), 1);
    }

    #[test]
    fn transfer_by_non_owner_rejected() {
        let mut issuer = issuer();
        let id = issuer.mint(&addr("deployer"), addr("alice")).unwrap();
        let result = issuer.transfer(&addr("mallory"), addr("mallory"), id);
        assert_eq!(result, Err(ReceiptError::NotTokenOwner { token_id: id }));
        assert_eq!(issuer.owner_of(id).unwrap(), addr("alice"));
    }

    #[test]
    fn transfer_to_self_is_noop() {
        let mut issuer = issuer();
        let id = issuer.mint(&addr("deployer"), addr("alice")).unwrap();
        issuer.transfer(&addr("alice"), addr("alice"), id).unwrap();
        assert_eq!(issuer.balance_of(&addr("alice")), 1);
    }

    #[test]
    fn default_metadata() {
        let issuer = issuer();
        assert_eq!(issuer.metadata().symbol, DEFAULT_RECEIPT_SYMBOL);
        assert_eq!(issuer.next_token_id(), FIRST_DEPOSIT_ID);
    }
}
