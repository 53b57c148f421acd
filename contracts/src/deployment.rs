//! Vault bring-up.
//!
//! The issuer must exist before the vault, and the vault must end up as the
//! issuer's only minting authority. That cycle is broken in three explicit
//! steps; none of them happens as a side effect of a constructor.

use std::sync::Arc;

use lockbox_protocol::{Address, Clock};

use crate::config::VaultConfig;
use crate::errors::VaultError;
use crate::receipt::ReceiptIssuer;
use crate::vault::TimeLockedVault;

/// Deploy a ready vault: create the issuer as `deployer`, create the vault
/// for `owner`, then hand minting authority from `deployer` to the vault.
pub fn deploy(
    deployer: Address,
    owner: Address,
    config: VaultConfig,
    clock: Arc<dyn Clock>,
) -> Result<TimeLockedVault, VaultError> {
    let issuer = ReceiptIssuer::new(deployer, config.receipt_metadata());
    tracing::info!(step = 1, issuer = %issuer.address(), deployer = %deployer, "receipt issuer deployed");

    let mut vault = TimeLockedVault::new(owner, issuer, config, clock)?;
    tracing::info!(step = 2, vault = %vault.address(), owner = %owner, "vault deployed");

    let vault_address = *vault.address();
    vault.transfer_mint_authority(&deployer, vault_address)?;
    tracing::info!(step = 3, vault = %vault_address, "minting authority handed to vault");

    Ok(vault)
}
