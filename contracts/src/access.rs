//! Access Registry: role assignment and the deposit guard
//!
//! One authoritative table maps accounts to a [`Role`]. Only the registry
//! owner writes to it; everyone else reads. Every privileged entry point in
//! the vault goes through [`AccessRegistry::require_any`].

use std::collections::HashMap;
use std::fmt;

use lockbox_protocol::Address;
use serde::{Deserialize, Serialize};

use crate::errors::AccessError;

/// Authorization level of an account.
///
/// Numeric codes are stable: `None = 0`, `User = 1`, `Admin = 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// No privileges. The default for every account.
    #[default]
    None,
    /// May deposit.
    User,
    /// Administrative account; may deposit when the vault is configured to
    /// allow it.
    Admin,
}

impl Role {
    /// Stable numeric code.
    pub fn code(self) -> u8 {
        match self {
            Role::None => 0,
            Role::User => 1,
            Role::Admin => 2,
        }
    }
}

impl TryFrom<u8> for Role {
    type Error = AccessError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Role::None),
            1 => Ok(Role::User),
            2 => Ok(Role::Admin),
            other => Err(AccessError::InvalidRole(other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::None => write!(f, "None"),
            Role::User => write!(f, "User"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

/// Role table plus the identity allowed to change it.
///
/// The owner does not implicitly hold any role: owning the registry lets you
/// assign roles, including to yourself, but grants none by itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRegistry {
    owner: Address,
    roles: HashMap<Address, Role>,
}

impl AccessRegistry {
    /// Create an empty registry owned by `owner`.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            roles: HashMap::new(),
        }
    }

    /// Set `account`'s role, overwriting any prior value. Owner-only.
    ///
    /// Setting `Role::None` removes the entry; lookups return `None` either
    /// way.
    pub fn set_access(
        &mut self,
        caller: &Address,
        account: Address,
        role: Role,
    ) -> Result<Option<Role>, AccessError> {
        self.require_owner(caller)?;
        let previous = match role {
            Role::None => self.roles.remove(&account),
            _ => self.roles.insert(account, role),
        };
        Ok(previous)
    }

    /// Role of `account`; `Role::None` for unknown accounts.
    pub fn role_of(&self, account: &Address) -> Role {
        self.roles.get(account).copied().unwrap_or_default()
    }

    /// The single guard: succeeds iff `account` holds one of `allowed`.
    pub fn require_any(&self, account: &Address, allowed: &[Role]) -> Result<Role, AccessError> {
        let role = self.role_of(account);
        if allowed.contains(&role) {
            Ok(role)
        } else {
            Err(AccessError::Unauthorized)
        }
    }

    /// Hand the registry to a new owner. Owner-only.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), AccessError> {
        self.require_owner(caller)?;
        self.owner = new_owner;
        Ok(())
    }

    /// Current owner.
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Number of accounts holding a role other than `None`.
    pub fn assigned_count(&self) -> usize {
        self.roles.len()
    }

    /// Put back `account`'s role as it was before a rolled-back change.
    pub(crate) fn restore_role(&mut self, account: Address, previous: Role) {
        match previous {
            Role::None => self.roles.remove(&account),
            _ => self.roles.insert(account, previous),
        };
    }

    pub(crate) fn restore_owner(&mut self, previous: Address) {
        self.owner = previous;
    }

    fn require_owner(&self, caller: &Address) -> Result<(), AccessError> {
        if *caller != self.owner {
            return Err(AccessError::Unauthorized);
        }
        Ok(())
    }
}
