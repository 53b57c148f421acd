//! # Scripted Sessions
//!
//! A session deploys a fresh vault on a [`ManualClock`] and replays a list
//! of steps against it. Accounts are labels (`"alice"`), mapped to addresses
//! with [`Address::from_label`]; each label withdrawing gets its own
//! [`Purse`]. Amounts are decimal strings in whole units (`"0.5"`).
//!
//! ```json
//! {
//!   "start": "2026-01-01T00:00:00Z",
//!   "steps": [
//!     { "op": "set_access", "caller": "owner", "account": "alice", "role": "user" },
//!     { "op": "deposit", "caller": "alice", "amount": "1", "lock_secs": 60 },
//!     { "op": "advance", "secs": 60 },
//!     { "op": "withdraw", "caller": "alice", "deposit_id": 0 }
//!   ]
//! }
//! ```
//!
//! Every step yields one [`Outcome`]; a rejected step does not stop the
//! session.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use lockbox_contracts::{deploy, DepositId, Purse, Role, TimeLockedVault, VaultConfig, VaultError};
use lockbox_protocol::units::{format_units, parse_units, UnitsError};
use lockbox_protocol::{Address, Clock, ManualClock};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::metrics::VaultMetrics;

/// A session script.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Initial clock instant. Defaults to the Unix epoch so output is
    /// reproducible.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// One scripted call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    SetAccess {
        caller: String,
        account: String,
        role: Role,
    },
    Deposit {
        caller: String,
        amount: String,
        lock_secs: u64,
    },
    Withdraw {
        caller: String,
        deposit_id: DepositId,
    },
    /// Move the manual clock forward.
    Advance { secs: u64 },
    TransferReceipt {
        caller: String,
        to: String,
        token_id: DepositId,
    },
    GetDeposit { deposit_id: DepositId },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::SetAccess { .. } => "set_access",
            Step::Deposit { .. } => "deposit",
            Step::Withdraw { .. } => "withdraw",
            Step::Advance { .. } => "advance",
            Step::TransferReceipt { .. } => "transfer_receipt",
            Step::GetDeposit { .. } => "get_deposit",
        }
    }
}

/// Result line for one step, printed as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub step: usize,
    pub op: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

/// Why a step failed: the vault said no, or the step itself was bad.
#[derive(Debug)]
enum StepFailure {
    Vault(VaultError),
    Amount(UnitsError),
}

impl StepFailure {
    fn kind(&self) -> &'static str {
        match self {
            StepFailure::Vault(err) => err.kind(),
            StepFailure::Amount(_) => "invalid_input",
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepFailure::Vault(err) => write!(f, "{err}"),
            StepFailure::Amount(err) => write!(f, "{err}"),
        }
    }
}

impl From<VaultError> for StepFailure {
    fn from(err: VaultError) -> Self {
        StepFailure::Vault(err)
    }
}

impl From<UnitsError> for StepFailure {
    fn from(err: UnitsError) -> Self {
        StepFailure::Amount(err)
    }
}

/// A deployed vault plus everything needed to drive it from a script.
pub struct Session {
    vault: TimeLockedVault,
    clock: ManualClock,
    purses: BTreeMap<String, Purse>,
    metrics: VaultMetrics,
}

impl Session {
    /// Deploy a vault with `deployer` and `owner` labels and a manual clock
    /// set to `start`.
    pub fn start(
        config: VaultConfig,
        deployer: &str,
        owner: &str,
        start: DateTime<Utc>,
    ) -> Result<Self> {
        let clock = ManualClock::starting_at(start);
        let vault = deploy(
            Address::from_label(deployer),
            Address::from_label(owner),
            config,
            Arc::new(clock.clone()),
        )
        .context("vault bring-up failed")?;
        let metrics = VaultMetrics::new().context("failed to create metrics registry")?;

        let mut session = Self {
            vault,
            clock,
            purses: BTreeMap::new(),
            metrics,
        };
        session.flush_events();
        Ok(session)
    }

    /// Run every step in order.
    pub fn run(&mut self, steps: &[Step]) -> Vec<Outcome> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.run_step(index, step))
            .collect()
    }

    pub fn run_step(&mut self, index: usize, step: &Step) -> Outcome {
        let result = self.apply(step);
        self.flush_events();

        match result {
            Ok(value) => Outcome {
                step: index,
                op: step.name(),
                ok: true,
                value: Some(value),
                error: None,
                error_kind: None,
            },
            Err(failure) => {
                if let StepFailure::Vault(err) = &failure {
                    self.metrics.record_rejection(err);
                }
                tracing::warn!(step = index, op = step.name(), error = %failure, "step rejected");
                Outcome {
                    step: index,
                    op: step.name(),
                    ok: false,
                    value: None,
                    error: Some(failure.to_string()),
                    error_kind: Some(failure.kind()),
                }
            }
        }
    }

    fn apply(&mut self, step: &Step) -> Result<Value, StepFailure> {
        match step {
            Step::SetAccess {
                caller,
                account,
                role,
            } => {
                self.vault.set_access(
                    &Address::from_label(caller),
                    Address::from_label(account),
                    *role,
                )?;
                Ok(json!({ "account": account, "role": role }))
            }
            Step::Deposit {
                caller,
                amount,
                lock_secs,
            } => {
                let value = parse_units(amount)?;
                let deposit_id = self
                    .vault
                    .deposit(&Address::from_label(caller), value, *lock_secs)?;
                let deposit = self.vault.get_deposit(deposit_id)?;
                Ok(json!({
                    "deposit_id": deposit_id,
                    "amount": format_units(value),
                    "unlock_time": deposit.unlock_time,
                }))
            }
            Step::Withdraw { caller, deposit_id } => {
                let purse = self.purses.entry(caller.clone()).or_default();
                let amount =
                    self.vault
                        .withdraw(&Address::from_label(caller), *deposit_id, &mut *purse)?;
                Ok(json!({
                    "deposit_id": deposit_id,
                    "amount": format_units(amount),
                    "balance": format_units(purse.balance()),
                }))
            }
            Step::Advance { secs } => {
                self.clock.advance(*secs);
                Ok(json!({ "now": self.clock.now() }))
            }
            Step::TransferReceipt {
                caller,
                to,
                token_id,
            } => {
                self.vault.transfer_receipt(
                    &Address::from_label(caller),
                    Address::from_label(to),
                    *token_id,
                )?;
                Ok(json!({ "token_id": token_id, "owner": to }))
            }
            Step::GetDeposit { deposit_id } => {
                let deposit = self.vault.get_deposit(*deposit_id)?;
                let holder = self.vault.receipt_owner(*deposit_id)?;
                Ok(json!({
                    "deposit": deposit,
                    "status": deposit.status(self.vault.now()),
                    "receipt_owner": holder,
                }))
            }
        }
    }

    fn flush_events(&mut self) {
        for event in self.vault.drain_events() {
            tracing::debug!(kind = event.kind(), "vault event");
            self.metrics.observe(&event);
        }
        self.metrics.sync(&self.vault);
    }

    pub fn vault(&self) -> &TimeLockedVault {
        &self.vault
    }

    pub fn metrics(&self) -> &VaultMetrics {
        &self.metrics
    }
}

/// Reads and parses a session script.
pub fn load_script(path: &Path) -> Result<Script> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    Script::from_json(&raw).with_context(|| format!("invalid script {}", path.display()))
}
