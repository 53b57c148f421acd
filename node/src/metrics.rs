//! # Prometheus Metrics
//!
//! Vault activity counters and custody gauges, fed from the vault's event
//! log and from rejected calls. `simulate --metrics` prints the text
//! exposition after the session.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use anyhow::Context;
use lockbox_contracts::{TimeLockedVault, VaultError, VaultEvent};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Holds all Prometheus metric handles for a vault.
#[derive(Clone)]
pub struct VaultMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Deposits recorded.
    pub deposits_total: IntCounter,
    /// Deposits withdrawn.
    pub withdrawals_total: IntCounter,
    /// Value deposited, in base units.
    pub deposited_value_total: IntCounter,
    /// Rejected calls, by error kind.
    pub rejected_operations_total: IntCounterVec,
    /// Value currently in custody, in base units.
    pub custody: IntGauge,
    /// Deposits not yet withdrawn.
    pub outstanding_deposits: IntGauge,
}

impl VaultMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("lockbox".into()), None)?;

        let deposits_total = IntCounter::new("deposits_total", "Total number of recorded deposits")?;
        registry.register(Box::new(deposits_total.clone()))?;

        let withdrawals_total =
            IntCounter::new("withdrawals_total", "Total number of completed withdrawals")?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let deposited_value_total = IntCounter::new(
            "deposited_value_total",
            "Total value deposited, in base units",
        )?;
        registry.register(Box::new(deposited_value_total.clone()))?;

        let rejected_operations_total = IntCounterVec::new(
            Opts::new(
                "rejected_operations_total",
                "Vault calls rejected and rolled back, by error kind",
            ),
            &["error"],
        )?;
        registry.register(Box::new(rejected_operations_total.clone()))?;

        let custody = IntGauge::new("custody", "Value currently held in custody, in base units")?;
        registry.register(Box::new(custody.clone()))?;

        let outstanding_deposits =
            IntGauge::new("outstanding_deposits", "Deposits not yet withdrawn")?;
        registry.register(Box::new(outstanding_deposits.clone()))?;

        Ok(Self {
            registry,
            deposits_total,
            withdrawals_total,
            deposited_value_total,
            rejected_operations_total,
            custody,
            outstanding_deposits,
        })
    }

    /// Account for one vault event.
    pub fn observe(&self, event: &VaultEvent) {
        match event {
            VaultEvent::Deposited { amount, .. } => {
                self.deposits_total.inc();
                self.deposited_value_total.inc_by(*amount);
            }
            VaultEvent::Withdrawn { .. } => self.withdrawals_total.inc(),
            _ => {}
        }
    }

    /// Count a rejected call.
    pub fn record_rejection(&self, error: &VaultError) {
        self.rejected_operations_total
            .with_label_values(&[error.kind()])
            .inc();
    }

    /// Refresh the gauges from the vault's current state.
    pub fn sync(&self, vault: &TimeLockedVault) {
        self.custody
            .set(i64::try_from(vault.custody()).unwrap_or(i64::MAX));
        let outstanding = vault.deposits().iter().filter(|d| !d.withdrawn).count();
        self.outstanding_deposits
            .set(i64::try_from(outstanding).unwrap_or(i64::MAX));
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("failed to encode metrics")?;
        String::from_utf8(buffer).context("prometheus output is not utf-8")
    }
}
