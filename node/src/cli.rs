//! # CLI Interface
//!
//! Defines the command-line argument structure for `lockbox` using `clap`
//! derive. Supports three subcommands: `deploy`, `simulate`, and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Lockbox time-locked vault.
///
/// Brings up a vault (receipt issuer, vault, minting-authority handoff) and
/// replays scripted deposit/withdraw sessions against it.
#[derive(Parser, Debug)]
#[command(
    name = "lockbox",
    about = "Lockbox time-locked vault driver",
    version,
    propagate_version = true
)]
pub struct LockboxCli {
    /// Log output format. Logs always go to stderr.
    #[arg(
        long,
        global = true,
        value_enum,
        env = "LOCKBOX_LOG_FORMAT",
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `lockbox` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run bring-up and print the resulting identities.
    Deploy(DeployArgs),
    /// Replay a JSON script of steps against a freshly deployed vault.
    Simulate(SimulateArgs),
    /// Print version information and exit.
    Version,
}

/// Bring-up parameters shared by `deploy` and `simulate`.
#[derive(Args, Debug, Clone)]
pub struct BringUpArgs {
    /// Path to the vault configuration file (JSON).
    ///
    /// When omitted, defaults apply: admins may deposit, default receipt
    /// metadata.
    #[arg(long, short = 'c', env = "LOCKBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Label of the account that deploys the receipt issuer.
    ///
    /// `deploy` draws a throwaway address when omitted; `simulate` falls
    /// back to the `deployer` label.
    #[arg(long, env = "LOCKBOX_DEPLOYER")]
    pub deployer: Option<String>,

    /// Label of the account that owns the access registry.
    #[arg(long, env = "LOCKBOX_OWNER", default_value = "owner")]
    pub owner: String,
}

/// Arguments for the `deploy` subcommand.
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub bring_up: BringUpArgs,
}

/// Arguments for the `simulate` subcommand.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Path to the session script (JSON).
    #[arg(long, short = 's')]
    pub script: PathBuf,

    #[command(flatten)]
    pub bring_up: BringUpArgs,

    /// Print the Prometheus text exposition after the outcome lines.
    #[arg(long)]
    pub metrics: bool,
}
