// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Lockbox
//!
//! Entry point for the `lockbox` binary. Parses CLI arguments, initializes
//! logging, and runs one of:
//!
//! - `deploy`: bring up a vault and print its identities
//! - `simulate`: replay a scripted session, one JSON outcome per line
//! - `version`: print build version information

mod cli;
mod config;
mod logging;
mod metrics;
mod script;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use lockbox_contracts::{deploy, Readiness};
use lockbox_protocol::{Address, SystemClock};

use cli::{Commands, DeployArgs, LockboxCli, SimulateArgs};
use script::Session;

/// Deployer label used by `simulate` when none is given.
const DEFAULT_DEPLOYER: &str = "deployer";

fn main() -> Result<()> {
    let cli = LockboxCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);

    match cli.command {
        Commands::Deploy(args) => deploy_vault(args),
        Commands::Simulate(args) => simulate(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Runs bring-up against the wall clock and prints the result.
fn deploy_vault(args: DeployArgs) -> Result<()> {
    let config = config::load_config(args.bring_up.config.as_deref())?;
    let deployer = match args.bring_up.deployer.as_deref() {
        Some(label) => Address::from_label(label),
        None => Address::random(),
    };
    let owner = Address::from_label(&args.bring_up.owner);

    let vault = deploy(deployer, owner, config, Arc::new(SystemClock))
        .context("vault bring-up failed")?;

    let readiness = match vault.readiness() {
        Readiness::Ready => "ready".to_string(),
        Readiness::AwaitingHandoff { authority } => format!("awaiting handoff from {authority}"),
    };
    let metadata = vault.issuer().metadata();

    println!("Vault deployed.");
    match args.bring_up.deployer.as_deref() {
        Some(label) => println!("  Deployer  : {} ({})", deployer, label),
        None => println!("  Deployer  : {} (random)", deployer),
    }
    println!("  Owner     : {} ({})", owner, args.bring_up.owner);
    println!("  Issuer    : {}", vault.issuer().address());
    println!("  Receipts  : {} ({})", metadata.name, metadata.symbol);
    println!("  Vault     : {}", vault.address());
    println!("  Readiness : {}", readiness);

    Ok(())
}

/// Replays a script and writes one JSON outcome per line to stdout.
fn simulate(args: SimulateArgs) -> Result<()> {
    let config = config::load_config(args.bring_up.config.as_deref())?;
    let script = script::load_script(&args.script)?;

    tracing::info!(
        script = %args.script.display(),
        steps = script.steps.len(),
        start = %script.start_time(),
        "starting session"
    );

    let mut session = Session::start(
        config,
        args.bring_up.deployer.as_deref().unwrap_or(DEFAULT_DEPLOYER),
        &args.bring_up.owner,
        script.start_time(),
    )?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for outcome in session.run(&script.steps) {
        let line = serde_json::to_string(&outcome).context("failed to serialize outcome")?;
        writeln!(out, "{line}").context("failed to write outcome")?;
    }

    if args.metrics {
        write!(out, "{}", session.metrics().encode()?).context("failed to write metrics")?;
    }

    let vault = session.vault();
    tracing::info!(
        deposits = vault.deposit_count(),
        custody = vault.custody(),
        "session finished"
    );
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("lockbox   {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {}", lockbox_protocol::config::PROTOCOL_VERSION);
}
