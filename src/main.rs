//! bundle-rescue
//!
//! Rescues an airdrop entitlement from a compromised account by submitting
//! three transactions as one atomic bundle to a private relay:
//!
//! ```text
//!   funding account ──(1) gas money──▶ at-risk account
//!   at-risk account ──(2) claim()────▶ distributor
//!   at-risk account ──(3) transfer()─▶ token contract (tokens → funding account)
//! ```
//!
//! Either all three land in the same block or none does, so a sweeper bot
//! watching the at-risk account never sees the funds in between.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Instrument;

use bundle_rescue::lifecycle::signals::spawn_ctrl_c_handler;
use bundle_rescue::lifecycle::startup::{connect, load_env_file, load_inputs, RescueInputs, StartupOptions};
use bundle_rescue::observability::{logging, metrics, tracing::run_span};
use bundle_rescue::rescue::exit_code;
use bundle_rescue::{Orchestrator, RescueError, RescueOutcome, Shutdown};

#[derive(Parser)]
#[command(name = "bundle-rescue")]
#[command(about = "Claim and sweep an airdrop from a compromised account in one atomic bundle", long_about = None)]
struct Cli {
    /// Claim file: {index, account, amount, merkleProof}
    #[arg(short, long)]
    proof: PathBuf,

    /// TOML file with tunables (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment file to load instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Prepare and sign one bundle, print the ledger, submit nothing
    #[arg(long)]
    dry_run: bool,

    /// Stop after this many attempts without inclusion
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Fee increase per retry, in percent
    #[arg(long)]
    escalation_percent: Option<u32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = StartupOptions {
        config_path: cli.config,
        proof_path: cli.proof,
        env_file: cli.env_file,
        max_attempts: cli.max_attempts,
        escalation_percent: cli.escalation_percent,
    };

    if let Err(e) = load_env_file(options.env_file.as_deref()) {
        eprintln!("Error: {}", e);
        return ExitCode::from(exit_code::FATAL);
    }

    let inputs = match load_inputs(&options) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(exit_code::FATAL);
        }
    };

    logging::init(&inputs.config.observability.log_level);
    tracing::info!("bundle-rescue v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(address) = &inputs.config.observability.metrics_address {
        match address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(metrics_address = %address, error = %e, "Failed to parse metrics address"),
        }
    }

    let (run_id, span) = run_span();
    let result = run(inputs, cli.dry_run).instrument(span).await;

    match result {
        Ok(None) => {
            tracing::info!(%run_id, "Dry run complete, nothing submitted");
            ExitCode::from(exit_code::INCLUDED)
        }
        Ok(Some(outcome)) => {
            match &outcome {
                RescueOutcome::Included { attempts, target_block } => {
                    tracing::info!(%run_id, attempts, target_block, "Rescue complete");
                }
                RescueOutcome::Stopped { reason, attempts } => {
                    tracing::warn!(%run_id, attempts, reason = %reason, "Rescue stopped without inclusion");
                }
            }
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            tracing::error!(%run_id, error = %e, "Rescue failed");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Returns `None` after a dry run.
async fn run(inputs: RescueInputs, dry_run: bool) -> Result<Option<RescueOutcome>, RescueError> {
    let (chain, relay) = connect(&inputs).await?;
    let orchestrator = Orchestrator::from_config(chain, relay, &inputs.config, &inputs.credentials, inputs.plan);

    if dry_run {
        let prepared = orchestrator.dry_run().await?;
        for (payload, label) in prepared.bundle.payloads.iter().zip(["fund", "claim", "sweep"]) {
            tracing::info!(tx = label, hash = %payload.hash, signer = %payload.signer, nonce = payload.nonce, "Signed");
        }
        return Ok(None);
    }

    let shutdown = Shutdown::new();
    let mut orchestrator = orchestrator.with_shutdown(shutdown.subscribe());
    spawn_ctrl_c_handler(shutdown);
    orchestrator.run().await.map(Some)
}
