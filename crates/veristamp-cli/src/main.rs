//! VeriStamp CLI
//!
//! Command-line interface for fingerprinting files and certifying them on
//! the embedded ledger

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use veristamp_core::config::ClientConfig;
use veristamp_core::logging_facility;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "veristamp")]
#[command(about = "VeriStamp - Proof of existence for files", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger database; overrides the config file and VERISTAMP_LEDGER_DB
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the digest of a file
    Hash(commands::hash::HashArgs),
    /// Certify a file on the ledger
    Certify(commands::certify::CertifyArgs),
    /// Look up the certificate for a file or digest
    Verify(commands::verify::VerifyArgs),
    /// Claimant registry operations
    Claimant(commands::claimant::ClaimantArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.ledger_db = db;
    }
    logging_facility::init(config.log_profile);
    tracing::debug!(ledger_db = %config.ledger_db.display(), "configuration loaded");

    match cli.command {
        Commands::Hash(args) => commands::hash::execute(args),
        Commands::Certify(args) => commands::certify::execute(args, &config).await,
        Commands::Verify(args) => commands::verify::execute(args, &config).await,
        Commands::Claimant(args) => commands::claimant::execute(args, &config).await,
    }
}
