//! Claimant registry commands

use clap::{Args, Subcommand};
use std::process::ExitCode;
use veristamp_core::config::ClientConfig;
use veristamp_core::{Authorization, Claimant};

#[derive(Debug, Args)]
pub struct ClaimantArgs {
    #[command(subcommand)]
    pub command: ClaimantCommand,
}

#[derive(Debug, Subcommand)]
pub enum ClaimantCommand {
    /// Bind a token to a claimant name
    Register(RegisterArgs),
    /// List registered claimants
    List,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    pub name: String,

    #[arg(long)]
    pub token: String,
}

pub async fn execute(
    args: ClaimantArgs,
    config: &ClientConfig,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let ledger = super::open_ledger(config)?;

    match args.command {
        ClaimantCommand::Register(register) => {
            let registered = ledger
                .register_claimant(
                    Claimant::new(register.name),
                    Authorization::from_token(&register.token),
                )
                .await?;
            println!("Registered claimant: {}", registered.claimant);
        }
        ClaimantCommand::List => {
            for entry in ledger.claimants().await? {
                println!(
                    "{}\t{}",
                    entry.claimant,
                    entry
                        .registered_at
                        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
                );
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
