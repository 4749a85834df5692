//! Certify command

use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use veristamp_core::config::ClientConfig;
use veristamp_core::{Authorization, ByteSource};
use veristamp_engine::{StatusReport, TxState};

#[derive(Debug, Args)]
pub struct CertifyArgs {
    /// File to certify
    pub file: PathBuf,

    /// Claimant authorization token
    #[arg(long)]
    pub token: String,
}

pub async fn execute(
    args: CertifyArgs,
    config: &ClientConfig,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let machine = super::open_machine(config)?;

    let mut snapshot = machine.select_file(ByteSource::path(&args.file)).await?;
    if let TxState::Ready { digest } = &snapshot.state {
        println!("Digest: {}", digest);
        snapshot = machine
            .certify(Authorization::from_token(&args.token))
            .await?;
    }

    match StatusReport::for_snapshot(&snapshot) {
        Some(report) => println!("{}", report),
        None => {
            return Err(format!(
                "certification ended in state {}",
                snapshot.state.name()
            )
            .into())
        }
    }

    if matches!(snapshot.state, TxState::Confirmed { .. }) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
