//! Verify command
//!
//! Exit status: 0 when a certificate exists, 2 when none does, 1 when the
//! lookup itself could not be completed.

use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use veristamp_core::config::ClientConfig;
use veristamp_core::model::Digest;
use veristamp_core::ByteSource;
use veristamp_engine::{LedgerClient, StatusReport, TxOutcome, TxState};

const EXIT_NOT_FOUND: u8 = 2;

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// File to look up
    #[arg(required_unless_present = "digest", conflicts_with = "digest")]
    pub file: Option<PathBuf>,

    /// Look up a known digest instead of hashing a file
    #[arg(long)]
    pub digest: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(
    args: VerifyArgs,
    config: &ClientConfig,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let outcome = match (args.file, args.digest) {
        (_, Some(hex)) => {
            let digest = Digest::from_hex(&hex)?;
            let client = LedgerClient::new(std::sync::Arc::new(super::open_ledger(config)?));
            TxOutcome::from_query(digest, client.query(digest).await)
        }
        (Some(file), None) => {
            let machine = super::open_machine(config)?;
            let mut snapshot = machine.select_file(ByteSource::path(file)).await?;
            if matches!(snapshot.state, TxState::Ready { .. }) {
                snapshot = machine.verify().await?;
            }
            snapshot
                .last_outcome
                .ok_or("lookup finished without an outcome")?
        }
        (None, None) => return Err("Must specify either a file or --digest".into()),
    };

    if args.json {
        println!("{}", render_json(&outcome));
    } else {
        println!("{}", StatusReport::from_outcome(&outcome));
    }

    Ok(match outcome {
        TxOutcome::Verified(_) => ExitCode::SUCCESS,
        TxOutcome::NotFound { .. } => ExitCode::from(EXIT_NOT_FOUND),
        _ => ExitCode::FAILURE,
    })
}

fn render_json(outcome: &TxOutcome) -> serde_json::Value {
    match outcome {
        TxOutcome::Verified(cert) => json!({
            "found": true,
            "certificate": cert,
        }),
        TxOutcome::NotFound { digest } => json!({
            "found": false,
            "digest": digest,
        }),
        other => json!({
            "found": false,
            "error": other.label(),
            "message": StatusReport::from_outcome(other).message,
        }),
    }
}
