pub mod certify;
pub mod claimant;
pub mod hash;
pub mod verify;

use std::sync::Arc;
use veristamp_core::config::ClientConfig;
use veristamp_engine::{CertificationMachine, LedgerClient};
use veristamp_store::SqliteLedger;

/// Open the configured ledger
pub fn open_ledger(config: &ClientConfig) -> Result<SqliteLedger, Box<dyn std::error::Error>> {
    Ok(SqliteLedger::open(&config.ledger_db, config)?)
}

/// A fresh machine over the configured ledger
pub fn open_machine(
    config: &ClientConfig,
) -> Result<CertificationMachine, Box<dyn std::error::Error>> {
    let ledger = open_ledger(config)?;
    Ok(CertificationMachine::new(LedgerClient::new(Arc::new(ledger))))
}
