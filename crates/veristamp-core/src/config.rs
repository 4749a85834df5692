//! Client configuration
//!
//! Resolution order, later wins:
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. `VERISTAMP_*` environment variables (a `.env` file is loaded first)

use crate::errors::{Result, VeriStampError};
use crate::logging_facility::Profile;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_LEDGER_DB: &str = "VERISTAMP_LEDGER_DB";
pub const ENV_LOG_PROFILE: &str = "VERISTAMP_LOG_PROFILE";
pub const ENV_BLOCK_TIME_MS: &str = "VERISTAMP_BLOCK_TIME_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// SQLite file backing the embedded ledger
    pub ledger_db: PathBuf,
    pub log_profile: Profile,
    /// Minimum age of a submission before the embedded ledger finalizes it
    pub block_time_ms: u64,
    /// Sleep between finality checks while a submission is still pending
    pub finality_poll_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ledger_db: PathBuf::from(".veristamp/ledger.db"),
            log_profile: Profile::Development,
            block_time_ms: 0,
            finality_poll_ms: 500,
        }
    }
}

impl ClientConfig {
    /// # Errors
    ///
    /// `VeriStampError::Config` for malformed TOML, unknown keys or a zero
    /// poll interval.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(text).map_err(|e| VeriStampError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then `path` if given, then the process environment.
    ///
    /// # Errors
    ///
    /// `VeriStampError::Io` if the file cannot be read,
    /// `VeriStampError::Config` if it or an override is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .map_err(|e| VeriStampError::io(p.display().to_string(), &e))?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };

        // a missing .env file is the normal case
        dotenvy::dotenv().ok();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `VERISTAMP_*` overrides from any key lookup
    ///
    /// # Errors
    ///
    /// `VeriStampError::Config` for an unknown profile name or a
    /// non-numeric block time.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup(ENV_LEDGER_DB) {
            self.ledger_db = PathBuf::from(db);
        }
        if let Some(name) = lookup(ENV_LOG_PROFILE) {
            self.log_profile = Profile::parse(&name).ok_or_else(|| VeriStampError::Config {
                reason: format!("{} has unknown profile '{}'", ENV_LOG_PROFILE, name),
            })?;
        }
        if let Some(ms) = lookup(ENV_BLOCK_TIME_MS) {
            self.block_time_ms = ms.trim().parse().map_err(|_| VeriStampError::Config {
                reason: format!(
                    "{} must be a number of milliseconds, got '{}'",
                    ENV_BLOCK_TIME_MS, ms
                ),
            })?;
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.finality_poll_ms == 0 {
            return Err(VeriStampError::Config {
                reason: "finality_poll_ms must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
