//! Logging initialization
//!
//! One entry point, one subscriber per process.

use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Output profile for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Human-readable lines, `veristamp=debug`
    #[default]
    Development,
    /// JSON lines, `veristamp=info`
    Production,
    /// Bare registry; tests install their own capture layer
    Test,
}

impl Profile {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub fn default_filter(&self) -> &'static str {
        match self {
            Profile::Development => "veristamp=debug",
            Profile::Production => "veristamp=info",
            Profile::Test => "off",
        }
    }

    /// Parse a profile name as used in config files and env vars
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Profile::Development),
            "production" | "prod" => Some(Profile::Production),
            "test" => Some(Profile::Test),
            _ => None,
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Install the global subscriber for `profile`.
///
/// Later calls are no-ops, whatever profile they ask for. `RUST_LOG`
/// overrides the profile's default filter.
///
/// ```
/// use veristamp_core::logging_facility::{init, Profile};
///
/// init(Profile::Development);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let filter = || {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(profile.default_filter()))
        };
        match profile {
            Profile::Development => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter())
                    .with_writer(std::io::stderr)
                    .init();
            }
            Profile::Production => {
                tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(filter())
                    .with_writer(std::io::stderr)
                    .init();
            }
            Profile::Test => {
                tracing_subscriber::registry().init();
            }
        }
    });
}
