//! Correlation identifiers for certification requests
//!
//! A `TraceId` names one certify or verify action and rides on the span
//! around its ledger calls; each client request inside it logs its own
//! `RequestId`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! correlation_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh time-ordered id (UUIDv7)
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Wrap an id received from elsewhere (e.g. a log line or header)
            pub fn from_string(s: String) -> Self {
                Self(s)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

correlation_id!(
    /// Identifies one client-side request (a submit, an await, a query)
    RequestId
);

correlation_id!(
    /// Identifies one ledger action end to end, across all of its requests
    TraceId
);
