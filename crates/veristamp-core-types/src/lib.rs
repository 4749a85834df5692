//! Types shared by the VeriStamp error and logging facilities
//!
//! - **Correlation**: `RequestId`, `TraceId`
//! - **Secrets**: `Sensitive<T>` redaction wrapper for authorization tokens
//! - **Schema**: canonical log field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{RequestId, TraceId};
pub use sensitive::Sensitive;
