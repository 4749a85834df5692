//! Structured logging facility
//!
//! - `init(profile)`: single initialization point
//! - `log_op_start!` / `log_op_end!` / `log_op_error!`: one start and one end
//!   event per operation, with canonical field keys
//! - `log_transition!`: certification lifecycle transitions
//! - `init_test_capture()`: in-memory capture for assertions
//!
//! Authorization tokens are never passed to any of these; the types that
//! carry them redact themselves.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
