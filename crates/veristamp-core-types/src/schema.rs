//! Canonical field keys and event names for structured logging
//!
//! Every log line emitted by the logging macros uses these keys, so log
//! pipelines and test captures can match on them without string drift.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Certification identifiers
pub const FIELD_DIGEST: &str = "digest";
pub const FIELD_TX_HANDLE: &str = "tx_handle";
pub const FIELD_GENERATION: &str = "generation";
pub const FIELD_CLAIMANT: &str = "claimant";
pub const FIELD_OUTCOME: &str = "outcome";
pub const FIELD_BYTES: &str = "bytes";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_TRANSITION: &str = "transition";
