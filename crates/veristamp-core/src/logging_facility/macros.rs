//! Canonical operation logging macros
//!
//! Every client and ledger operation logs exactly one `start` and exactly one
//! `end` or `end_error`, owned by the function that implements it.

/// Log the start of an operation
///
/// ```
/// # use veristamp_core::log_op_start;
/// log_op_start!("ledger_query");
/// log_op_start!("ledger_query", digest = "0xc5d2");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use veristamp_core::log_op_end;
/// log_op_end!("ledger_query", duration_ms = 12);
/// log_op_end!("ledger_query", duration_ms = 12, outcome = "found");
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log a failed operation with its stable error kind and code
///
/// `$err` is anything convertible into `ExError`. Correlation ids and the
/// ledger handle attached to the error are logged as fields of their own.
///
/// ```
/// # use veristamp_core::log_op_error;
/// # use veristamp_core::errors::{ExError, ExErrorKind};
/// let err = ExError::new(ExErrorKind::Transport).with_message("connection reset");
/// log_op_error!("ledger_submit", err, duration_ms = 30);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message(),
            request_id = ex_err.request_id().map(|id| id.as_str()),
            trace_id = ex_err.trace_id().map(|id| id.as_str()),
            tx_handle = ex_err.handle().map(|h| h.as_str()),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message(),
            request_id = ex_err.request_id().map(|id| id.as_str()),
            trace_id = ex_err.trace_id().map(|id| id.as_str()),
            tx_handle = ex_err.handle().map(|h| h.as_str()),
            $($field)*
        );
    }};
}

/// Log a lifecycle transition of a certification transaction
///
/// ```
/// # use veristamp_core::log_transition;
/// log_transition!(3u64, "ready", "submitting");
/// ```
#[macro_export]
macro_rules! log_transition {
    ($generation:expr, $from:expr, $to:expr) => {
        tracing::debug!(
            component = module_path!(),
            event = $crate::types::schema::EVENT_TRANSITION,
            generation = $generation,
            from = $from,
            to = $to,
        );
    };
}
