use crate::model::{Digest, TxHandle};
use thiserror::Error;
use veristamp_core_types::{RequestId, TraceId};

/// Result type alias using VeriStampError
pub type Result<T> = std::result::Result<T, VeriStampError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code. The certification outcomes that are
/// not defects (`DuplicateDigest`, `NotFound`) still get kinds so that they can
/// be reported and logged with the same vocabulary as real failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    // Input
    InvalidInput,
    Io,

    // Ledger boundary
    Transport,
    AuthorizationDenied,
    DuplicateDigest,
    NotFound,

    // Transaction lifecycle
    /// A hash, submission or query is already in flight for this transaction
    Busy,
    /// The action is not legal from the current state (e.g. certify while Idle)
    InvalidState,
    /// The transaction was reset or abandoned before its outcome arrived
    Superseded,

    // Embedded ledger
    AlreadyExists,
    Persistence,
    Serialization,

    Config,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Transport => "ERR_TRANSPORT",
            ExErrorKind::AuthorizationDenied => "ERR_AUTHORIZATION_DENIED",
            ExErrorKind::DuplicateDigest => "ERR_DUPLICATE_DIGEST",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Busy => "ERR_BUSY",
            ExErrorKind::InvalidState => "ERR_INVALID_STATE",
            ExErrorKind::Superseded => "ERR_SUPERSEDED",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether re-issuing the same operation can reasonably succeed.
    ///
    /// Only transport failures qualify. The client never retries on its own;
    /// this is for the caller deciding whether to offer "try again".
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExErrorKind::Transport)
    }
}

/// Canonical structured error type
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    digest: Option<Digest>,
    handle: Option<TxHandle>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            digest: None,
            handle: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Attach the digest the failing operation was working on
    pub fn with_digest(mut self, digest: Digest) -> Self {
        self.digest = Some(digest);
        self
    }

    /// Attach the ledger handle of the submission involved
    pub fn with_handle(mut self, handle: TxHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn digest(&self) -> Option<&Digest> {
        self.digest.as_ref()
    }

    pub fn handle(&self) -> Option<&TxHandle> {
        self.handle.as_ref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, " (digest: {})", digest)?;
        }
        if let Some(handle) = &self.handle {
            write!(f, " (handle: {})", handle)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Failures raised inside the core (fingerprinting, parsing, configuration)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VeriStampError {
    /// The byte source could not be read to the end
    #[error("Failed to read {source_name}: {message}")]
    Io {
        source_name: String,
        message: String,
    },

    /// Text that should have been a 32-byte hex digest
    #[error("Invalid digest '{input}': {reason}")]
    InvalidDigest { input: String, reason: String },

    /// Configuration file or environment value rejected
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl VeriStampError {
    pub fn io(source_name: impl Into<String>, err: &std::io::Error) -> Self {
        VeriStampError::Io {
            source_name: source_name.into(),
            message: err.to_string(),
        }
    }
}

impl From<VeriStampError> for ExError {
    fn from(err: VeriStampError) -> Self {
        match &err {
            VeriStampError::Io { .. } => {
                ExError::new(ExErrorKind::Io).with_message(err.to_string())
            }
            VeriStampError::InvalidDigest { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(err.to_string())
            }
            VeriStampError::Config { .. } => {
                ExError::new(ExErrorKind::Config).with_message(err.to_string())
            }
            VeriStampError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for VeriStampError {
    fn from(err: serde_json::Error) -> Self {
        VeriStampError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_kind_codes() {
        let cases = [
            (ExErrorKind::Transport, "ERR_TRANSPORT"),
            (ExErrorKind::AuthorizationDenied, "ERR_AUTHORIZATION_DENIED"),
            (ExErrorKind::DuplicateDigest, "ERR_DUPLICATE_DIGEST"),
            (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
            (ExErrorKind::Busy, "ERR_BUSY"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_only_transport_is_retryable() {
        assert!(ExErrorKind::Transport.is_retryable());
        assert!(!ExErrorKind::AuthorizationDenied.is_retryable());
        assert!(!ExErrorKind::DuplicateDigest.is_retryable());
        assert!(!ExErrorKind::Io.is_retryable());
    }

    #[test]
    fn test_display_includes_context() {
        let digest = Digest::from_bytes([0xab; 32]);
        let err = ExError::new(ExErrorKind::Transport)
            .with_op("submit")
            .with_digest(digest)
            .with_message("ledger unreachable");

        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_TRANSPORT] in operation 'submit'"));
        assert!(rendered.contains("ledger unreachable"));
        assert!(rendered.contains(&digest.to_hex()));
    }

    #[test]
    fn test_source_chain_is_exposed() {
        use std::error::Error;
        let inner = ExError::new(ExErrorKind::Persistence).with_message("disk full");
        let outer = ExError::new(ExErrorKind::Transport).with_source(inner);
        assert!(outer.source().is_some());
        assert_eq!(
            outer.source_error().map(|e| e.kind()),
            Some(ExErrorKind::Persistence)
        );
    }

    #[test]
    fn test_io_error_converts_to_io_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let ex: ExError = VeriStampError::io("report.pdf", &io).into();
        assert_eq!(ex.kind(), ExErrorKind::Io);
        assert!(ex.message().contains("report.pdf"));
    }
}
