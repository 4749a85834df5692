//! Redaction wrapper for secrets
//!
//! Claimant authorization tokens travel through the client untouched. They
//! must never show up in a log line, a panic message or a status snapshot, so
//! they are carried inside `Sensitive<T>`.

use std::fmt;

/// Holds a value whose `Debug` and `Display` output is always redacted
///
/// ```
/// use veristamp_core_types::Sensitive;
///
/// let token = Sensitive::new(b"wallet-signature".to_vec());
/// assert_eq!(format!("{:?}", token), "***REDACTED***");
/// assert_eq!(token.expose(), &b"wallet-signature".to_vec());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the secret. Only the ledger boundary should need this.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}
