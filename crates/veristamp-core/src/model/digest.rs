//! 32-byte content digest

use crate::errors::{Result, VeriStampError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of a digest in bytes
pub const DIGEST_LEN: usize = 32;

/// Fingerprint of a file's full byte content.
///
/// Canonical text form is `0x`-prefixed lowercase hex, the same form the
/// ledger uses as its certificate key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// `0x` + 64 lowercase hex characters
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse a hex digest, with or without the `0x` prefix, any case.
    ///
    /// # Errors
    ///
    /// Returns `VeriStampError::InvalidDigest` for non-hex input or any length
    /// other than 32 bytes.
    pub fn from_hex(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if body.len() != DIGEST_LEN * 2 {
            return Err(VeriStampError::InvalidDigest {
                input: input.to_string(),
                reason: format!(
                    "expected {} hex characters, got {}",
                    DIGEST_LEN * 2,
                    body.len()
                ),
            });
        }

        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(body, &mut bytes).map_err(|e| VeriStampError::InvalidDigest {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = VeriStampError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
