//! Keccak-256 content fingerprinting
//!
//! The digest depends on the bytes alone: never on a file name, metadata or
//! timestamps. Feeding the same bytes in any chunking produces the same
//! digest.

use crate::model::Digest;
use sha3::{Digest as _, Keccak256};

/// `digest(b"")`, the fingerprint of an empty file
pub const EMPTY_DIGEST: Digest = Digest::from_bytes([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03,
    0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85,
    0xa4, 0x70,
]);

/// Incremental fingerprinter
#[derive(Clone, Default)]
pub struct Fingerprinter {
    hasher: Keccak256,
    bytes_seen: u64,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.bytes_seen += chunk.len() as u64;
    }

    /// Total bytes fed so far
    pub fn bytes_seen(&self) -> u64 {
        self.bytes_seen
    }

    pub fn finalize(self) -> Digest {
        let out: [u8; 32] = self.hasher.finalize().into();
        Digest::from_bytes(out)
    }
}

/// Fingerprint a complete in-memory byte sequence
pub fn digest(bytes: &[u8]) -> Digest {
    let mut fp = Fingerprinter::new();
    fp.update(bytes);
    fp.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_has_known_digest() {
        assert_eq!(digest(b""), EMPTY_DIGEST);
        assert_eq!(
            EMPTY_DIGEST.to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_known_vector() {
        // keccak256("hello world")
        assert_eq!(
            digest(b"hello world").to_hex(),
            "0x47173285a8d7341e5e972fc677286384f802f8ef42a5ec5f03bbfa254cb01fad"
        );
    }

    #[test]
    fn test_split_feed_matches_whole() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut fp = Fingerprinter::new();
        for chunk in data.chunks(7) {
            fp.update(chunk);
        }
        assert_eq!(fp.bytes_seen(), data.len() as u64);
        assert_eq!(fp.finalize(), digest(data));
    }

    #[test]
    fn test_empty_updates_are_neutral() {
        let mut fp = Fingerprinter::new();
        fp.update(b"");
        fp.update(b"abc");
        fp.update(b"");
        assert_eq!(fp.finalize(), digest(b"abc"));
    }
}
