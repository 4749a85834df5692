//! Fingerprint engine
//!
//! Pure, stateless mapping from a byte sequence to a 32-byte `Digest`.
//!
//! - `digest(&[u8])`: whole-buffer fingerprint
//! - `Fingerprinter`: incremental variant, identical result for any chunking
//! - `digest_reader` / `digest_file`: streaming over I/O, failing with
//!   `VeriStampError::Io` when the source cannot be read to the end

pub mod hasher;
pub mod source;

pub use hasher::{digest, Fingerprinter, EMPTY_DIGEST};
pub use source::{digest_file, digest_reader, ByteSource, CHUNK_SIZE};
