//! Byte sources handed over by the presentation layer

use crate::errors::{Result, VeriStampError};
use crate::fingerprint::hasher::{digest, Fingerprinter};
use crate::model::Digest;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

/// Read size used when streaming a reader into the fingerprinter
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Where the bytes to fingerprint come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteSource {
    /// Already in memory (a buffer the caller read, a test fixture)
    Bytes(Vec<u8>),
    /// A file to stream from disk
    Path(PathBuf),
}

impl ByteSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        ByteSource::Path(path.into())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        ByteSource::Bytes(bytes.into())
    }

    /// Human label used in logs and I/O errors. Never feeds the digest.
    pub fn describe(&self) -> String {
        match self {
            ByteSource::Bytes(b) => format!("<{} in-memory bytes>", b.len()),
            ByteSource::Path(p) => p.display().to_string(),
        }
    }

    /// Fingerprint the full content of this source.
    ///
    /// Blocking: callers on an async runtime should run this on a blocking
    /// worker.
    ///
    /// # Errors
    ///
    /// Returns `VeriStampError::Io` if the source cannot be read to the end.
    pub fn digest(&self) -> Result<Digest> {
        match self {
            ByteSource::Bytes(b) => Ok(digest(b)),
            ByteSource::Path(p) => digest_file(p),
        }
    }
}

/// Stream a reader to the end and fingerprint it.
///
/// # Errors
///
/// Any read error other than `Interrupted` aborts with `VeriStampError::Io`;
/// a partially read source never yields a digest.
pub fn digest_reader<R: Read>(mut reader: R, source_name: &str) -> Result<Digest> {
    let mut fp = Fingerprinter::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => fp.update(&buf[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(VeriStampError::io(source_name, &e)),
        }
    }
    tracing::trace!(source = source_name, bytes = fp.bytes_seen(), "fingerprinted source");
    Ok(fp.finalize())
}

/// Open and fingerprint a file.
///
/// # Errors
///
/// Returns `VeriStampError::Io` naming the path if it cannot be opened or
/// read to the end.
pub fn digest_file(path: &Path) -> Result<Digest> {
    let name = path.display().to_string();
    let file = File::open(path).map_err(|e| VeriStampError::io(&name, &e))?;
    digest_reader(file, &name)
}
