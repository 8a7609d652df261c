//! # Digest Module
//!
//! Content digests for exact duplicate detection.
//!
//! A digest depends only on the bytes of a file, never on its name, location,
//! timestamps or permissions, so two byte-identical files always share one.
//!
//! ## Example
//! ```rust,ignore
//! use image_crossmatch::core::digest::{DigestProvider, Md5Digester};
//!
//! let digest = Md5Digester::new().digest(Path::new("/photos/a.jpg"))?;
//! println!("{}", digest.to_hex());
//! ```

mod table;

pub use table::DigestTable;

use crate::error::DigestError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Length of a digest in bytes
pub const DIGEST_LEN: usize = 16;

/// Read chunk size used while streaming a file
const CHUNK_SIZE: usize = 8192;

/// Fixed-length content fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hexadecimal form
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Computes content digests
///
/// Implementations must be deterministic and content-only.
pub trait DigestProvider: Send + Sync {
    fn digest(&self, path: &Path) -> Result<Digest, DigestError>;
}

/// MD5 digester that streams files in fixed-size chunks
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Digester;

impl Md5Digester {
    pub fn new() -> Self {
        Self
    }

    /// Digest any reader; memory use is one chunk regardless of input size.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> std::io::Result<Digest> {
        let mut context = md5::Context::new();
        let mut buffer = [0u8; CHUNK_SIZE];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            context.consume(&buffer[..bytes_read]);
        }

        Ok(Digest(context.compute().0))
    }
}

impl DigestProvider for Md5Digester {
    fn digest(&self, path: &Path) -> Result<Digest, DigestError> {
        let unreadable = |source| DigestError::FileUnreadable {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(unreadable)?;
        self.digest_reader(file).map_err(unreadable)
    }
}
