//! Content hashing for tracked files using SHA-512

use crate::error::HashError;
use crate::types::{ContentHash, HASH_LEN};
use sha2::{Digest, Sha512};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::trace;

/// Default read size for streaming file content into the digest.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Something that can produce the content hash of a file on disk.
///
/// The reconciler only talks to this trait, so tests can count or fake hash
/// computations. Implementations are shared across hashing workers.
pub trait ContentHasher: Send + Sync {
    fn hash_file(&self, path: &Path) -> Result<ContentHash, HashError>;
}

/// Streaming SHA-512 hasher
///
/// Reads files in fixed-size chunks so memory use does not grow with file size.
#[derive(Debug, Clone)]
pub struct Sha512Hasher {
    chunk_size: usize,
}

impl Default for Sha512Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Sha512Hasher {
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Use a custom chunk size. Zero is treated as one byte.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl ContentHasher for Sha512Hasher {
    fn hash_file(&self, path: &Path) -> Result<ContentHash, HashError> {
        trace!(path = %path.display(), "Hashing file");
        let mut file =
            File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;

        let mut hasher = Sha512::new();
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let read = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path.to_path_buf(), e)),
            };
            hasher.update(&buf[..read]);
        }

        Ok(finish(hasher))
    }
}

/// Compute content hash for in-memory bytes
pub fn compute_content_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Sha512::new();
    hasher.update(content);
    finish(hasher)
}

fn finish(hasher: Sha512) -> ContentHash {
    let digest = hasher.finalize();
    let mut bytes = [0u8; HASH_LEN];
    bytes.copy_from_slice(&digest);
    ContentHash(bytes)
}
