//! BLAKE3 fingerprinting with streaming reads.
//!
//! # Overview
//!
//! A [`Fingerprint`] is computed over the file's base name followed by its
//! full content, so two files are duplicates only when both match. The
//! name is length-prefixed, keeping `("ab", "c")` and `("a", "bc")` apart.
//! Content is read in [`READ_BLOCK_SIZE`] blocks so memory use does not grow
//! with file size.
//!
//! # Example
//!
//! ```no_run
//! use tmplmerge::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let (fingerprint, bytes) = hasher.fingerprint(Path::new("rules/x.yaml")).unwrap();
//! println!("{fingerprint} ({bytes} bytes)");
//! ```

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use super::HashError;

/// Size of each read while streaming file content (64 KiB).
pub const READ_BLOCK_SIZE: usize = 64 * 1024;

/// Content-addressed dedup key: BLAKE3 of `(base name, content)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Lower-case hex encoding (64 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        blake3::Hash::from_bytes(self.0).to_hex().to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..16])
    }
}

/// Streaming fingerprinter.
#[derive(Debug, Clone)]
pub struct Hasher {
    block_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher using [`READ_BLOCK_SIZE`] reads.
    #[must_use]
    pub fn new() -> Self {
        Self {
            block_size: READ_BLOCK_SIZE,
        }
    }

    /// Use a custom read block size (minimum 1 byte).
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Fingerprint a file on disk, returning the digest and bytes read.
    ///
    /// The base name is taken from `path` itself.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn fingerprint(&self, path: &Path) -> Result<(Fingerprint, u64), HashError> {
        let name = path
            .file_name()
            .map(|n| n.as_encoded_bytes())
            .unwrap_or_default();

        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.fingerprint_reader(name, &mut file)
            .map_err(|e| HashError::from_io(path, e))
    }

    /// Fingerprint a name and an arbitrary content stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if reading fails.
    pub fn fingerprint_reader<R: Read>(
        &self,
        name: &[u8],
        reader: &mut R,
    ) -> std::io::Result<(Fingerprint, u64)> {
        let mut hasher = seeded(name);
        let mut buffer = vec![0u8; self.block_size];
        let mut total: u64 = 0;
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..n]);
            total += n as u64;
        }

        Ok((Fingerprint(*hasher.finalize().as_bytes()), total))
    }

    /// Fingerprint in-memory bytes.
    #[must_use]
    pub fn fingerprint_bytes(&self, name: &str, content: &[u8]) -> Fingerprint {
        let mut hasher = seeded(name.as_bytes());
        hasher.update(content);
        Fingerprint(*hasher.finalize().as_bytes())
    }
}

/// Start a BLAKE3 state with the length-prefixed name.
fn seeded(name: &[u8]) -> blake3::Hasher {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(name.len() as u64).to_le_bytes());
    hasher.update(name);
    hasher
}
