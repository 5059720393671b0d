//! Scanner module for source-tree traversal and content fingerprinting.
//!
//! This module provides functionality for:
//! - Parallel walking of many source roots using jwalk
//! - Extension filtering (case-insensitive)
//! - Name + content fingerprinting with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`collector`]: Source-root traversal and candidate discovery
//! - [`hasher`]: BLAKE3 fingerprints (streaming)
//! - [`path_utils`]: Extension and path helpers
//!
//! # Example
//!
//! ```no_run
//! use tmplmerge::scanner::{Collector, CollectorConfig};
//! use std::path::PathBuf;
//!
//! let config = CollectorConfig::with_extensions(["yaml", "yml"]);
//! let collector = Collector::new(vec![PathBuf::from("templates")], config);
//! for candidate in collector.walk() {
//!     match candidate {
//!         Ok(file) => println!("{}", file.path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod collector;
pub mod hasher;
pub mod path_utils;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

// Re-export main types
pub use collector::Collector;
pub use hasher::{Fingerprint, Hasher, READ_BLOCK_SIZE};

/// A candidate template file discovered by the [`Collector`].
///
/// Identity for filesystem purposes is its path; identity for dedup
/// purposes is its [`Fingerprint`], computed later by the [`Hasher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Absolute path to the file
    pub path: PathBuf,
    /// Base name including extension
    pub name: OsString,
    /// Lower-cased extension without the leading dot
    pub extension: String,
}

impl TemplateFile {
    /// Build a candidate from a path.
    ///
    /// Returns `None` when the path has no file name or no extension.
    #[must_use]
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_os_string();
        let extension = path_utils::extension_of(&path)?;
        Some(Self {
            path,
            name,
            extension,
        })
    }
}

/// Configuration for source-root traversal.
#[derive(Debug, Clone, Default)]
pub struct CollectorConfig {
    /// Accepted extensions, normalized to lower case without a dot.
    pub extensions: Vec<String>,

    /// Follow symbolic links during traversal.
    /// Warning: May cause infinite loops with symlink cycles.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Directories never descended into (typically the merge target).
    pub exclude: Vec<PathBuf>,
}

impl CollectorConfig {
    /// Create a configuration accepting the given extensions.
    ///
    /// Extensions are normalized, so `".YAML"` and `"yaml"` are equivalent.
    #[must_use]
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: path_utils::normalize_extensions(extensions),
            ..Self::default()
        }
    }

    /// Exclude a directory from traversal.
    #[must_use]
    pub fn excluding(mut self, dir: PathBuf) -> Self {
        self.exclude.push(dir);
        self
    }

    /// Check whether an extension (already lower-cased) is accepted.
    #[must_use]
    pub fn accepts(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

/// Errors that can occur while collecting candidates.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// A configured source root does not exist. Not fatal.
    #[error("Source root not found: {0}")]
    MissingSourceRoot(PathBuf),

    /// A configured source root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Permission was denied when reading a directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred during traversal.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while fingerprinting a file.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file disappeared before it could be read.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
