//! File relocation with a cross-device fallback.
//!
//! # Overview
//!
//! [`relocate`] moves a file without reading it when source and destination
//! share a filesystem. When the rename is refused because they do not, the
//! file is copied and the source removed. A half-written copy is cleaned up
//! on failure so a file never ends up in both places.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for relocation.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// Source file vanished before it could be moved.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied on source or destination.
    #[error("permission denied moving {from} to {to}")]
    PermissionDenied {
        /// Source path
        from: PathBuf,
        /// Destination path
        to: PathBuf,
    },

    /// Any other I/O failure.
    #[error("failed to move {from} to {to}: {source}")]
    Io {
        /// Source path
        from: PathBuf,
        /// Destination path
        to: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl RelocateError {
    fn from_io(from: &Path, to: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(from.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
            },
            _ => Self::Io {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source: error,
            },
        }
    }
}

/// How a file was relocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocateMethod {
    /// Same-filesystem rename
    Rename,
    /// Copy to destination, then remove source
    CopyAndRemove,
}

/// Move `from` to `to`.
///
/// # Errors
///
/// Returns [`RelocateError`] if neither the rename nor the copy fallback
/// succeeds. On error the source is left in place.
pub fn relocate(from: &Path, to: &Path) -> Result<RelocateMethod, RelocateError> {
    match fs::rename(from, to) {
        Ok(()) => Ok(RelocateMethod::Rename),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!(
                "Cross-device move, copying {} to {}",
                from.display(),
                to.display()
            );
            copy_and_remove(from, to)?;
            Ok(RelocateMethod::CopyAndRemove)
        }
        Err(e) => Err(RelocateError::from_io(from, to, e)),
    }
}

/// Copy then remove, undoing the copy if either step fails.
fn copy_and_remove(from: &Path, to: &Path) -> Result<(), RelocateError> {
    if let Err(e) = fs::copy(from, to) {
        let _ = fs::remove_file(to);
        return Err(RelocateError::from_io(from, to, e));
    }
    if let Err(e) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(RelocateError::from_io(from, to, e));
    }
    Ok(())
}
