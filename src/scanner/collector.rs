//! Candidate collection over many source roots using jwalk.
//!
//! # Overview
//!
//! The [`Collector`] walks each configured source root in order and yields
//! every regular file whose extension is in the accepted set. Directory
//! reads run in parallel on jwalk's rayon pool while the consumer pulls
//! results lazily, so merging can start before traversal finishes.
//!
//! A root that does not exist is yielded once as
//! [`ScanError::MissingSourceRoot`] and skipped; it never stops the walk.
//! No file content is read here.
//!
//! # Example
//!
//! ```no_run
//! use tmplmerge::scanner::{Collector, CollectorConfig};
//! use std::path::PathBuf;
//!
//! let config = CollectorConfig::with_extensions(["yaml", "yml"]);
//! let collector = Collector::new(
//!     vec![PathBuf::from("/srv/nuclei-templates"), PathBuf::from("/srv/community")],
//!     config,
//! );
//! let found: Vec<_> = collector.walk().filter_map(Result::ok).collect();
//! println!("Found {} candidates", found.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{CollectorConfig, ScanError, TemplateFile};

/// Source-root walker yielding candidate template files.
#[derive(Debug)]
pub struct Collector {
    /// Source roots, walked in order
    roots: Vec<PathBuf>,
    /// Collector configuration
    config: CollectorConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Collector {
    /// Create a collector for the given roots.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: CollectorConfig) -> Self {
        Self {
            roots,
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the collector stops yielding
    /// candidates as soon as possible.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.config.exclude.iter().any(|ex| path.starts_with(ex))
    }

    /// Walk every root in order, yielding candidates.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Within a root, siblings are visited in name order.
    pub fn walk(&self) -> impl Iterator<Item = Result<TemplateFile, ScanError>> + '_ {
        self.roots
            .iter()
            .flat_map(move |root| self.walk_root(root))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Collector: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
    }

    /// Walk a single root.
    fn walk_root<'a>(
        &'a self,
        root: &'a Path,
    ) -> Box<dyn Iterator<Item = Result<TemplateFile, ScanError>> + 'a> {
        if !root.exists() {
            log::warn!("Source root does not exist, skipping: {}", root.display());
            return Box::new(std::iter::once(Err(ScanError::MissingSourceRoot(
                root.to_path_buf(),
            ))));
        }
        if !root.is_dir() {
            log::warn!("Source root is not a directory, skipping: {}", root.display());
            return Box::new(std::iter::once(Err(ScanError::NotADirectory(
                root.to_path_buf(),
            ))));
        }
        if self.is_excluded(root) {
            log::warn!(
                "Source root lies inside the target directory, skipping: {}",
                root.display()
            );
            return Box::new(std::iter::empty());
        }

        log::debug!("Collecting from {}", root.display());

        let exclude = self.config.exclude.clone();
        let walk_dir = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                // Never descend into excluded directories
                children.retain(|child| match child {
                    Ok(entry) => !exclude.iter().any(|ex| entry.path().starts_with(ex)),
                    Err(_) => true,
                });
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        Box::new(
            walk_dir
                .into_iter()
                .filter_map(move |entry_result| match entry_result {
                    Ok(entry) => {
                        let file_type = entry.file_type();
                        if file_type.is_dir() {
                            return None;
                        }

                        let path = entry.path();
                        if file_type.is_symlink() {
                            if !self.config.follow_symlinks {
                                log::trace!("Skipping symlink: {}", path.display());
                                return None;
                            }
                            // Followed links must still resolve to a regular file
                            if !path.is_file() {
                                return None;
                            }
                        } else if !file_type.is_file() {
                            return None;
                        }

                        self.candidate(path)
                    }
                    Err(e) => {
                        let path = e
                            .path()
                            .map_or_else(|| root.to_path_buf(), std::borrow::ToOwned::to_owned);
                        Some(Err(handle_jwalk_error(path, e)))
                    }
                }),
        )
    }

    /// Apply the extension filter to a discovered file.
    fn candidate(&self, path: PathBuf) -> Option<Result<TemplateFile, ScanError>> {
        let file = TemplateFile::from_path(path)?;
        if !self.config.accepts(&file.extension) {
            log::trace!(
                "Skipping file due to extension filter: {}",
                file.path.display()
            );
            return None;
        }
        Some(Ok(file))
    }
}

/// Convert a jwalk error into a [`ScanError`].
fn handle_jwalk_error(path: PathBuf, error: jwalk::Error) -> ScanError {
    let permission_denied = error
        .io_error()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied);

    if permission_denied {
        log::warn!("Permission denied: {}", path.display());
        ScanError::PermissionDenied(path)
    } else {
        log::warn!("Walker error for {}: {}", path.display(), error);
        ScanError::Io {
            path,
            source: std::io::Error::other(error.to_string()),
        }
    }
}
