//! Partitioning of a flat corpus directory into numbered chunk directories.
//!
//! # Overview
//!
//! The [`Chunker`] lists the regular files directly inside the corpus root,
//! sorts them byte-wise by name, and moves consecutive groups of at most
//! `chunk_size` files into `<prefix>1`, `<prefix>2`, ... Chunk membership is
//! a pure function of the sorted listing, so the same listing always yields
//! the same assignment. Existing subdirectories are neither listed nor moved.
//!
//! # Example
//!
//! ```no_run
//! use tmplmerge::chunk::{Chunker, ChunkConfig};
//! use std::path::Path;
//!
//! let chunker = Chunker::new(ChunkConfig::new(100));
//! let stats = chunker.chunk(Path::new("/srv/master")).unwrap();
//! println!("{} files in {} chunks", stats.files_chunked, stats.chunk_count());
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::merge::naming::resolve_in_dir;
use crate::merge::relocate::{relocate, RelocateError};
use crate::progress::{ProgressCallback, PHASE_CHUNKING};

/// Default chunk directory prefix.
pub const DEFAULT_CHUNK_PREFIX: &str = "chunk_";

/// Default number of files per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Error type for the chunk pass.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Chunk size must be at least 1.
    #[error("chunk size must be a positive integer")]
    InvalidChunkSize,

    /// The corpus directory could not be listed.
    #[error("cannot list {path}: {source}")]
    ListTarget {
        /// Corpus directory
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A chunk directory could not be created.
    #[error("cannot create chunk directory {path}: {source}")]
    CreateChunkDir {
        /// Chunk directory
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// A per-file fault recorded during chunking. Never fatal.
#[derive(Debug, Error)]
pub enum ChunkFault {
    /// The file could not be moved into its chunk directory.
    #[error(transparent)]
    Relocation(#[from] RelocateError),

    /// The chunk directory path is taken by a non-directory entry.
    #[error("{file} left in place: chunk directory {chunk_dir} is occupied by a file")]
    ChunkDirOccupied {
        /// File that stays in the corpus root
        file: PathBuf,
        /// Planned chunk directory
        chunk_dir: PathBuf,
    },
}

/// Configuration for the chunk pass.
#[derive(Clone)]
pub struct ChunkConfig {
    /// Maximum files per chunk (at least 1).
    pub chunk_size: usize,
    /// Chunk directory name prefix.
    pub prefix: String,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ChunkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkConfig")
            .field("chunk_size", &self.chunk_size)
            .field("prefix", &self.prefix)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ChunkConfig {
    /// Create a configuration with the given chunk size.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            prefix: DEFAULT_CHUNK_PREFIX.to_string(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the chunk directory prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Name of the `number`-th chunk directory (1-based).
    #[must_use]
    pub fn chunk_dir_name(&self, number: usize) -> String {
        format!("{}{}", self.prefix, number)
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics from a chunk pass.
#[derive(Debug, Default)]
pub struct ChunkStats {
    /// Loose files found in the corpus root
    pub files_listed: usize,
    /// Files moved into a chunk directory
    pub files_chunked: usize,
    /// Planned size of each chunk, in chunk order
    pub chunk_sizes: Vec<usize>,
    /// Per-file faults
    pub errors: Vec<ChunkFault>,
    /// Whether the pass stopped early on shutdown
    pub interrupted: bool,
}

impl ChunkStats {
    /// Number of chunks planned.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunk_sizes.len()
    }

    /// Whether there was nothing to chunk.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files_listed == 0
    }
}

/// Split a sorted listing into consecutive groups of at most `chunk_size`.
///
/// Every group but the last holds exactly `chunk_size` items.
///
/// # Errors
///
/// Returns [`ChunkError::InvalidChunkSize`] if `chunk_size` is 0.
pub fn plan_chunks<T: Clone>(listing: &[T], chunk_size: usize) -> Result<Vec<Vec<T>>, ChunkError> {
    if chunk_size == 0 {
        return Err(ChunkError::InvalidChunkSize);
    }
    Ok(listing.chunks(chunk_size).map(<[T]>::to_vec).collect())
}

/// List regular files directly inside `dir`, sorted byte-wise by name.
///
/// Subdirectories and symlinks are excluded.
///
/// # Errors
///
/// Returns [`ChunkError::ListTarget`] if the directory cannot be read.
pub fn list_loose_files(dir: &Path) -> Result<Vec<OsString>, ChunkError> {
    let list_err = |source| ChunkError::ListTarget {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        match entry.file_type() {
            Ok(ft) if ft.is_file() => names.push(entry.file_name()),
            Ok(_) => {}
            Err(e) => {
                log::warn!("Cannot stat {}: {}", entry.path().display(), e);
            }
        }
    }
    names.sort_by(|a, b| a.as_encoded_bytes().cmp(b.as_encoded_bytes()));
    Ok(names)
}

/// Corpus chunker.
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    /// Create a chunker with the given configuration.
    #[must_use]
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Partition the loose files of `dir` into chunk directories.
    ///
    /// An empty directory is a no-op and returns stats with
    /// [`ChunkStats::is_empty`] set.
    ///
    /// # Errors
    ///
    /// Fails if the chunk size is invalid, the directory cannot be listed,
    /// or a chunk directory cannot be created. A single file that cannot be
    /// moved is recorded in [`ChunkStats::errors`] instead, as is every file
    /// of a group whose chunk directory path is occupied by a loose file.
    pub fn chunk(&self, dir: &Path) -> Result<ChunkStats, ChunkError> {
        let listing = list_loose_files(dir)?;
        let plan = plan_chunks(&listing, self.config.chunk_size)?;

        let mut stats = ChunkStats {
            files_listed: listing.len(),
            chunk_sizes: plan.iter().map(Vec::len).collect(),
            ..ChunkStats::default()
        };

        if listing.is_empty() {
            log::info!("Nothing to chunk in {}", dir.display());
            return Ok(stats);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_CHUNKING, listing.len());
        }

        'chunks: for (i, group) in plan.iter().enumerate() {
            if self.config.is_shutdown_requested() {
                log::debug!("Chunk: Shutdown requested, stopping");
                stats.interrupted = true;
                break;
            }

            let chunk_dir = dir.join(self.config.chunk_dir_name(i + 1));
            if let Err(source) = fs::create_dir_all(&chunk_dir) {
                if chunk_dir.symlink_metadata().is_ok_and(|m| !m.is_dir()) {
                    log::warn!(
                        "Chunk directory {} is occupied by a file, leaving {} files in place",
                        chunk_dir.display(),
                        group.len()
                    );
                    let occupied = group.iter().map(|name| ChunkFault::ChunkDirOccupied {
                        file: dir.join(name),
                        chunk_dir: chunk_dir.clone(),
                    });
                    stats.errors.extend(occupied);
                    continue;
                }
                return Err(ChunkError::CreateChunkDir {
                    path: chunk_dir,
                    source,
                });
            }
            log::debug!("Filling {} with {} files", chunk_dir.display(), group.len());

            for name in group {
                if self.config.is_shutdown_requested() {
                    log::debug!("Chunk: Shutdown requested, stopping");
                    stats.interrupted = true;
                    break 'chunks;
                }

                let from = dir.join(name);
                let dest_name = resolve_in_dir(&chunk_dir, name);
                match relocate(&from, &chunk_dir.join(&dest_name)) {
                    Ok(_) => stats.files_chunked += 1,
                    Err(e) => {
                        log::warn!("Chunk relocation failed: {}", e);
                        stats.errors.push(e.into());
                    }
                }

                if let Some(ref callback) = self.config.progress_callback {
                    callback.on_progress(
                        stats.files_chunked + stats.errors.len(),
                        &from.to_string_lossy(),
                    );
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_CHUNKING);
        }

        log::info!(
            "Chunking complete: {} files into {} chunks ({} errors)",
            stats.files_chunked,
            stats.chunk_count(),
            stats.errors.len()
        );

        Ok(stats)
    }
}
