//! Deduplicating merge of candidates into a flat corpus directory.
//!
//! # Overview
//!
//! For each candidate the [`Merger`]:
//! 1. Computes its [`Fingerprint`] (skipping unreadable files)
//! 2. Leaves it in place if the fingerprint is already claimed (duplicate)
//! 3. Otherwise picks a collision-safe name in the target directory
//! 4. Moves the file there and claims the fingerprint
//!
//! Fingerprints are computed in bounded batches on a rayon pool. The claim
//! and move step for each batch runs on the calling thread in candidate
//! order, so two files with the same fingerprint can never both be moved in.
//!
//! # Example
//!
//! ```no_run
//! use tmplmerge::merge::{Merger, MergeConfig};
//! use tmplmerge::scanner::{Collector, CollectorConfig};
//! use std::path::PathBuf;
//!
//! let target = PathBuf::from("/srv/master");
//! let collector = Collector::new(
//!     vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")],
//!     CollectorConfig::with_extensions(["yaml"]).excluding(target.clone()),
//! );
//! let merger = Merger::new(MergeConfig::new(target));
//! let stats = merger.merge(collector.walk()).unwrap();
//! println!("moved {}, duplicates {}", stats.moved, stats.duplicates);
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::index::SeenFingerprintIndex;
use super::naming::resolve_in_dir;
use super::relocate::{relocate, RelocateError, RelocateMethod};
use crate::progress::{ProgressCallback, PHASE_MERGING};
use crate::scanner::{Fingerprint, HashError, Hasher, ScanError, TemplateFile};

/// Fingerprint and byte count, or the read failure.
type HashOutcome = Result<(Fingerprint, u64), HashError>;

/// A candidate with its fingerprint, `None` if it was already relocated.
type Fingerprinted = (TemplateFile, Option<HashOutcome>);

/// Default number of candidates fingerprinted together.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Configuration for a merge run.
#[derive(Clone)]
pub struct MergeConfig {
    /// Flat corpus directory, created if absent.
    pub target: PathBuf,
    /// Number of I/O threads for parallel fingerprinting.
    pub io_threads: usize,
    /// Candidates fingerprinted per batch.
    pub batch_size: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for MergeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeConfig")
            .field("target", &self.target)
            .field("io_threads", &self.io_threads)
            .field("batch_size", &self.batch_size)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl MergeConfig {
    /// Create a configuration merging into `target`.
    #[must_use]
    pub fn new(target: PathBuf) -> Self {
        Self {
            target,
            io_threads: 4,
            batch_size: DEFAULT_BATCH_SIZE,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the I/O thread count (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the fingerprint batch size (minimum 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
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

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// A per-file fault recorded during merging. Never fatal.
#[derive(thiserror::Error, Debug)]
pub enum FileFault {
    /// Traversal error below a source root.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Candidate could not be read for fingerprinting.
    #[error(transparent)]
    Unreadable(#[from] HashError),

    /// Candidate could not be moved into the corpus.
    #[error(transparent)]
    Relocation(#[from] RelocateError),
}

/// Statistics from a merge run.
#[derive(Debug, Default)]
pub struct MergeStats {
    /// Candidates received from the collector
    pub candidates: usize,
    /// Files moved into the corpus
    pub moved: usize,
    /// Duplicates left at their original location
    pub duplicates: usize,
    /// Bytes of content moved into the corpus
    pub bytes_moved: u64,
    /// Moves that fell back to copy and remove across filesystems
    pub copied_across_devices: usize,
    /// Configured roots that did not exist
    pub missing_roots: Vec<PathBuf>,
    /// Per-file faults
    pub errors: Vec<FileFault>,
    /// Whether the run stopped early on shutdown
    pub interrupted: bool,
}

impl MergeStats {
    /// Number of per-file faults.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Whether no candidates were found at all.
    #[must_use]
    pub fn found_nothing(&self) -> bool {
        self.candidates == 0
    }

    /// Whether no file reached the corpus.
    #[must_use]
    pub fn moved_nothing(&self) -> bool {
        self.moved == 0
    }
}

/// Fatal merge errors.
#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    /// The target directory could not be created.
    #[error("cannot create target directory {path}: {source}")]
    TargetDir {
        /// Target directory
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The target path exists but is not a directory.
    #[error("target is not a directory: {0}")]
    TargetNotADirectory(PathBuf),
}

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeAction {
    /// Moved into the corpus under this name
    Moved {
        /// Corpus name
        name: OsString,
        /// How the file got there
        method: RelocateMethod,
    },
    /// Left in place; the fingerprint belongs to this corpus name
    Duplicate(OsString),
}

/// Deduplicating merger.
pub struct Merger {
    config: MergeConfig,
    hasher: Hasher,
}

impl Merger {
    /// Create a merger with the given configuration.
    #[must_use]
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            hasher: Hasher::new(),
        }
    }

    /// Merge candidates using a fresh fingerprint index.
    ///
    /// # Errors
    ///
    /// Fails only if the target directory cannot be created. Per-file
    /// problems are recorded in [`MergeStats::errors`].
    pub fn merge<I>(&self, candidates: I) -> Result<MergeStats, MergeError>
    where
        I: IntoIterator<Item = Result<TemplateFile, ScanError>>,
    {
        let mut index = SeenFingerprintIndex::new();
        self.merge_into(candidates, &mut index)
    }

    /// Merge candidates against a caller-owned index.
    ///
    /// # Errors
    ///
    /// Fails only if the target directory cannot be created.
    pub fn merge_into<I>(
        &self,
        candidates: I,
        index: &mut SeenFingerprintIndex,
    ) -> Result<MergeStats, MergeError>
    where
        I: IntoIterator<Item = Result<TemplateFile, ScanError>>,
    {
        self.ensure_target()?;

        let mut stats = MergeStats::default();
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_MERGING, 0);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()
            .ok();
        if pool.is_none() {
            log::warn!(
                "Failed to create custom thread pool, using global pool with {} threads",
                rayon::current_num_threads()
            );
        }

        let mut candidates = candidates.into_iter();
        let mut exhausted = false;
        while !exhausted {
            if self.config.is_shutdown_requested() {
                log::debug!("Merge: Shutdown requested, stopping");
                stats.interrupted = true;
                break;
            }

            let mut batch = Vec::with_capacity(self.config.batch_size);
            while batch.len() < self.config.batch_size {
                match candidates.next() {
                    None => {
                        exhausted = true;
                        break;
                    }
                    Some(Ok(file)) => batch.push(file),
                    Some(Err(ScanError::MissingSourceRoot(root))) => {
                        stats.missing_roots.push(root);
                    }
                    Some(Err(e)) => stats.errors.push(e.into()),
                }
            }
            if batch.is_empty() {
                continue;
            }

            stats.candidates += batch.len();
            let fingerprinted = self.fingerprint_batch(pool.as_ref(), batch, index);
            for (file, result) in fingerprinted {
                if self.config.is_shutdown_requested() {
                    stats.interrupted = true;
                    break;
                }
                self.settle(file, result, index, &mut stats);
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_MERGING);
        }

        log::info!(
            "Merge complete: {} candidates, {} moved, {} duplicates, {} errors",
            stats.candidates,
            stats.moved,
            stats.duplicates,
            stats.errors.len()
        );

        Ok(stats)
    }

    /// Create the target directory if needed.
    fn ensure_target(&self) -> Result<(), MergeError> {
        let target = &self.config.target;
        if target.exists() && !target.is_dir() {
            return Err(MergeError::TargetNotADirectory(target.clone()));
        }
        fs::create_dir_all(target).map_err(|source| MergeError::TargetDir {
            path: target.clone(),
            source,
        })
    }

    /// Fingerprint a batch in parallel, preserving candidate order.
    ///
    /// Candidates already relocated earlier in the run are not re-read.
    fn fingerprint_batch(
        &self,
        pool: Option<&rayon::ThreadPool>,
        batch: Vec<TemplateFile>,
        index: &SeenFingerprintIndex,
    ) -> Vec<Fingerprinted> {
        let hasher = &self.hasher;
        let work = move || -> Vec<Fingerprinted> {
            batch
                .into_par_iter()
                .map(|file| {
                    if index.is_claimed_source(&file.path) {
                        return (file, None);
                    }
                    let result = hasher.fingerprint(&file.path);
                    (file, Some(result))
                })
                .collect()
        };
        match pool {
            Some(pool) => pool.install(work),
            None => work(),
        }
    }

    /// Decide and act on one fingerprinted candidate.
    ///
    /// This is the only place the index is read and written, and it runs on
    /// a single thread.
    fn settle(
        &self,
        file: TemplateFile,
        result: Option<HashOutcome>,
        index: &mut SeenFingerprintIndex,
        stats: &mut MergeStats,
    ) {
        let position = stats.moved + stats.duplicates + stats.errors.len() + 1;
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_progress(position, &file.path.to_string_lossy());
        }

        // A path relocated earlier in this run is a duplicate of itself
        if index.is_claimed_source(&file.path) {
            log::debug!("Duplicate (already merged): {}", file.path.display());
            stats.duplicates += 1;
            return;
        }

        let (fingerprint, bytes) = match result {
            Some(Ok(hashed)) => hashed,
            Some(Err(e)) => {
                log::warn!("Skipping unreadable file: {}", e);
                stats.errors.push(e.into());
                return;
            }
            None => {
                stats.duplicates += 1;
                return;
            }
        };

        match self.claim(&file, fingerprint, index) {
            Ok(MergeAction::Moved { name, method }) => {
                log::trace!(
                    "Moved {} -> {}",
                    file.path.display(),
                    Path::new(&name).display()
                );
                stats.moved += 1;
                stats.bytes_moved += bytes;
                if method == RelocateMethod::CopyAndRemove {
                    stats.copied_across_devices += 1;
                }
            }
            Ok(MergeAction::Duplicate(existing)) => {
                log::debug!(
                    "Duplicate of {}: {} (left in place)",
                    Path::new(&existing).display(),
                    file.path.display()
                );
                stats.duplicates += 1;
            }
            Err(e) => {
                log::warn!("Relocation failed: {}", e);
                stats.errors.push(e.into());
            }
        }
    }

    /// Check-then-claim for one fingerprint, moving the file if new.
    fn claim(
        &self,
        file: &TemplateFile,
        fingerprint: Fingerprint,
        index: &mut SeenFingerprintIndex,
    ) -> Result<MergeAction, RelocateError> {
        if let Some(existing) = index.get(&fingerprint) {
            return Ok(MergeAction::Duplicate(existing.to_os_string()));
        }

        let target = &self.config.target;
        let name = resolve_in_dir(target, &file.name);
        let method = relocate(&file.path, &target.join(&name))?;
        index.claim(fingerprint, name.clone(), file.path.clone());
        Ok(MergeAction::Moved { name, method })
    }
}
