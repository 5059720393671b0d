//! The collect → merge → chunk pipeline.
//!
//! A run moves through `Collecting → Merging → Chunking → Done`. Collection is
//! lazy, so candidates stream from the collector straight into the merger.
//! Chunking starts only after merging has finished, and is skipped when the
//! merge found no candidates or moved nothing.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chunk::{ChunkConfig, ChunkError, ChunkStats, Chunker};
use crate::config::Config;
use crate::merge::{MergeConfig, MergeError, MergeStats, Merger};
use crate::progress::ProgressCallback;
use crate::scanner::{Collector, CollectorConfig};

/// Pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Not started
    Idle,
    /// Walking source roots
    Collecting,
    /// Fingerprinting and moving candidates
    Merging,
    /// Splitting the corpus into chunk directories
    Chunking,
    /// Finished (possibly early)
    Done,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Collecting => "collecting",
            Self::Merging => "merging",
            Self::Chunking => "chunking",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every step ran and did work.
    Completed,
    /// No candidates were found (or, without chunking, none were moved).
    NothingToMerge,
    /// Merging moved nothing, or the corpus directory held no loose files.
    NothingToChunk,
    /// Ctrl+C stopped the run between files.
    Interrupted,
}

/// Fatal pipeline errors.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The merge step could not start.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// The chunk step failed.
    #[error(transparent)]
    Chunk(#[from] ChunkError),
}

/// Merge step counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeSummary {
    /// Candidates received from the collector
    pub candidates: usize,
    /// Files moved into the corpus
    pub moved: usize,
    /// Duplicates left at their original location
    pub duplicates: usize,
    /// Bytes of content moved into the corpus
    pub bytes_moved: u64,
    /// Moves that copied across filesystems instead of renaming
    pub copied_across_devices: usize,
    /// Configured roots that did not exist
    pub missing_roots: Vec<PathBuf>,
    /// Per-file faults
    pub errors: usize,
}

impl From<&MergeStats> for MergeSummary {
    fn from(stats: &MergeStats) -> Self {
        Self {
            candidates: stats.candidates,
            moved: stats.moved,
            duplicates: stats.duplicates,
            bytes_moved: stats.bytes_moved,
            copied_across_devices: stats.copied_across_devices,
            missing_roots: stats.missing_roots.clone(),
            errors: stats.error_count(),
        }
    }
}

/// Chunk step counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChunkSummary {
    /// Loose files found in the corpus root
    pub files_listed: usize,
    /// Files moved into a chunk directory
    pub files_chunked: usize,
    /// Chunk directories planned
    pub chunk_count: usize,
    /// Planned size of each chunk, in chunk order
    pub chunk_sizes: Vec<usize>,
    /// Per-file faults
    pub errors: usize,
}

impl From<&ChunkStats> for ChunkSummary {
    fn from(stats: &ChunkStats) -> Self {
        Self {
            files_listed: stats.files_listed,
            files_chunked: stats.files_chunked,
            chunk_count: stats.chunk_count(),
            chunk_sizes: stats.chunk_sizes.clone(),
            errors: stats.errors.len(),
        }
    }
}

/// Report of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// How the run ended
    pub outcome: RunOutcome,
    /// Corpus directory
    pub target: PathBuf,
    /// Merge counts, if the merge step ran
    pub merge: Option<MergeSummary>,
    /// Chunk counts, if the chunk step ran
    pub chunk: Option<ChunkSummary>,
    /// Per-file error messages from both steps
    pub errors: Vec<String>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
}

impl RunReport {
    /// Create an empty report with the given outcome.
    #[must_use]
    pub fn new(outcome: RunOutcome) -> Self {
        Self {
            outcome,
            target: PathBuf::new(),
            merge: None,
            chunk: None,
            errors: Vec::new(),
            duration_ms: 0,
            generated_at: Utc::now(),
        }
    }

    /// Number of per-file errors across all steps.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    fn record_merge(&mut self, stats: &MergeStats) {
        self.merge = Some(MergeSummary::from(stats));
        self.errors.extend(stats.errors.iter().map(ToString::to_string));
    }

    fn record_chunk(&mut self, stats: &ChunkStats) {
        self.chunk = Some(ChunkSummary::from(stats));
        self.errors.extend(stats.errors.iter().map(ToString::to_string));
    }

    fn finish(mut self, started: Instant) -> Self {
        self.duration_ms = duration_ms(started.elapsed());
        self.generated_at = Utc::now();
        self
    }
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Drives one run from a resolved [`Config`].
pub struct Pipeline {
    config: Config,
    state: PipelineState,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl Pipeline {
    /// Create a pipeline for the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: PipelineState::Idle,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Stop between files once this flag is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Report progress to this callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Merge every source into the target, then chunk it.
    ///
    /// # Errors
    ///
    /// Fails if the target directory cannot be prepared or the chunk step
    /// cannot list the target or create a chunk directory.
    pub fn run(&mut self) -> Result<RunReport, PipelineError> {
        self.execute(true)
    }

    /// Merge every source into the flat target without chunking.
    ///
    /// # Errors
    ///
    /// Fails if the target directory cannot be prepared.
    pub fn merge_only(&mut self) -> Result<RunReport, PipelineError> {
        self.execute(false)
    }

    /// Chunk the existing target directory.
    ///
    /// # Errors
    ///
    /// Fails if the target cannot be listed or a chunk directory cannot be
    /// created.
    pub fn chunk_only(&mut self) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let mut report = RunReport::new(RunOutcome::Completed);
        report.target = self.config.resolved_target();

        self.transition(PipelineState::Chunking);
        let stats = self.chunker().chunk(&report.target)?;
        report.record_chunk(&stats);
        report.outcome = chunk_outcome(&stats);
        self.transition(PipelineState::Done);

        Ok(report.finish(started))
    }

    fn execute(&mut self, chunk: bool) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let target = self.config.resolved_target();
        let mut report = RunReport::new(RunOutcome::Completed);
        report.target = target.clone();

        self.transition(PipelineState::Collecting);
        let collector = self.collector(&target);

        // Collection is lazy; candidates flow into the merger as they are found.
        self.transition(PipelineState::Merging);
        let merger = Merger::new(self.merge_config(&target));
        let stats = merger.merge(collector.walk())?;
        report.record_merge(&stats);

        if stats.interrupted {
            report.outcome = RunOutcome::Interrupted;
            self.transition(PipelineState::Done);
            return Ok(report.finish(started));
        }
        if stats.found_nothing() || stats.moved_nothing() {
            log::info!(
                "Nothing merged ({} candidates, {} moved); skipping chunking",
                stats.candidates,
                stats.moved
            );
            // Candidates that were all duplicates or failures leave nothing new to chunk
            report.outcome = if chunk && !stats.found_nothing() {
                RunOutcome::NothingToChunk
            } else {
                RunOutcome::NothingToMerge
            };
            self.transition(PipelineState::Done);
            return Ok(report.finish(started));
        }

        if chunk {
            self.transition(PipelineState::Chunking);
            let chunk_stats = self.chunker().chunk(&target)?;
            report.record_chunk(&chunk_stats);
            report.outcome = chunk_outcome(&chunk_stats);
        }

        self.transition(PipelineState::Done);
        Ok(report.finish(started))
    }

    fn transition(&mut self, next: PipelineState) {
        log::debug!("Pipeline: {} -> {}", self.state, next);
        self.state = next;
    }

    fn collector(&self, target: &std::path::Path) -> Collector {
        let mut config = CollectorConfig::with_extensions(&self.config.extensions)
            .excluding(target.to_path_buf());
        config.follow_symlinks = self.config.follow_symlinks;
        config.skip_hidden = self.config.skip_hidden;

        let collector = Collector::new(self.config.resolved_sources(), config);
        match self.shutdown_flag {
            Some(ref flag) => collector.with_shutdown_flag(Arc::clone(flag)),
            None => collector,
        }
    }

    fn merge_config(&self, target: &std::path::Path) -> MergeConfig {
        let mut config = MergeConfig::new(target.to_path_buf())
            .with_io_threads(self.config.effective_io_threads());
        if let Some(ref flag) = self.shutdown_flag {
            config = config.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(ref callback) = self.progress_callback {
            config = config.with_progress_callback(Arc::clone(callback));
        }
        config
    }

    fn chunker(&self) -> Chunker {
        let mut config =
            ChunkConfig::new(self.config.chunk_size).with_prefix(self.config.chunk_prefix.clone());
        if let Some(ref flag) = self.shutdown_flag {
            config = config.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(ref callback) = self.progress_callback {
            config = config.with_progress_callback(Arc::clone(callback));
        }
        Chunker::new(config)
    }
}

fn chunk_outcome(stats: &ChunkStats) -> RunOutcome {
    if stats.interrupted {
        RunOutcome::Interrupted
    } else if stats.is_empty() {
        RunOutcome::NothingToChunk
    } else {
        RunOutcome::Completed
    }
}
