//! Process exit codes and structured fatal errors.

use serde::Serialize;

use crate::pipeline::{RunOutcome, RunReport};

/// Exit codes for tmplmerge.
///
/// - 0: Success (the run completed and did its work)
/// - 1: General error (configuration, target directory, unexpected failure)
/// - 2: Nothing to do (no candidates found, nothing moved, or nothing to chunk)
/// - 3: Partial success (completed, but some files were skipped with errors)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// The run completed.
    Success = 0,
    /// A fatal error stopped the run.
    GeneralError = 1,
    /// The run completed without any work to do.
    NothingToDo = 2,
    /// The run completed with per-file errors.
    PartialSuccess = 3,
    /// Ctrl+C stopped the run between files.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "TM000",
            Self::GeneralError => "TM001",
            Self::NothingToDo => "TM002",
            Self::PartialSuccess => "TM003",
            Self::Interrupted => "TM130",
        }
    }

    /// Exit code for a finished run.
    ///
    /// Interruption wins over per-file errors, which win over an empty run.
    #[must_use]
    pub fn from_report(report: &RunReport) -> Self {
        match report.outcome {
            RunOutcome::Interrupted => Self::Interrupted,
            _ if report.error_count() > 0 => Self::PartialSuccess,
            RunOutcome::NothingToMerge | RunOutcome::NothingToChunk => Self::NothingToDo,
            RunOutcome::Completed => Self::Success,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "TM001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
