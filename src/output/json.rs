//! JSON output for scripting.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "report": {
//!     "outcome": "completed",
//!     "target": "/home/me/master_nuclei",
//!     "merge": { "candidates": 12, "moved": 9, "duplicates": 3, ... },
//!     "chunk": { "files_chunked": 9, "chunk_count": 1, ... },
//!     "errors": [],
//!     "duration_ms": 42,
//!     "generated_at": "2026-10-18T09:00:00Z"
//!   },
//!   "exit_code": 0,
//!   "exit_code_name": "TM000"
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::error::ExitCode;
use crate::pipeline::RunReport;

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// The run report
    pub report: &'a RunReport,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "TM000")
    pub exit_code_name: &'static str,
}

impl<'a> JsonOutput<'a> {
    /// Wrap a report together with the exit code it produces.
    #[must_use]
    pub fn new(report: &'a RunReport, exit_code: ExitCode) -> Self {
        Self {
            report,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
