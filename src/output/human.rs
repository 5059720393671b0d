//! Plain-text run summary.

use std::fmt::Write as _;
use std::io::Write;

use bytesize::ByteSize;

use crate::pipeline::{RunOutcome, RunReport};

/// Terminal summary of a [`RunReport`].
#[derive(Debug, Clone, Copy)]
pub struct HumanOutput<'a> {
    report: &'a RunReport,
}

impl<'a> HumanOutput<'a> {
    /// Wrap a report.
    #[must_use]
    pub fn new(report: &'a RunReport) -> Self {
        Self { report }
    }

    /// Render the summary.
    #[must_use]
    pub fn render(&self) -> String {
        let report = self.report;
        let mut out = String::new();

        let headline = match report.outcome {
            RunOutcome::Completed => "Done",
            RunOutcome::NothingToMerge => "Nothing to merge",
            RunOutcome::NothingToChunk => "Nothing to chunk",
            RunOutcome::Interrupted => "Interrupted",
        };
        let _ = writeln!(out, "{headline}: {}", report.target.display());

        if let Some(ref merge) = report.merge {
            let _ = writeln!(
                out,
                "  merged:  {} moved ({}), {} duplicates left in place, {} candidates",
                merge.moved,
                ByteSize::b(merge.bytes_moved),
                merge.duplicates,
                merge.candidates
            );
            if merge.copied_across_devices > 0 {
                let _ = writeln!(
                    out,
                    "  {} moves copied across filesystems",
                    merge.copied_across_devices
                );
            }
            for root in &merge.missing_roots {
                let _ = writeln!(out, "  missing source: {}", root.display());
            }
        }

        if let Some(ref chunk) = report.chunk {
            let _ = writeln!(
                out,
                "  chunked: {} files into {} directories",
                chunk.files_chunked, chunk.chunk_count
            );
        }

        if !report.errors.is_empty() {
            let _ = writeln!(out, "  {} files skipped:", report.errors.len());
            for error in &report.errors {
                let _ = writeln!(out, "    {error}");
            }
        }

        let _ = writeln!(out, "  took {} ms", report.duration_ms);
        out
    }

    /// Write the summary to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.render().as_bytes())
    }
}
