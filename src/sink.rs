// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error sink.
//!
//! The single consumer of mismatch reports. It owns the output stream and
//! the counters, so no other task ever touches either:
//!
//! ```text
//! scanners ──┐
//!            ├──► mpsc ──► ErrorSink ──► one line per report (stdout)
//! workers ───┘                 │
//!                              └──► SinkSummary (counts by kind)
//! ```
//!
//! The sink finishes when every sender is dropped and the channel is drained,
//! so the summary it returns covers every report that was sent.

use crate::metrics;
use crate::report::{Mismatch, MismatchKind};
use std::io::Write;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, warn, Instrument};

/// Counts of reports received, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkSummary {
    pub content: u64,
    pub inconclusive: u64,
    pub unsupported: u64,
    pub node_failures: u64,
}

impl SinkSummary {
    pub fn record(&mut self, kind: MismatchKind) {
        match kind {
            MismatchKind::Content => self.content += 1,
            MismatchKind::Inconclusive => self.inconclusive += 1,
            MismatchKind::Unsupported => self.unsupported += 1,
            MismatchKind::NodeFailure => self.node_failures += 1,
        }
    }

    /// Every report, whatever its kind.
    pub fn total(&self) -> u64 {
        self.content + self.inconclusive + self.unsupported + self.node_failures
    }
}

/// Writes reports to `out` and counts them.
pub struct ErrorSink<W> {
    out: W,
    summary: SinkSummary,
    write_failed: bool,
}

impl<W: Write + Send + 'static> ErrorSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            summary: SinkSummary::default(),
            write_failed: false,
        }
    }

    /// Run the sink on its own task.
    pub fn spawn(self, reports: mpsc::Receiver<Mismatch>) -> JoinHandle<(SinkSummary, W)> {
        tokio::spawn(self.run(reports).instrument(info_span!("error_sink")))
    }

    /// Drain `reports` until every sender is gone; returns the counts and the writer.
    pub async fn run(mut self, mut reports: mpsc::Receiver<Mismatch>) -> (SinkSummary, W) {
        while let Some(report) = reports.recv().await {
            self.record(&report);
        }

        if let Err(e) = self.out.flush() {
            warn!(error = %e, "Failed to flush report output");
        }

        debug!(total = self.summary.total(), "Error sink drained");
        (self.summary, self.out)
    }

    fn record(&mut self, report: &Mismatch) {
        self.summary.record(report.kind);
        metrics::record_mismatch(report.kind.as_str(), report.operation.as_str());

        // Keep counting after the output breaks (closed pipe) so the verdict stays accurate.
        if self.write_failed {
            return;
        }
        if let Err(e) = writeln!(self.out, "{}", report) {
            warn!(error = %e, "Failed to write report, further reports are counted only");
            self.write_failed = true;
        }
    }
}
