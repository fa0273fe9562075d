// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Run outcome types.
//!
//! # Exit Codes
//!
//! ```text
//! 0  no reports: every scanned key matched
//! 1  the run could not start (usage, configuration, connection)
//! 2  at least one report of any kind
//! ```
//!
//! A single non-zero code covers every report kind. Callers that need to
//! tell "the stores differ" from "some keys could not be verified" use the
//! per-kind counts or [`Verdict::is_conclusive`].

use crate::sink::SinkSummary;
use std::fmt;
use std::time::Duration;

/// Exit code for a run with no reports.
pub const EXIT_MATCH: u8 = 0;

/// Exit code for a run that could not start.
pub const EXIT_FAILURE: u8 = 1;

/// Exit code for a run with at least one report.
pub const EXIT_MISMATCH: u8 = 2;

/// Outcome of a comparison run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Reports by kind, as counted by the error sink.
    pub reports: SinkSummary,

    /// Keys listed by all scanners.
    pub keys_scanned: u64,

    /// Keys taken from the dispatch queue and compared.
    pub keys_compared: u64,

    /// Scanners whose node listing stopped early.
    pub nodes_failed: usize,

    /// Scanner or worker tasks that panicked.
    pub task_failures: usize,

    pub elapsed: Duration,
}

impl Verdict {
    /// Total report count, printed as `Error=<n>`.
    pub fn errors(&self) -> u64 {
        self.reports.total()
    }

    /// No reports and no lost tasks.
    pub fn is_match(&self) -> bool {
        self.errors() == 0 && self.task_failures == 0
    }

    /// Every scanned key was read successfully on both sides.
    ///
    /// A conclusive verdict with reports means the stores really differ.
    pub fn is_conclusive(&self) -> bool {
        self.reports.inconclusive == 0
            && self.reports.node_failures == 0
            && self.nodes_failed == 0
            && self.task_failures == 0
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_match() {
            EXIT_MATCH
        } else {
            EXIT_MISMATCH
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error={} (content={}, inconclusive={}, unsupported={}, node_failures={}) scanned={} compared={}",
            self.errors(),
            self.reports.content,
            self.reports.inconclusive,
            self.reports.unsupported,
            self.reports.node_failures,
            self.keys_scanned,
            self.keys_compared,
        )
    }
}
