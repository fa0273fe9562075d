// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Mismatch reports.
//!
//! Every finding, whether a real difference or a failure to verify, is a
//! [`Mismatch`]. Reports flow over a channel to the
//! [error sink](crate::sink), which is the only place they are counted and
//! printed. They carry no ordering relative to each other.
//!
//! # Line Format
//!
//! ```text
//! <Operation>:<side>(k=<key>): <detail>
//!
//! Get:dst(k=user:1): src(v=5) != dst(v=6)
//! HScan:dst(k=profile:9): Too few keys than src
//! Type:src(k=queue:jobs): type=list is not supported
//! Scan:src(node=redis://10.0.0.1:6379): Redis error (SCAN): timeout
//! ```

use crate::error::CompareError;
use std::fmt;

/// The store command whose result produced the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Scan,
    Get,
    HScan,
    HMGet,
    Type,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Scan => "Scan",
            Operation::Get => "Get",
            Operation::HScan => "HScan",
            Operation::HMGet => "HMGet",
            Operation::Type => "Type",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which store the report is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Src,
    Dst,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Src => "src",
            Side::Dst => "dst",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a report, used for the verdict breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MismatchKind {
    /// The stores were read successfully and differ.
    Content,
    /// A store call failed, so this key could not be verified.
    Inconclusive,
    /// The source key has a type that is not compared.
    Unsupported,
    /// A source node could not be scanned; its remaining keys were skipped.
    NodeFailure,
}

impl MismatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchKind::Content => "content",
            MismatchKind::Inconclusive => "inconclusive",
            MismatchKind::Unsupported => "unsupported",
            MismatchKind::NodeFailure => "node_failure",
        }
    }
}

/// What a report refers to: a key, or a whole source node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Key(String),
    Node(String),
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub kind: MismatchKind,
    pub operation: Operation,
    pub side: Side,
    pub subject: Subject,
    pub detail: String,
}

impl Mismatch {
    /// The stores were both read and differ for `key`.
    pub fn content(
        operation: Operation,
        key: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind: MismatchKind::Content,
            operation,
            side: Side::Dst,
            subject: Subject::Key(key.into()),
            detail: detail.into(),
        }
    }

    /// A call against `side` failed while verifying `key`.
    pub fn failed(operation: Operation, side: Side, key: impl Into<String>, error: &CompareError) -> Self {
        Self::inconclusive(operation, side, key, error.detail())
    }

    /// `key` could not be verified on `side`.
    pub fn inconclusive(
        operation: Operation,
        side: Side,
        key: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind: MismatchKind::Inconclusive,
            operation,
            side,
            subject: Subject::Key(key.into()),
            detail: detail.into(),
        }
    }

    /// The source type of `key` is not compared.
    pub fn unsupported(key: impl Into<String>, type_name: &str) -> Self {
        Self {
            kind: MismatchKind::Unsupported,
            operation: Operation::Type,
            side: Side::Src,
            subject: Subject::Key(key.into()),
            detail: format!("type={} is not supported", type_name),
        }
    }

    /// A source node's keyspace listing failed.
    pub fn node_failure(node: impl Into<String>, error: &CompareError) -> Self {
        Self {
            kind: MismatchKind::NodeFailure,
            operation: Operation::Scan,
            side: Side::Src,
            subject: Subject::Node(node.into()),
            detail: error.to_string(),
        }
    }

    /// The key this report is about, if any.
    pub fn key(&self) -> Option<&str> {
        match &self.subject {
            Subject::Key(key) => Some(key),
            Subject::Node(_) => None,
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Subject::Key(key) => write!(
                f,
                "{}:{}(k={}): {}",
                self.operation, self.side, key, self.detail
            ),
            Subject::Node(node) => write!(
                f,
                "{}:{}(node={}): {}",
                self.operation, self.side, node, self.detail
            ),
        }
    }
}

/// Render a value for a report line.
pub fn display_value(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_line_format() {
        let m = Mismatch::content(Operation::Get, "x", "src(v=5) != dst(v=6)");
        assert_eq!(m.to_string(), "Get:dst(k=x): src(v=5) != dst(v=6)");
        assert_eq!(m.kind, MismatchKind::Content);
        assert_eq!(m.key(), Some("x"));
    }

    #[test]
    fn test_failed_line_uses_error_detail() {
        let err = CompareError::redis_msg("GET", "i/o timeout");
        let m = Mismatch::failed(Operation::Get, Side::Src, "k1", &err);
        assert_eq!(m.to_string(), "Get:src(k=k1): i/o timeout");
        assert_eq!(m.kind, MismatchKind::Inconclusive);
    }

    #[test]
    fn test_unsupported_line_format() {
        let m = Mismatch::unsupported("jobs", "list");
        assert_eq!(m.to_string(), "Type:src(k=jobs): type=list is not supported");
        assert_eq!(m.kind, MismatchKind::Unsupported);
    }

    #[test]
    fn test_node_failure_line_format() {
        let err = CompareError::redis_msg("SCAN", "connection reset");
        let m = Mismatch::node_failure("redis://10.0.0.1:6379", &err);
        assert_eq!(
            m.to_string(),
            "Scan:src(node=redis://10.0.0.1:6379): Redis error (SCAN): connection reset"
        );
        assert_eq!(m.key(), None);
    }

    #[test]
    fn test_field_map_operations_display() {
        assert_eq!(Operation::HScan.to_string(), "HScan");
        assert_eq!(Operation::HMGet.to_string(), "HMGet");
    }

    #[test]
    fn test_display_value_is_lossy() {
        assert_eq!(display_value(b"plain"), "plain");
        assert_eq!(display_value(b"\xff"), "\u{fffd}");
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(MismatchKind::Content.as_str(), "content");
        assert_eq!(MismatchKind::NodeFailure.as_str(), "node_failure");
    }
}
