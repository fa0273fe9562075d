// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics for observability.
//!
//! Emitted through the `metrics` facade; nothing is exported unless the
//! embedding process installs a recorder. Covers:
//! - Keyspace scanning progress per source node
//! - Keys compared and comparison latency per comparator
//! - Reports by kind and operation
//! - Store command latency
//!
//! # Metric Naming Convention
//!
//! All metrics are prefixed with `compare_` and follow Prometheus conventions:
//! - Counters end in `_total`
//! - Gauges represent current state
//! - Histograms track distributions (duration, size)
//!
//! # Usage
//!
//! ```rust,no_run
//! use redis_compare::metrics;
//! use std::time::Duration;
//!
//! // In a scanner after each SCAN page
//! metrics::record_keys_scanned("redis://10.0.0.1:6379", 1000);
//!
//! // In a worker after comparing one key
//! metrics::record_key_compared("scalar", Duration::from_micros(350));
//! ```

use metrics::{counter, gauge, histogram};
use std::time::Duration;

// =============================================================================
// Scanning
// =============================================================================

/// Record keys listed from a source node.
pub fn record_keys_scanned(node: &str, count: usize) {
    counter!("compare_keys_scanned_total", "node" => node.to_string()).increment(count as u64);
}

/// Record a source node whose listing stopped early.
pub fn record_node_scan_failure(node: &str) {
    counter!("compare_node_scan_failures_total", "node" => node.to_string()).increment(1);
}

/// Keys waiting in the dispatch queue.
pub fn set_dispatch_queue_depth(depth: usize) {
    gauge!("compare_dispatch_queue_depth").set(depth as f64);
}

/// Scanners still listing keys.
pub fn set_active_scanners(count: usize) {
    gauge!("compare_active_scanners").set(count as f64);
}

// =============================================================================
// Comparison
// =============================================================================

/// Record one key compared by `comparator`.
pub fn record_key_compared(comparator: &str, duration: Duration) {
    counter!("compare_keys_compared_total", "comparator" => comparator.to_string()).increment(1);
    histogram!("compare_key_duration_seconds", "comparator" => comparator.to_string())
        .record(duration.as_secs_f64());
}

/// Record how many `HSCAN` rounds a field-map comparison took.
pub fn record_field_map_pages(pages: u64) {
    histogram!("compare_field_map_pages").record(pages as f64);
}

/// Record a report delivered to the error sink.
pub fn record_mismatch(kind: &str, operation: &str) {
    counter!(
        "compare_mismatches_total",
        "kind" => kind.to_string(),
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record a completed run.
pub fn record_run_complete(keys_scanned: u64, errors: u64, duration: Duration) {
    counter!("compare_runs_total").increment(1);
    gauge!("compare_last_run_keys_scanned").set(keys_scanned as f64);
    gauge!("compare_last_run_errors").set(errors as f64);
    histogram!("compare_run_duration_seconds").record(duration.as_secs_f64());
}

// =============================================================================
// Store Commands
// =============================================================================

/// Record latency of a single store command (`SCAN`, `GET`, `HSCAN`, ...).
pub fn record_store_operation_latency(store: &str, operation: &str, duration: Duration) {
    histogram!(
        "compare_store_operation_seconds",
        "store" => store.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}
