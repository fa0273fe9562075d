// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Comparison engine coordinator.
//!
//! Ties together:
//! - Keyspace scanners via [`crate::scanner::run_scanner`], one per source node
//! - A fixed worker pool via [`crate::worker::run_worker`]
//! - The [`ErrorSink`](crate::sink::ErrorSink), sole owner of report output
//!
//! # Architecture
//!
//! ```text
//!  scanner[0] ─┐                       ┌─ worker[0] ─┐
//!  scanner[1] ─┼─► dispatch queue ─────┼─ worker[1] ─┼─► reports ─► sink
//!  scanner[n] ─┘   (bounded, MPMC)     └─ worker[p] ─┘      ▲
//!        └───────────── node failures ──────────────────────┘
//! ```
//!
//! # Drain Order
//!
//! 1. Every scanner finishes (or fails) before the dispatch queue is closed.
//! 2. Every worker drains the closed queue and exits.
//! 3. The report channel is closed and the sink drains it.
//!
//! So the final count includes every report from every key that was queued.

mod types;

pub use types::{Verdict, EXIT_FAILURE, EXIT_MATCH, EXIT_MISMATCH};

use crate::client::RedisStore;
use crate::compare::ComparatorTable;
use crate::config::{endpoint_url, CompareConfig};
use crate::error::{CompareError, Result};
use crate::metrics;
use crate::resilience::RetryConfig;
use crate::scanner::{run_scanner, ScanNode};
use crate::sink::ErrorSink;
use crate::store::StoreClient;
use crate::worker::{run_worker, WorkerContext};
use futures::future::join_all;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Reports buffered between producers and the sink.
const REPORT_CHANNEL_CAPACITY: usize = 1024;

/// A single comparison run between two stores.
///
/// Built from already-connected stores with [`CompareEngine::new`], or from
/// configuration with [`CompareEngine::connect`]. Consumed by [`run`](Self::run).
pub struct CompareEngine {
    config: CompareConfig,
    source: Arc<dyn StoreClient>,
    destination: Arc<dyn StoreClient>,
    nodes: Vec<ScanNode>,
    comparators: ComparatorTable,
}

impl CompareEngine {
    /// Create an engine over connected stores.
    ///
    /// `nodes` are the source nodes to list keys from; `source` is used for
    /// `TYPE` and value reads and may route across all of them.
    pub fn new(
        config: CompareConfig,
        source: Arc<dyn StoreClient>,
        destination: Arc<dyn StoreClient>,
        nodes: Vec<ScanNode>,
    ) -> Self {
        let comparators = ComparatorTable::with_defaults(config.scan.fetch_count);
        Self {
            config,
            source,
            destination,
            nodes,
            comparators,
        }
    }

    /// Replace the comparator table.
    pub fn with_comparators(mut self, comparators: ComparatorTable) -> Self {
        self.comparators = comparators;
        self
    }

    /// Connect to both deployments and every source node.
    ///
    /// Fails if either deployment is unreachable. An unreachable source node
    /// in a cluster does not fail the run; it is reported once scanning starts.
    pub async fn connect(config: CompareConfig) -> Result<Self> {
        config.validate()?;
        let retry = RetryConfig::startup(&config.connection);

        info!(
            source = ?config.source.endpoints,
            destination = ?config.destination.endpoints,
            read_timeout_sec = config.connection.read_timeout_sec,
            pool_size = config.connection.pool_size,
            "Connecting to stores"
        );
        debug!(
            idle_timeout_sec = config.connection.idle_timeout_sec,
            "Idle connections are kept for the whole run"
        );

        let (source, destination) = tokio::try_join!(
            RedisStore::connect(&config.source.endpoints, &config.connection, &retry),
            RedisStore::connect(&config.destination.endpoints, &config.connection, &retry),
        )?;

        let source: Arc<dyn StoreClient> = Arc::new(source);
        let nodes = if config.source.is_cluster() {
            Self::connect_nodes(&config, &retry).await
        } else {
            vec![ScanNode::connected(0, Arc::clone(&source))]
        };

        Ok(Self::new(config, source, Arc::new(destination), nodes))
    }

    async fn connect_nodes(config: &CompareConfig, retry: &RetryConfig) -> Vec<ScanNode> {
        let attempts = config.source.endpoints.iter().map(|endpoint| {
            RedisStore::connect_node(endpoint, &config.connection, retry)
        });

        join_all(attempts)
            .await
            .into_iter()
            .zip(&config.source.endpoints)
            .enumerate()
            .map(|(index, (result, endpoint))| match result {
                Ok(store) => ScanNode::connected(index, Arc::new(store)),
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "Failed to connect to source node");
                    ScanNode::unreachable(index, endpoint_url(endpoint), e)
                }
            })
            .collect()
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[ScanNode] {
        &self.nodes
    }

    /// Scan, compare and report. Reports are written to `out`, one per line.
    ///
    /// Returns the verdict and the writer once every report has been written.
    pub async fn run<W: Write + Send + 'static>(self, out: W) -> Result<(Verdict, W)> {
        let Self {
            config,
            source,
            destination,
            nodes,
            comparators,
        } = self;

        let started = Instant::now();
        let parallel = config.workers.parallel.max(1);
        let queue_capacity = config.workers.queue_capacity();

        info!(
            source = source.name(),
            destination = destination.name(),
            nodes = nodes.len(),
            parallel,
            queue_capacity,
            "Starting comparison"
        );

        let (report_tx, report_rx) = mpsc::channel(REPORT_CHANNEL_CAPACITY);
        let sink = ErrorSink::new(out).spawn(report_rx);

        let (key_tx, key_rx) = async_channel::bounded(queue_capacity);

        let context = WorkerContext {
            source,
            destination,
            comparators: Arc::new(comparators),
        };
        let workers: Vec<_> = (0..parallel)
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    context.clone(),
                    key_rx.clone(),
                    report_tx.clone(),
                ))
            })
            .collect();
        drop(key_rx);

        metrics::set_active_scanners(nodes.len());
        let scanners: Vec<_> = nodes
            .into_iter()
            .map(|node| {
                tokio::spawn(run_scanner(
                    node,
                    config.scan.clone(),
                    key_tx.clone(),
                    report_tx.clone(),
                ))
            })
            .collect();

        let mut verdict = Verdict::default();

        for result in join_all(scanners).await {
            match result {
                Ok(stats) => {
                    verdict.keys_scanned += stats.keys;
                    if stats.failed {
                        verdict.nodes_failed += 1;
                    }
                }
                Err(e) => {
                    error!(error = %e, "Scanner task panicked");
                    verdict.task_failures += 1;
                }
            }
        }
        metrics::set_active_scanners(0);
        key_tx.close();
        debug!(keys_scanned = verdict.keys_scanned, "All scanners finished, dispatch queue closed");

        for result in join_all(workers).await {
            match result {
                Ok(stats) => verdict.keys_compared += stats.keys_compared,
                Err(e) => {
                    error!(error = %e, "Worker task panicked");
                    verdict.task_failures += 1;
                }
            }
        }
        debug!(keys_compared = verdict.keys_compared, "All workers finished");

        drop(report_tx);
        let (reports, out) = sink
            .await
            .map_err(|e| CompareError::Internal(format!("error sink task failed: {}", e)))?;

        verdict.reports = reports;
        verdict.elapsed = started.elapsed();

        metrics::record_run_complete(verdict.keys_scanned, verdict.errors(), verdict.elapsed);
        info!(
            errors = verdict.errors(),
            content = verdict.reports.content,
            inconclusive = verdict.reports.inconclusive,
            unsupported = verdict.reports.unsupported,
            node_failures = verdict.reports.node_failures,
            keys_scanned = verdict.keys_scanned,
            elapsed_ms = verdict.elapsed.as_millis() as u64,
            "Comparison finished"
        );

        Ok((verdict, out))
    }
}
