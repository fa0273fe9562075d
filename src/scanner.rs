// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Keyspace scanners.
//!
//! One scanner runs per source endpoint, each over its own single-node
//! connection, because `SCAN` only walks the node it is sent to. A scanner
//! pages from cursor 0 until the node returns cursor 0 and pushes every key
//! into the shared dispatch queue. Pushing blocks while the queue is full,
//! which is what bounds memory when the workers fall behind.
//!
//! # Failure Handling
//!
//! A node that cannot be reached, or whose `SCAN` fails part way, produces a
//! single node-failure report. Keys already queued from it are still
//! compared; the other scanners carry on.
//!
//! A key whose name is not valid UTF-8 is reported as inconclusive on its
//! own and the scan continues.

use crate::config::ScanConfig;
use crate::error::CompareError;
use crate::metrics;
use crate::report::{display_value, Mismatch, Operation, Side};
use crate::store::{Page, StoreClient};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// A source node to scan.
pub struct ScanNode {
    /// Position of the endpoint on the command line.
    pub index: usize,
    pub name: String,
    connection: Result<Arc<dyn StoreClient>, CompareError>,
}

impl ScanNode {
    pub fn connected(index: usize, store: Arc<dyn StoreClient>) -> Self {
        Self {
            index,
            name: store.name().to_string(),
            connection: Ok(store),
        }
    }

    /// A node whose connection failed; scanning it reports `error`.
    pub fn unreachable(index: usize, name: impl Into<String>, error: CompareError) -> Self {
        Self {
            index,
            name: name.into(),
            connection: Err(error),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_ok()
    }
}

/// What one scanner did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub node: String,
    pub keys: u64,
    pub pages: u64,
    /// Keys skipped because their names are not valid UTF-8.
    pub undecodable: u64,
    /// The listing stopped before the node returned cursor 0.
    pub failed: bool,
}

/// Scan `node` to completion, feeding keys to `keys`.
///
/// Returns early, without a report, if the dispatch queue is closed.
pub async fn run_scanner(
    node: ScanNode,
    config: ScanConfig,
    keys: async_channel::Sender<String>,
    reports: mpsc::Sender<Mismatch>,
) -> ScanStats {
    let span = info_span!("scanner", index = node.index, node = %node.name);

    async move {
        let mut stats = ScanStats {
            node: node.name.clone(),
            ..Default::default()
        };

        let store = match node.connection {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "Source node unreachable, skipping its keys");
                fail(&mut stats, &reports, e).await;
                return stats;
            }
        };

        info!(pattern = ?config.match_pattern(), fetch_count = config.fetch_count, "Starting scan");

        let mut cursor = 0;
        loop {
            let page = match store
                .scan_keys(cursor, config.match_pattern(), config.fetch_count)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    error!(cursor, scanned = stats.keys, error = %e, "Scan failed, abandoning node");
                    fail(&mut stats, &reports, e).await;
                    return stats;
                }
            };
            stats.pages += 1;

            let Page {
                cursor: next,
                items,
                undecodable,
            } = page;

            for raw in undecodable {
                warn!(key = %display_value(&raw), "Key is not valid UTF-8, skipping");
                stats.undecodable += 1;
                let report = Mismatch::inconclusive(
                    Operation::Scan,
                    Side::Src,
                    display_value(&raw),
                    "key is not valid UTF-8",
                );
                if reports.send(report).await.is_err() {
                    debug!("Report channel closed before undecodable key was delivered");
                }
            }

            let listed = items.len();
            for key in items {
                if config.progress_interval > 0
                    && stats.keys > 0
                    && stats.keys % config.progress_interval == 0
                {
                    info!(scanned = stats.keys, "Scan progress");
                }
                if keys.send(key).await.is_err() {
                    warn!(scanned = stats.keys, "Dispatch queue closed, stopping scan");
                    return stats;
                }
                stats.keys += 1;
            }

            metrics::record_keys_scanned(&stats.node, listed);
            metrics::set_dispatch_queue_depth(keys.len());

            if next == 0 {
                break;
            }
            cursor = next;
        }

        info!(total = stats.keys, pages = stats.pages, "Scan complete");
        stats
    }
    .instrument(span)
    .await
}

async fn fail(stats: &mut ScanStats, reports: &mpsc::Sender<Mismatch>, error: CompareError) {
    stats.failed = true;
    metrics::record_node_scan_failure(&stats.node);
    if reports
        .send(Mismatch::node_failure(&stats.node, &error))
        .await
        .is_err()
    {
        debug!("Report channel closed before node failure was delivered");
    }
}
