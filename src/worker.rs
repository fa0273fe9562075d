// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Comparison workers.
//!
//! A fixed pool of workers shares one receiving end of the dispatch queue.
//! Each key is taken by exactly one worker, compared through the
//! [`ComparatorTable`], and any findings are forwarded to the error sink.
//! A worker exits once the queue is closed and empty.

use crate::compare::ComparatorTable;
use crate::report::Mismatch;
use crate::store::StoreClient;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info_span, warn, Instrument};

/// What one worker did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub keys_compared: u64,
    pub reports: u64,
}

/// Everything a worker reads from; shared by the whole pool.
#[derive(Clone)]
pub struct WorkerContext {
    pub source: Arc<dyn StoreClient>,
    pub destination: Arc<dyn StoreClient>,
    pub comparators: Arc<ComparatorTable>,
}

/// Compare keys from `keys` until the queue is closed and drained.
pub async fn run_worker(
    id: usize,
    context: WorkerContext,
    keys: async_channel::Receiver<String>,
    reports: mpsc::Sender<Mismatch>,
) -> WorkerStats {
    async move {
        let mut stats = WorkerStats::default();

        while let Ok(key) = keys.recv().await {
            let findings = context
                .comparators
                .compare_key(context.source.as_ref(), context.destination.as_ref(), &key)
                .await;
            stats.keys_compared += 1;

            for finding in findings {
                if reports.send(finding).await.is_err() {
                    warn!(key = %key, "Report channel closed, stopping worker");
                    return stats;
                }
                stats.reports += 1;
            }
        }

        debug!(
            keys_compared = stats.keys_compared,
            reports = stats.reports,
            "Worker finished"
        );
        stats
    }
    .instrument(info_span!("worker", id))
    .await
}
