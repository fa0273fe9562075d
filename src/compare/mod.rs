// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Type-specific comparison.
//!
//! A [`Comparator`] knows how to compare one Redis type between the source
//! and destination stores. The [`ComparatorTable`] maps the source key's
//! [`KeyType`] to the comparator that handles it; a type with no entry is
//! reported as unsupported. New types are supported by registering another
//! comparator, without touching the dispatch code.
//!
//! ```text
//! TYPE key (source)
//!    │
//!    ├── string ──► ScalarComparator    (GET on both sides)
//!    ├── hash ────► FieldMapComparator  (HSCAN + HMGET in lock-step)
//!    ├── none ────► inconclusive report (key vanished after SCAN)
//!    └── other ───► unsupported report
//! ```

mod field_map;
mod scalar;

pub use field_map::FieldMapComparator;
pub use scalar::ScalarComparator;

use crate::metrics;
use crate::report::{Mismatch, Operation, Side};
use crate::store::{KeyType, StoreClient};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Boxed future returned by [`Comparator::compare`].
pub type CompareFuture<'a> = Pin<Box<dyn Future<Output = Vec<Mismatch>> + Send + 'a>>;

/// Compares one key of a given type between two stores.
///
/// Implementations never fail: every store error is turned into a report
/// for this key, and the comparison of other keys carries on.
pub trait Comparator: Send + Sync + 'static {
    /// Short name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Compare `key` between `source` and `destination`. An empty result means equal.
    fn compare<'a>(
        &'a self,
        source: &'a dyn StoreClient,
        destination: &'a dyn StoreClient,
        key: &'a str,
    ) -> CompareFuture<'a>;
}

/// Dispatch table from key type to comparator.
#[derive(Clone, Default)]
pub struct ComparatorTable {
    entries: HashMap<KeyType, Arc<dyn Comparator>>,
}

impl ComparatorTable {
    /// An empty table: every key is unsupported.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scalars and field-maps, paging field-maps `fetch_count` fields at a time.
    pub fn with_defaults(fetch_count: usize) -> Self {
        let mut table = Self::new();
        table.register(KeyType::Scalar, Arc::new(ScalarComparator));
        table.register(
            KeyType::FieldMap,
            Arc::new(FieldMapComparator::new(fetch_count)),
        );
        table
    }

    /// Route keys of `key_type` to `comparator`, replacing any previous entry.
    pub fn register(&mut self, key_type: KeyType, comparator: Arc<dyn Comparator>) {
        self.entries.insert(key_type, comparator);
    }

    pub fn get(&self, key_type: &KeyType) -> Option<&Arc<dyn Comparator>> {
        self.entries.get(key_type)
    }

    /// Classify `key` on the source and run the matching comparator.
    pub async fn compare_key(
        &self,
        source: &dyn StoreClient,
        destination: &dyn StoreClient,
        key: &str,
    ) -> Vec<Mismatch> {
        let key_type = match source.key_type(key).await {
            Ok(key_type) => key_type,
            Err(e) => return vec![Mismatch::failed(Operation::Type, Side::Src, key, &e)],
        };

        if key_type == KeyType::Missing {
            return vec![Mismatch::inconclusive(
                Operation::Type,
                Side::Src,
                key,
                "key no longer exists",
            )];
        }

        let Some(comparator) = self.get(&key_type) else {
            return vec![Mismatch::unsupported(key, key_type.as_str())];
        };

        let start = Instant::now();
        let findings = comparator.compare(source, destination, key).await;
        metrics::record_key_compared(comparator.name(), start.elapsed());
        findings
    }
}
