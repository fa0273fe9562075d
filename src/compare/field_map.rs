// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Field-map (`hash`) comparison.
//!
//! Both sides are paged with `HSCAN` in lock-step, each with its own cursor:
//!
//! ```text
//! loop:
//!   src page ← HSCAN src key src_cursor COUNT n
//!   dst page ← HSCAN dst key dst_cursor COUNT n
//!   src page fields ≠ dst page fields      → "Fields not match"
//!   HMGET src fields on both sides, differ → "Values not match"
//!   src done, dst not                      → "Too many keys than src"
//!   dst done, src not                      → "Too few keys than src"
//!   both done                              → equal
//! ```
//!
//! Field order within a page is compared strictly. A field-map that is
//! equal in content but iterates differently (different encoding, rehash in
//! progress) is reported as differing.
//!
//! The termination labels describe the destination relative to the source:
//! "Too few" means the destination ran out of fields first. Tools that label
//! from the source's point of view print the opposite text for the same
//! condition.
//!
//! A field name that is not valid UTF-8 cannot be passed to `HMGET` here, so
//! the key is reported as inconclusive (`HScan`) rather than compared.

use super::{CompareFuture, Comparator};
use crate::metrics;
use crate::report::{Mismatch, Operation, Side};
use crate::store::{Page, StoreClient};
use tracing::trace;

/// Compares field-maps page by page, `fetch_count` fields per page.
#[derive(Debug, Clone)]
pub struct FieldMapComparator {
    fetch_count: usize,
}

impl FieldMapComparator {
    pub fn new(fetch_count: usize) -> Self {
        Self {
            fetch_count: fetch_count.max(1),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    async fn first_difference(
        &self,
        source: &dyn StoreClient,
        destination: &dyn StoreClient,
        key: &str,
    ) -> Option<Mismatch> {
        let mut src_cursor = 0;
        let mut dst_cursor = 0;
        let mut pages = 0u64;

        let outcome = loop {
            pages += 1;

            let src_page = match scan_page(source, Side::Src, key, src_cursor, self.fetch_count).await {
                Ok(page) => page,
                Err(m) => break Some(m),
            };
            let dst_page =
                match scan_page(destination, Side::Dst, key, dst_cursor, self.fetch_count).await {
                    Ok(page) => page,
                    Err(m) => break Some(m),
                };

            if src_page.items != dst_page.items {
                break Some(Mismatch::content(Operation::HScan, key, "Fields not match"));
            }

            let src_values = match source.get_fields(key, &src_page.items).await {
                Ok(values) => values,
                Err(e) => break Some(Mismatch::failed(Operation::HMGet, Side::Src, key, &e)),
            };
            let dst_values = match destination.get_fields(key, &src_page.items).await {
                Ok(values) => values,
                Err(e) => break Some(Mismatch::failed(Operation::HMGet, Side::Dst, key, &e)),
            };

            if src_values != dst_values {
                break Some(Mismatch::content(Operation::HMGet, key, "Values not match"));
            }

            match (src_page.is_last(), dst_page.is_last()) {
                (true, true) => break None,
                (true, false) => {
                    break Some(Mismatch::content(
                        Operation::HScan,
                        key,
                        "Too many keys than src",
                    ))
                }
                (false, true) => {
                    break Some(Mismatch::content(
                        Operation::HScan,
                        key,
                        "Too few keys than src",
                    ))
                }
                (false, false) => {
                    src_cursor = src_page.cursor;
                    dst_cursor = dst_page.cursor;
                }
            }
        };

        trace!(key, pages, differs = outcome.is_some(), "Field-map compared");
        metrics::record_field_map_pages(pages);
        outcome
    }
}

async fn scan_page(
    store: &dyn StoreClient,
    side: Side,
    key: &str,
    cursor: u64,
    count: usize,
) -> std::result::Result<Page, Mismatch> {
    store
        .scan_fields(key, cursor, None, count)
        .await
        .map_err(|e| Mismatch::failed(Operation::HScan, side, key, &e))
}

impl Comparator for FieldMapComparator {
    fn name(&self) -> &'static str {
        "field_map"
    }

    fn compare<'a>(
        &'a self,
        source: &'a dyn StoreClient,
        destination: &'a dyn StoreClient,
        key: &'a str,
    ) -> CompareFuture<'a> {
        Box::pin(async move {
            self.first_difference(source, destination, key)
                .await
                .into_iter()
                .collect()
        })
    }
}
