// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Scalar (`string`) comparison.

use super::{CompareFuture, Comparator};
use crate::report::{display_value, Mismatch, Operation, Side};
use crate::store::StoreClient;

/// Compares `GET` results byte for byte.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarComparator;

impl Comparator for ScalarComparator {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn compare<'a>(
        &'a self,
        source: &'a dyn StoreClient,
        destination: &'a dyn StoreClient,
        key: &'a str,
    ) -> CompareFuture<'a> {
        Box::pin(async move {
            let src_value = match source.get(key).await {
                Ok(Some(value)) => value,
                // Deleted or expired between TYPE and GET.
                Ok(None) => {
                    return vec![Mismatch::inconclusive(
                        Operation::Get,
                        Side::Src,
                        key,
                        "key not found",
                    )]
                }
                Err(e) => return vec![Mismatch::failed(Operation::Get, Side::Src, key, &e)],
            };

            let dst_value = match destination.get(key).await {
                Ok(Some(value)) => value,
                Ok(None) => {
                    return vec![Mismatch::content(Operation::Get, key, "key not found")]
                }
                Err(e) => return vec![Mismatch::failed(Operation::Get, Side::Dst, key, &e)],
            };

            if src_value != dst_value {
                return vec![Mismatch::content(
                    Operation::Get,
                    key,
                    format!(
                        "src(v={}) != dst(v={})",
                        display_value(&src_value),
                        display_value(&dst_value)
                    ),
                )];
            }

            Vec::new()
        })
    }
}
