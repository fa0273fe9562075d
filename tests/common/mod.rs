//! Shared test utilities for engine, integration and chaos tests.
//!
//! This module provides:
//! - In-memory StoreClient with failure injection
//! - Redis testcontainer setup
//! - Engine run helpers

#![allow(dead_code)]

pub mod containers;
pub mod memory_store;

pub use containers::*;
pub use memory_store::*;

use redis_compare::{CompareConfig, CompareEngine, ScanNode, StoreClient, Verdict};
use std::sync::Arc;

/// Config for in-memory runs (endpoints are names only).
pub fn test_config() -> CompareConfig {
    CompareConfig::for_testing("src", "dst")
}

/// Engine comparing `src` to `dst`, scanning `src` as a single node.
pub fn engine(src: &Arc<MemoryStore>, dst: &Arc<MemoryStore>, config: CompareConfig) -> CompareEngine {
    let source: Arc<dyn StoreClient> = src.clone();
    let nodes = vec![ScanNode::connected(0, Arc::clone(&source))];
    CompareEngine::new(config, source, dst.clone(), nodes)
}

/// Engine whose source spans several scan nodes.
pub fn cluster_engine(
    src: &Arc<MemoryStore>,
    nodes: &[Arc<MemoryStore>],
    dst: &Arc<MemoryStore>,
    config: CompareConfig,
) -> CompareEngine {
    let nodes = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| ScanNode::connected(i, node.clone()))
        .collect();
    CompareEngine::new(config, src.clone(), dst.clone(), nodes)
}

/// Run to completion, returning the verdict and report lines in sorted order.
pub async fn run(engine: CompareEngine) -> (Verdict, Vec<String>) {
    let (verdict, out) = engine.run(Vec::new()).await.expect("engine run");
    let mut lines: Vec<String> = String::from_utf8(out)
        .expect("utf-8 output")
        .lines()
        .map(str::to_string)
        .collect();
    lines.sort();
    (verdict, lines)
}
