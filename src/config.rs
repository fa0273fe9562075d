// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for a comparison run.
//!
//! This module defines all configuration types needed to run the comparison engine.
//! The binary builds a [`CompareConfig`] from command-line flags, but it can equally
//! be constructed programmatically or deserialized from YAML/JSON.
//!
//! # Quick Start
//!
//! ```rust
//! use redis_compare::config::{CompareConfig, EndpointsConfig};
//!
//! let config = CompareConfig {
//!     source: EndpointsConfig::new(["10.0.0.1:6379"]),
//!     destination: EndpointsConfig::new(["10.0.0.2:6379"]),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Configuration Structure
//!
//! ```text
//! CompareConfig
//! ├── source: EndpointsConfig       # One endpoint = standalone, 2+ = cluster
//! ├── destination: EndpointsConfig
//! ├── scan: ScanConfig              # SCAN pattern, page size, progress cadence
//! ├── workers: WorkerConfig         # Comparator pool size, dispatch queue capacity
//! └── connection: ConnectionConfig  # Timeouts and pool size for every store client
//! ```

use crate::error::{CompareError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// Top-level config
// ═══════════════════════════════════════════════════════════════════════════════

/// The top-level config object passed to [`CompareEngine`](crate::coordinator::CompareEngine).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompareConfig {
    /// The store whose keyspace is enumerated (the reference side).
    pub source: EndpointsConfig,

    /// The store being verified against the source.
    pub destination: EndpointsConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub workers: WorkerConfig,

    #[serde(default)]
    pub connection: ConnectionConfig,
}

impl CompareConfig {
    /// Create a minimal config for testing.
    pub fn for_testing(source: &str, destination: &str) -> Self {
        Self {
            source: EndpointsConfig::new([source]),
            destination: EndpointsConfig::new([destination]),
            scan: ScanConfig {
                fetch_count: 10,
                ..Default::default()
            },
            workers: WorkerConfig {
                parallel: 2,
                queue_capacity: None,
            },
            connection: ConnectionConfig::default(),
        }
    }

    /// Swap the source and destination roles.
    pub fn reversed(mut self) -> Self {
        std::mem::swap(&mut self.source, &mut self.destination);
        self
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.source.endpoints.is_empty() {
            return Err(CompareError::Config(
                "one or more source endpoints must be specified".to_string(),
            ));
        }
        if self.destination.endpoints.is_empty() {
            return Err(CompareError::Config(
                "one or more destination endpoints must be specified".to_string(),
            ));
        }
        if self.workers.parallel == 0 {
            return Err(CompareError::Config("parallel must be at least 1".to_string()));
        }
        if self.workers.queue_capacity == Some(0) {
            return Err(CompareError::Config(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        if self.scan.fetch_count == 0 {
            return Err(CompareError::Config("fetch count must be at least 1".to_string()));
        }
        if self.connection.pool_size == 0 {
            return Err(CompareError::Config("pool size must be at least 1".to_string()));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EndpointsConfig: one or more Redis nodes forming a deployment
// ═══════════════════════════════════════════════════════════════════════════════

/// The nodes of one deployment.
///
/// Entries may be bare `host:port` pairs or full `redis://` URLs.
/// For a cluster, list every master: the keyspace is scanned node by node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub endpoints: Vec<String>,
}

impl EndpointsConfig {
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
        }
    }

    /// True when more than one node is listed.
    pub fn is_cluster(&self) -> bool {
        self.endpoints.len() >= 2
    }
}

/// Normalise `host:port` to `redis://host:port`; URLs pass through untouched.
pub fn endpoint_url(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("redis://{}", endpoint)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ScanConfig: keyspace enumeration
// ═══════════════════════════════════════════════════════════════════════════════

/// Keyspace enumeration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// `MATCH` pattern for `SCAN`. `None` (or empty) scans everything.
    #[serde(default)]
    pub pattern: Option<String>,

    /// `COUNT` hint for both `SCAN` and `HSCAN`.
    #[serde(default = "default_fetch_count")]
    pub fetch_count: usize,

    /// Emit a progress line every this many keys per node.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_fetch_count() -> usize {
    10_000
}

fn default_progress_interval() -> u64 {
    100_000
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pattern: None,
            fetch_count: 10_000,
            progress_interval: 100_000,
        }
    }
}

impl ScanConfig {
    /// The pattern to send, if any. Empty patterns are treated as absent.
    pub fn match_pattern(&self) -> Option<&str> {
        self.pattern.as_deref().filter(|p| !p.is_empty())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WorkerConfig: comparator pool
// ═══════════════════════════════════════════════════════════════════════════════

/// Comparator pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent comparator workers.
    #[serde(default = "default_parallel")]
    pub parallel: usize,

    /// Capacity of the key dispatch queue. Defaults to `parallel`.
    ///
    /// Scanners block once this many keys are waiting, which bounds memory
    /// regardless of keyspace size.
    #[serde(default)]
    pub queue_capacity: Option<usize>,
}

fn default_parallel() -> usize {
    8
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            parallel: 8,
            queue_capacity: None,
        }
    }
}

impl WorkerConfig {
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.parallel).max(1)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ConnectionConfig: store client tuning
// ═══════════════════════════════════════════════════════════════════════════════

/// Settings applied to every store client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Per-command response timeout (seconds).
    #[serde(default = "default_read_timeout_sec")]
    pub read_timeout_sec: u64,

    /// Pooled connection idle timeout (seconds).
    ///
    /// Connections are multiplexed and held for the whole run, so this is
    /// informational only.
    #[serde(default = "default_idle_timeout_sec")]
    pub idle_timeout_sec: u64,

    /// Multiplexed connections per standalone endpoint.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Timeout for each connection attempt (seconds).
    #[serde(default = "default_connect_timeout_sec")]
    pub connect_timeout_sec: u64,
}

fn default_read_timeout_sec() -> u64 {
    5
}

fn default_idle_timeout_sec() -> u64 {
    100
}

fn default_pool_size() -> usize {
    30
}

fn default_connect_timeout_sec() -> u64 {
    10
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            read_timeout_sec: 5,
            idle_timeout_sec: 100,
            pool_size: 30,
            connect_timeout_sec: 10,
        }
    }
}

impl ConnectionConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_sec)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_sec)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
