//! # Redis Compare
//!
//! Verifies that a destination Redis deployment holds the same data as a
//! source deployment, for example after a migration or while a replica
//! catches up.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                              redis-compare                               │
//! │                                                                          │
//! │  ┌──────────────┐    ┌────────────────┐    ┌──────────────────────────┐  │
//! │  │ Scanner      │───►│ Dispatch queue │───►│ Worker pool              │  │
//! │  │ (per source  │    │ (bounded)      │    │ TYPE → ComparatorTable   │  │
//! │  │  node, SCAN) │    └────────────────┘    │ GET / HSCAN + HMGET      │  │
//! │  └──────────────┘                          └──────────────────────────┘  │
//! │         │ node failures                                 │ mismatches     │
//! │         ▼                                               ▼                │
//! │  ┌────────────────────────────────────────────────────────────────────┐  │
//! │  │ ErrorSink: one line per report, counts by kind → Verdict           │  │
//! │  └────────────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The comparison is one-directional: keys present only on the destination
//! are not found. Run again with the sides reversed to catch them.
//!
//! Both stores may be written to during a run; a key that changes between
//! reads shows up as a report. The tool never writes to either store.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use redis_compare::{CompareConfig, CompareEngine};
//!
//! #[tokio::main]
//! async fn main() -> redis_compare::Result<()> {
//!     let config = CompareConfig::for_testing("127.0.0.1:6379", "127.0.0.1:6380");
//!
//!     let engine = CompareEngine::connect(config).await?;
//!     let (verdict, _stdout) = engine.run(std::io::stdout()).await?;
//!
//!     eprintln!("Error={}", verdict.errors());
//!     std::process::exit(verdict.exit_code() as i32);
//! }
//! ```

pub mod client;
pub mod compare;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod report;
pub mod resilience;
pub mod scanner;
pub mod sink;
pub mod store;
pub mod worker;

// Re-exports for convenience
pub use client::{RedisStore, Topology};
pub use compare::{Comparator, ComparatorTable, FieldMapComparator, ScalarComparator};
pub use config::{CompareConfig, ConnectionConfig, EndpointsConfig, ScanConfig, WorkerConfig};
pub use coordinator::{CompareEngine, Verdict, EXIT_FAILURE, EXIT_MATCH, EXIT_MISMATCH};
pub use error::{CompareError, Result};
pub use report::{Mismatch, MismatchKind, Operation, Side, Subject};
pub use scanner::ScanNode;
pub use sink::{ErrorSink, SinkSummary};
pub use store::{KeyType, Page, StoreClient};
