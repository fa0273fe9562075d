// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Redis store clients.
//!
//! [`RedisStore`] implements [`StoreClient`] over either a standalone Redis
//! or a Redis Cluster. The topology is picked once from the endpoint count:
//!
//! ```text
//! endpoints.len() == 1  →  Topology::Single   (pool of ConnectionManagers)
//! endpoints.len() >= 2  →  Topology::Cluster  (slot-aware ClusterConnection)
//! ```
//!
//! Both variants are multiplexed: cloning a handle is cheap and many
//! in-flight commands share a socket, so one `RedisStore` is shared by every
//! worker without locking. A standalone store opens `pool_size` managers and
//! round-robins commands across them to spread load over several sockets.
//!
//! `SCAN` is per node even in a cluster, so scanners always open their own
//! single-node store with [`RedisStore::connect_node`].

use crate::config::{endpoint_url, ConnectionConfig};
use crate::error::{CompareError, Result};
use crate::metrics;
use crate::resilience::{connect_with_retry, RetryConfig};
use crate::store::{BoxFuture, KeyType, Page, StoreClient};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::cluster::ClusterClientBuilder;
use redis::cluster_async::ClusterConnection;
use redis::{Client, Cmd, FromRedisValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Upper bound on multiplexed connections per standalone endpoint.
const MAX_POOLED_CONNECTIONS: usize = 32;

/// Deployment shape, chosen from the number of endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Exactly one endpoint: direct connection.
    Single,
    /// Two or more endpoints: cluster-aware routing.
    Cluster,
}

impl Topology {
    pub fn for_endpoints(endpoints: &[String]) -> Result<Self> {
        match endpoints.len() {
            0 => Err(CompareError::Config("no endpoints given".to_string())),
            1 => Ok(Topology::Single),
            _ => Ok(Topology::Cluster),
        }
    }
}

enum Backend {
    Single {
        pool: Vec<ConnectionManager>,
        next: AtomicUsize,
    },
    Cluster(ClusterConnection),
}

/// A connected Redis deployment.
pub struct RedisStore {
    name: String,
    topology: Topology,
    backend: Backend,
}

impl RedisStore {
    /// Connect to a deployment, choosing the topology from the endpoint count.
    pub async fn connect(
        endpoints: &[String],
        connection: &ConnectionConfig,
        retry: &RetryConfig,
    ) -> Result<Self> {
        match Topology::for_endpoints(endpoints)? {
            Topology::Single => {
                Self::connect_single(&endpoints[0], connection.pool_size, connection, retry).await
            }
            Topology::Cluster => Self::connect_cluster(endpoints, connection, retry).await,
        }
    }

    /// Connect directly to one node, bypassing cluster routing.
    ///
    /// Used by scanners, which only ever issue sequential `SCAN`s.
    pub async fn connect_node(
        endpoint: &str,
        connection: &ConnectionConfig,
        retry: &RetryConfig,
    ) -> Result<Self> {
        Self::connect_single(endpoint, 1, connection, retry).await
    }

    async fn connect_single(
        endpoint: &str,
        pool_size: usize,
        connection: &ConnectionConfig,
        retry: &RetryConfig,
    ) -> Result<Self> {
        let url = endpoint_url(endpoint);
        let client = Client::open(url.as_str()).map_err(|e| CompareError::Connection {
            endpoint: url.clone(),
            message: format!("Invalid Redis URL: {}", e),
        })?;

        let manager_config = ConnectionManagerConfig::new()
            .set_response_timeout(connection.read_timeout())
            .set_connection_timeout(connection.connect_timeout());

        let pool_size = pool_size.clamp(1, MAX_POOLED_CONNECTIONS);
        let mut pool = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let conn = connect_with_retry(&url, retry, || {
                client.get_connection_manager_with_config(manager_config.clone())
            })
            .await?;
            pool.push(conn);
        }

        debug!(endpoint = %url, pool_size, "Connected to standalone Redis");

        Ok(Self {
            name: url,
            topology: Topology::Single,
            backend: Backend::Single {
                pool,
                next: AtomicUsize::new(0),
            },
        })
    }

    async fn connect_cluster(
        endpoints: &[String],
        connection: &ConnectionConfig,
        retry: &RetryConfig,
    ) -> Result<Self> {
        let urls: Vec<String> = endpoints.iter().map(|e| endpoint_url(e)).collect();
        let name = urls.join(",");

        let client = ClusterClientBuilder::new(urls.clone())
            .connection_timeout(connection.connect_timeout())
            .response_timeout(connection.read_timeout())
            .build()
            .map_err(|e| CompareError::Connection {
                endpoint: name.clone(),
                message: format!("Invalid cluster configuration: {}", e),
            })?;

        let conn = connect_with_retry(&name, retry, || client.get_async_connection()).await?;

        info!(nodes = urls.len(), "Connected to Redis Cluster");

        Ok(Self {
            name,
            topology: Topology::Cluster,
            backend: Backend::Cluster(conn),
        })
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Round-trip check, returns latency.
    pub async fn ping(&self) -> Result<Duration> {
        let start = Instant::now();
        let reply: String = self.query("PING", redis::cmd("PING")).await?;
        if reply != "PONG" {
            return Err(CompareError::UnexpectedReply {
                operation: "PING".to_string(),
                message: format!("Unexpected PING response: {}", reply),
            });
        }
        Ok(start.elapsed())
    }

    async fn query<T: FromRedisValue>(&self, operation: &'static str, cmd: Cmd) -> Result<T> {
        let start = Instant::now();
        let result = match &self.backend {
            Backend::Single { pool, next } => {
                let index = next.fetch_add(1, Ordering::Relaxed) % pool.len();
                let mut conn = pool[index].clone();
                cmd.query_async(&mut conn).await
            }
            Backend::Cluster(conn) => {
                let mut conn = conn.clone();
                cmd.query_async(&mut conn).await
            }
        };
        metrics::record_store_operation_latency(&self.name, operation, start.elapsed());
        result.map_err(|e| CompareError::redis(operation, e))
    }
}

/// Keep the field names of a flat `HSCAN` reply (`[field, value, field, value, ...]`).
fn field_names(flat: Vec<Vec<u8>>) -> Result<Vec<String>> {
    flat.into_iter()
        .step_by(2)
        .map(|raw| {
            String::from_utf8(raw).map_err(|e| CompareError::UnexpectedReply {
                operation: "HSCAN".to_string(),
                message: format!("field name is not valid UTF-8: {}", e),
            })
        })
        .collect()
}

impl StoreClient for RedisStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan_keys<'a>(
        &'a self,
        cursor: u64,
        pattern: Option<&'a str>,
        count: usize,
    ) -> BoxFuture<'a, Page> {
        Box::pin(async move {
            let mut cmd = redis::cmd("SCAN");
            cmd.arg(cursor);
            if let Some(pattern) = pattern {
                cmd.arg("MATCH").arg(pattern);
            }
            cmd.arg("COUNT").arg(count);

            let (next, keys): (u64, Vec<Vec<u8>>) = self.query("SCAN", cmd).await?;
            Ok(Page::from_raw(next, keys))
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            let mut cmd = redis::cmd("GET");
            cmd.arg(key);
            self.query("GET", cmd).await
        })
    }

    fn scan_fields<'a>(
        &'a self,
        key: &'a str,
        cursor: u64,
        pattern: Option<&'a str>,
        count: usize,
    ) -> BoxFuture<'a, Page> {
        Box::pin(async move {
            let mut cmd = redis::cmd("HSCAN");
            cmd.arg(key).arg(cursor);
            if let Some(pattern) = pattern {
                cmd.arg("MATCH").arg(pattern);
            }
            cmd.arg("COUNT").arg(count);

            let (next, flat): (u64, Vec<Vec<u8>>) = self.query("HSCAN", cmd).await?;
            Ok(Page::new(next, field_names(flat)?))
        })
    }

    fn get_fields<'a>(
        &'a self,
        key: &'a str,
        fields: &'a [String],
    ) -> BoxFuture<'a, Vec<Option<Vec<u8>>>> {
        Box::pin(async move {
            // HMGET with no fields is a syntax error; an empty page has no values.
            if fields.is_empty() {
                return Ok(Vec::new());
            }
            let mut cmd = redis::cmd("HMGET");
            cmd.arg(key).arg(fields);
            self.query("HMGET", cmd).await
        })
    }

    fn key_type<'a>(&'a self, key: &'a str) -> BoxFuture<'a, KeyType> {
        Box::pin(async move {
            let mut cmd = redis::cmd("TYPE");
            cmd.arg(key);
            let name: String = self.query("TYPE", cmd).await?;
            Ok(KeyType::from_type_name(&name))
        })
    }
}
