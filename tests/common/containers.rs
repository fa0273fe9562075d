// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Testcontainers setup for Redis.
//!
//! Provides helpers to spin up Redis containers for integration tests.

use redis::AsyncCommands;
use testcontainers::{clients::Cli, core::WaitFor, Container, GenericImage};

/// Create a vanilla Redis container.
///
/// Uses official redis:7 image. Waits for "Ready to accept connections".
pub fn redis_container(docker: &Cli) -> Container<'_, GenericImage> {
    let image = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(6379)
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"));
    docker.run(image)
}

/// A throwaway Redis with helpers to seed data.
pub struct TestRedis<'a> {
    #[allow(dead_code)] // Kept alive for container lifetime
    container: Container<'a, GenericImage>,
    /// `127.0.0.1:<port>`, as passed on the command line.
    pub endpoint: String,
    pub url: String,
}

impl<'a> TestRedis<'a> {
    pub fn new(docker: &'a Cli) -> Self {
        let container = redis_container(docker);
        let port = container.get_host_port_ipv4(6379);
        let endpoint = format!("127.0.0.1:{}", port);
        Self {
            container,
            url: format!("redis://{}", endpoint),
            endpoint,
        }
    }

    async fn conn(&self) -> redis::RedisResult<redis::aio::MultiplexedConnection> {
        let client = redis::Client::open(self.url.as_str())?;
        client.get_multiplexed_async_connection().await
    }

    pub async fn set(&self, key: &str, value: &str) -> redis::RedisResult<()> {
        self.conn().await?.set(key, value).await
    }

    /// Write a scalar under a key that may not be valid UTF-8.
    pub async fn set_raw(&self, key: &[u8], value: &str) -> redis::RedisResult<()> {
        self.conn().await?.set(key, value).await
    }

    pub async fn hset(&self, key: &str, fields: &[(&str, &str)]) -> redis::RedisResult<()> {
        self.conn().await?.hset_multiple(key, fields).await
    }

    pub async fn rpush(&self, key: &str, values: &[&str]) -> redis::RedisResult<()> {
        self.conn().await?.rpush(key, values).await
    }

    /// Write `count` scalar keys `prefix:0 .. prefix:count-1` in one pipeline.
    pub async fn fill(&self, prefix: &str, count: usize) -> redis::RedisResult<()> {
        let mut pipe = redis::pipe();
        for i in 0..count {
            pipe.set(format!("{}:{}", prefix, i), i).ignore();
        }
        pipe.query_async(&mut self.conn().await?).await
    }
}
