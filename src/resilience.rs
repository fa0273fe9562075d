// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Retry logic for connection establishment.
//!
//! A comparison run is a one-shot job, so retries only cover the initial
//! connection to each store. Command failures during the run are reported
//! per key instead of retried, which keeps the mismatch count honest.

use crate::config::ConnectionConfig;
use crate::error::{CompareError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Configuration for connection retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of connection attempts.
    pub max_attempts: usize,

    /// Initial delay before first retry.
    pub initial_delay: Duration,

    /// Maximum delay between retries (ceiling for exponential backoff).
    pub max_delay: Duration,

    /// Backoff multiplier (e.g., 2.0 = double delay each retry).
    pub backoff_factor: f64,

    /// Timeout for each individual connection attempt.
    pub connection_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_factor: 2.0,
            connection_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Startup retry derived from the connection settings.
    ///
    /// # Backoff Schedule
    ///
    /// ```text
    /// Attempt  Delay
    /// -------  -----
    /// 1        200ms
    /// 2        400ms
    /// 3        800ms
    /// 4        1.6s
    /// 5        give up
    /// ```
    pub fn startup(connection: &ConnectionConfig) -> Self {
        Self {
            connection_timeout: connection.connect_timeout(),
            ..Self::default()
        }
    }

    /// Fast-fail retry for tests.
    pub fn testing() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            backoff_factor: 2.0,
            connection_timeout: Duration::from_millis(500),
        }
    }

    /// Calculate delay for a given attempt number (1-indexed).
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return self.initial_delay;
        }

        let multiplier = self.backoff_factor.powi((attempt - 1) as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        let delay = Duration::from_secs_f64(delay_secs);

        std::cmp::min(delay, self.max_delay)
    }
}

/// Run `connect` until it succeeds or `config.max_attempts` is exhausted.
///
/// Each attempt is bounded by `config.connection_timeout`. Errors that
/// cannot succeed on retry (see [`CompareError::is_retryable`]) end the loop
/// at once. The last error is returned as a [`CompareError::Connection`]
/// naming `endpoint`.
pub async fn connect_with_retry<T, F, Fut>(
    endpoint: &str,
    config: &RetryConfig,
    mut connect: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = redis::RedisResult<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        let (message, retryable) = match timeout(config.connection_timeout, connect()).await {
            Ok(Ok(conn)) => return Ok(conn),
            Ok(Err(e)) => {
                let err = CompareError::redis("CONNECT", e);
                (err.detail(), err.is_retryable())
            }
            Err(_) => (
                format!("timed out after {}ms", config.connection_timeout.as_millis()),
                true,
            ),
        };

        if !retryable {
            return Err(CompareError::Connection {
                endpoint: endpoint.to_string(),
                message,
            });
        }

        if attempt >= config.max_attempts {
            return Err(CompareError::Connection {
                endpoint: endpoint.to_string(),
                message: format!("failed after {} attempts: {}", attempt, message),
            });
        }

        let delay = config.delay_for_attempt(attempt);
        warn!(
            endpoint,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %message,
            "Connection attempt failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
