// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types for the comparison engine.
//!
//! Errors here describe failures of the *tooling*: a Redis call that failed,
//! a store that could not be reached, a configuration that makes no sense.
//! Differences between the two stores are not errors; they are
//! [`Mismatch`](crate::report::Mismatch) reports.
//!
//! # Error Categories
//!
//! | Error Type | Retryable | Description |
//! |------------|-----------|-------------|
//! | `Redis` | Mostly | Network errors, timeouts, command failures; not auth or client config |
//! | `Connection` | Yes | Endpoint unreachable while connecting |
//! | `UnexpectedReply` | No | Reply did not have the expected shape |
//! | `Config` | No | Configuration invalid |
//! | `Internal` | No | Unexpected internal error |
//!
//! Comparators and workers never propagate these upwards: they are turned
//! into reports at the point of failure. Only connection setup in the binary
//! escalates them to a process exit.

use thiserror::Error;

/// Result type alias for comparison operations.
pub type Result<T> = std::result::Result<T, CompareError>;

/// Errors that can occur while talking to the stores or setting up a run.
#[derive(Error, Debug)]
pub enum CompareError {
    /// Redis command error.
    ///
    /// Timeouts, dropped connections, `MOVED` storms and server-side errors
    /// all land here. Retryable.
    #[error("Redis error ({operation}): {message}")]
    Redis {
        operation: String,
        message: String,
        #[source]
        source: Option<redis::RedisError>,
    },

    /// Could not establish a connection to an endpoint.
    #[error("Connection error ({endpoint}): {message}")]
    Connection { endpoint: String, message: String },

    /// A reply arrived but could not be interpreted.
    #[error("Unexpected reply ({operation}): {message}")]
    UnexpectedReply { operation: String, message: String },

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompareError {
    /// Create a Redis error from a redis::RedisError
    pub fn redis(operation: impl Into<String>, source: redis::RedisError) -> Self {
        Self::Redis {
            operation: operation.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a Redis error without source
    pub fn redis_msg(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Redis {
            operation: operation.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Redis {
                source: Some(source),
                ..
            } => !matches!(
                source.kind(),
                redis::ErrorKind::AuthenticationFailed | redis::ErrorKind::InvalidClientConfig
            ),
            Self::Redis { .. } => true,
            Self::Connection { .. } => true,
            Self::UnexpectedReply { .. } => false,
            Self::Config(_) => false,
            Self::Internal(_) => false,
        }
    }

    /// Short, single-line description used in report lines.
    ///
    /// Report lines already carry the operation name, so the Redis variant
    /// only contributes its message.
    pub fn detail(&self) -> String {
        match self {
            Self::Redis { message, .. } => message.clone(),
            Self::UnexpectedReply { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<redis::RedisError> for CompareError {
    fn from(e: redis::RedisError) -> Self {
        Self::redis("unknown", e)
    }
}
