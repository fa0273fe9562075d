// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Store client capability.
//!
//! Defines the handful of read-only operations the scanners and comparators
//! need from a key-value store. [`RedisStore`](crate::client::RedisStore) is the
//! production implementation; tests plug in an in-memory store.
//!
//! # Example
//!
//! ```rust,no_run
//! use redis_compare::store::{BoxFuture, KeyType, Page, StoreClient};
//!
//! struct Empty;
//!
//! impl StoreClient for Empty {
//!     fn name(&self) -> &str {
//!         "empty"
//!     }
//!
//!     fn scan_keys<'a>(&'a self, _cursor: u64, _pattern: Option<&'a str>, _count: usize) -> BoxFuture<'a, Page> {
//!         Box::pin(async move { Ok(Page::last(Vec::new())) })
//!     }
//!
//!     fn get<'a>(&'a self, _key: &'a str) -> BoxFuture<'a, Option<Vec<u8>>> {
//!         Box::pin(async move { Ok(None) })
//!     }
//!
//!     fn scan_fields<'a>(&'a self, _key: &'a str, _cursor: u64, _pattern: Option<&'a str>, _count: usize) -> BoxFuture<'a, Page> {
//!         Box::pin(async move { Ok(Page::last(Vec::new())) })
//!     }
//!
//!     fn get_fields<'a>(&'a self, _key: &'a str, fields: &'a [String]) -> BoxFuture<'a, Vec<Option<Vec<u8>>>> {
//!         Box::pin(async move { Ok(vec![None; fields.len()]) })
//!     }
//!
//!     fn key_type<'a>(&'a self, _key: &'a str) -> BoxFuture<'a, KeyType> {
//!         Box::pin(async move { Ok(KeyType::Missing) })
//!     }
//! }
//! ```

use crate::error::Result;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Type alias for boxed async futures (reduces trait signature complexity).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// One page of a cursor-based listing (`SCAN` / `HSCAN`).
///
/// A `cursor` of 0 means the listing is exhausted. A cursor belongs to the
/// endpoint and call that produced it and must not be reused elsewhere.
///
/// Redis names are arbitrary bytes. Names that are not valid UTF-8 cannot be
/// addressed through this interface and are set aside in `undecodable`
/// rather than failing the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub cursor: u64,
    pub items: Vec<String>,
    pub undecodable: Vec<Vec<u8>>,
}

impl Page {
    pub fn new(cursor: u64, items: Vec<String>) -> Self {
        Self {
            cursor,
            items,
            undecodable: Vec::new(),
        }
    }

    /// A final page (cursor 0).
    pub fn last(items: Vec<String>) -> Self {
        Self::new(0, items)
    }

    /// Build a page from raw names, splitting off those that are not UTF-8.
    pub fn from_raw(cursor: u64, raw: Vec<Vec<u8>>) -> Self {
        let mut page = Self::new(cursor, Vec::with_capacity(raw.len()));
        for name in raw {
            match String::from_utf8(name) {
                Ok(name) => page.items.push(name),
                Err(e) => page.undecodable.push(e.into_bytes()),
            }
        }
        page
    }

    pub fn is_last(&self) -> bool {
        self.cursor == 0
    }
}

/// Type of a key, as reported by `TYPE` on the source store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// A single opaque value (`string`).
    Scalar,
    /// A mapping of field names to values (`hash`).
    FieldMap,
    /// The key no longer exists (`none`).
    Missing,
    /// Any other Redis type (list, set, zset, stream, module types).
    Other(String),
}

impl KeyType {
    /// Parse a `TYPE` reply.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "string" => KeyType::Scalar,
            "hash" => KeyType::FieldMap,
            "none" => KeyType::Missing,
            other => KeyType::Other(other.to_string()),
        }
    }

    /// The Redis name of this type.
    pub fn as_str(&self) -> &str {
        match self {
            KeyType::Scalar => "string",
            KeyType::FieldMap => "hash",
            KeyType::Missing => "none",
            KeyType::Other(name) => name,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only operations required of a backing store.
///
/// Implementations must be safe to share between every scanner and worker
/// at once; the production client multiplexes commands over pooled
/// connections so no external locking is needed.
pub trait StoreClient: Send + Sync + 'static {
    /// Human-readable identity for logs (endpoint list).
    fn name(&self) -> &str;

    /// One page of the keyspace (`SCAN cursor [MATCH pattern] COUNT count`).
    fn scan_keys<'a>(
        &'a self,
        cursor: u64,
        pattern: Option<&'a str>,
        count: usize,
    ) -> BoxFuture<'a, Page>;

    /// A scalar value (`GET`). `None` when the key does not exist.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<Vec<u8>>>;

    /// One page of field names of a field-map (`HSCAN key cursor [MATCH pattern] COUNT count`).
    fn scan_fields<'a>(
        &'a self,
        key: &'a str,
        cursor: u64,
        pattern: Option<&'a str>,
        count: usize,
    ) -> BoxFuture<'a, Page>;

    /// Values for `fields`, in the same order (`HMGET`). Absent fields are `None`.
    fn get_fields<'a>(
        &'a self,
        key: &'a str,
        fields: &'a [String],
    ) -> BoxFuture<'a, Vec<Option<Vec<u8>>>>;

    /// The type of `key` (`TYPE`).
    fn key_type<'a>(&'a self, key: &'a str) -> BoxFuture<'a, KeyType>;
}
