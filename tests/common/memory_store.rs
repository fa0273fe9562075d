// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory StoreClient for testing.
//!
//! Behaves like a single Redis node for the read commands the comparator
//! uses: cursor pagination where `COUNT` decides the page size, `MATCH`
//! applied after the page is cut, and `WRONGTYPE` errors on type misuse.
//! Failures can be injected per operation and per key, and every call is
//! counted for assertions.

use redis_compare::error::{CompareError, Result};
use redis_compare::store::{BoxFuture, KeyType, Page, StoreClient};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(Vec<u8>),
    FieldMap(Vec<(String, Vec<u8>)>),
    /// A type the comparator does not read (list, set, ...).
    Other(String),
}

/// Store operations that can be counted or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Scan,
    Get,
    HScan,
    HMGet,
    Type,
}

impl Op {
    fn command(&self) -> &'static str {
        match self {
            Op::Scan => "SCAN",
            Op::Get => "GET",
            Op::HScan => "HSCAN",
            Op::HMGet => "HMGET",
            Op::Type => "TYPE",
        }
    }
}

/// An injected failure. `key: None` fails every call of the operation.
#[derive(Debug, Clone)]
struct Failure {
    key: Option<String>,
    message: String,
}

/// Mock implementation of StoreClient backed by a sorted map.
///
/// # Example
/// ```rust,ignore
/// let store = MemoryStore::new("src")
///     .with_scalar("x", "5")
///     .with_field_map("h", &[("f1", "v1"), ("f2", "v2")]);
///
/// store.fail(Op::Get, "x", "i/o timeout");
///
/// // Use in tests...
///
/// assert_eq!(store.calls(Op::Get), 1);
/// ```
pub struct MemoryStore {
    name: String,
    data: Mutex<BTreeMap<Vec<u8>, Value>>,
    failures: Mutex<HashMap<Op, Vec<Failure>>>,
    /// SCAN fails once this many pages have been served.
    scan_fail_after: AtomicUsize,
    calls: Mutex<HashMap<Op, usize>>,
}

impl MemoryStore {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(HashMap::new()),
            scan_fail_after: AtomicUsize::new(usize::MAX),
            calls: Mutex::new(HashMap::new()),
        }
    }

    // =========================================================================
    // Data
    // =========================================================================

    pub fn with_scalar(self, key: &str, value: &str) -> Self {
        self.set_scalar(key, value);
        self
    }

    pub fn with_field_map(self, key: &str, fields: &[(&str, &str)]) -> Self {
        self.set_field_map(key, fields);
        self
    }

    pub fn with_other(self, key: &str, type_name: &str) -> Self {
        self.insert(key, Value::Other(type_name.to_string()));
        self
    }

    /// A scalar under a key that may not be valid UTF-8.
    pub fn with_raw_scalar(self, key: &[u8], value: &str) -> Self {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_vec(), Value::Scalar(value.as_bytes().to_vec()));
        self
    }

    pub fn set_scalar(&self, key: &str, value: &str) {
        self.insert(key, Value::Scalar(value.as_bytes().to_vec()));
    }

    pub fn set_field_map(&self, key: &str, fields: &[(&str, &str)]) {
        let fields = fields
            .iter()
            .map(|(f, v)| (f.to_string(), v.as_bytes().to_vec()))
            .collect();
        self.insert(key, Value::FieldMap(fields));
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.data.lock().unwrap().insert(key.as_bytes().to_vec(), value);
    }

    // =========================================================================
    // Failure Injection
    // =========================================================================

    /// Make `op` fail for `key`.
    pub fn fail(&self, op: Op, key: &str, message: &str) {
        self.push_failure(op, Some(key.to_string()), message);
    }

    /// Make every call of `op` fail.
    pub fn fail_all(&self, op: Op, message: &str) {
        self.push_failure(op, None, message);
    }

    /// Serve `pages` SCAN pages, then fail every SCAN.
    pub fn fail_scan_after(&self, pages: usize) {
        self.scan_fail_after.store(pages, Ordering::SeqCst);
    }

    fn push_failure(&self, op: Op, key: Option<String>, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push(Failure {
                key,
                message: message.to_string(),
            });
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    pub fn calls(&self, op: Op) -> usize {
        self.calls.lock().unwrap().get(&op).copied().unwrap_or(0)
    }

    fn enter(&self, op: Op, key: Option<&str>) -> Result<()> {
        let served = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(op).or_insert(0);
            *count += 1;
            *count - 1
        };

        if op == Op::Scan && served >= self.scan_fail_after.load(Ordering::SeqCst) {
            return Err(CompareError::redis_msg("SCAN", "connection reset by peer"));
        }

        let failures = self.failures.lock().unwrap();
        let injected = failures.get(&op).and_then(|list| {
            list.iter()
                .find(|f| f.key.is_none() || f.key.as_deref() == key)
        });
        match injected {
            Some(failure) => Err(CompareError::redis_msg(op.command(), failure.message.clone())),
            None => Ok(()),
        }
    }

    fn wrong_type(op: Op) -> CompareError {
        CompareError::redis_msg(
            op.command(),
            "WRONGTYPE Operation against a key holding the wrong kind of value",
        )
    }
}

fn page_of<T: Clone>(items: &[T], cursor: u64, size: usize) -> (u64, Vec<T>) {
    let start = (cursor as usize).min(items.len());
    let end = start.saturating_add(size.max(1)).min(items.len());
    let next = if end >= items.len() { 0 } else { end as u64 };
    (next, items[start..end].to_vec())
}

/// Redis-style glob: `*` and `?` only.
pub fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match (pattern.first(), text.first()) {
        (None, None) => true,
        (Some(b'*'), _) => {
            glob_match(&pattern[1..], text) || (!text.is_empty() && glob_match(pattern, &text[1..]))
        }
        (Some(b'?'), Some(_)) => glob_match(&pattern[1..], &text[1..]),
        (Some(p), Some(t)) if p == t => glob_match(&pattern[1..], &text[1..]),
        _ => false,
    }
}

impl StoreClient for MemoryStore {
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
            self.enter(Op::Scan, None)?;
            let data = self.data.lock().unwrap();
            let start = cursor as usize;
            let size = count.max(1);
            let keys: Vec<Vec<u8>> = data
                .keys()
                .skip(start)
                .take(size)
                .filter(|k| pattern.map_or(true, |p| glob_match(p.as_bytes(), k)))
                .cloned()
                .collect();
            let end = start + size;
            let next = if end >= data.len() { 0 } else { end as u64 };
            Ok(Page::from_raw(next, keys))
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            self.enter(Op::Get, Some(key))?;
            match self.data.lock().unwrap().get(key.as_bytes()) {
                Some(Value::Scalar(v)) => Ok(Some(v.clone())),
                Some(_) => Err(Self::wrong_type(Op::Get)),
                None => Ok(None),
            }
        })
    }

    fn scan_fields<'a>(
        &'a self,
        key: &'a str,
        cursor: u64,
        _pattern: Option<&'a str>,
        count: usize,
    ) -> BoxFuture<'a, Page> {
        Box::pin(async move {
            self.enter(Op::HScan, Some(key))?;
            let names: Vec<String> = match self.data.lock().unwrap().get(key.as_bytes()) {
                Some(Value::FieldMap(fields)) => fields.iter().map(|(f, _)| f.clone()).collect(),
                Some(_) => return Err(Self::wrong_type(Op::HScan)),
                None => Vec::new(),
            };
            let (next, page) = page_of(&names, cursor, count);
            Ok(Page::new(next, page))
        })
    }

    fn get_fields<'a>(
        &'a self,
        key: &'a str,
        fields: &'a [String],
    ) -> BoxFuture<'a, Vec<Option<Vec<u8>>>> {
        Box::pin(async move {
            self.enter(Op::HMGet, Some(key))?;
            match self.data.lock().unwrap().get(key.as_bytes()) {
                Some(Value::FieldMap(stored)) => Ok(fields
                    .iter()
                    .map(|name| {
                        stored
                            .iter()
                            .find(|(f, _)| f == name)
                            .map(|(_, v)| v.clone())
                    })
                    .collect()),
                Some(_) => Err(Self::wrong_type(Op::HMGet)),
                None => Ok(vec![None; fields.len()]),
            }
        })
    }

    fn key_type<'a>(&'a self, key: &'a str) -> BoxFuture<'a, KeyType> {
        Box::pin(async move {
            self.enter(Op::Type, Some(key))?;
            let name = match self.data.lock().unwrap().get(key.as_bytes()) {
                Some(Value::Scalar(_)) => "string".to_string(),
                Some(Value::FieldMap(_)) => "hash".to_string(),
                Some(Value::Other(name)) => name.clone(),
                None => "none".to_string(),
            };
            Ok(KeyType::from_type_name(&name))
        })
    }
}
