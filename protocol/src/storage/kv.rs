//! # Key-Value Store Abstraction
//!
//! The browser demo used `localStorage` as its only persistence: an opaque
//! string-to-string map with no transactions and a per-origin quota. The
//! [`KeyValueStore`] trait reproduces exactly that surface, with one
//! difference: every call returns a [`StorageResult`] instead of throwing.
//!
//! Two backends ship with the crate:
//!
//! - [`MemoryStore`] - a `BTreeMap` behind a `parking_lot::RwLock`, with an
//!   optional byte quota. Used by tests and the in-process demo.
//! - [`super::db::SledStore`] - persistent, used by the CLI so an upload and a
//!   later purchase can happen in separate invocations.
//!
//! Individual calls are atomic. Sequences of calls are not: a caller that
//! reads, modifies and writes back a value can race another caller doing the
//! same, and the later write wins.

use std::collections::BTreeMap;

use parking_lot::RwLock;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur in a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("storage quota exceeded: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("stored value under {key:?} is not valid UTF-8")]
    Corrupt { key: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A string key-value store with `localStorage` semantics.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Returns whether it was present.
    fn remove(&self, key: &str) -> StorageResult<bool>;

    /// All keys currently present, in lexicographic order.
    fn keys(&self) -> StorageResult<Vec<String>>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryInner {
    entries: BTreeMap<String, String>,
    used_bytes: usize,
}

/// In-memory store with an optional byte quota.
///
/// Usage is counted as `key.len() + value.len()` per entry.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes pushing usage past `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            inner: RwLock::new(MemoryInner::default()),
            quota: Some(quota),
        }
    }

    /// Bytes currently in use.
    pub fn used_bytes(&self) -> usize {
        self.inner.read().used_bytes
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.inner.read().entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut inner = self.inner.write();

        let previous = inner
            .entries
            .get(key)
            .map(|old| key.len() + old.len())
            .unwrap_or(0);
        let needed = inner.used_bytes - previous + key.len() + value.len();

        if let Some(quota) = self.quota {
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        inner.entries.insert(key.to_string(), value.to_string());
        inner.used_bytes = needed;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        let mut inner = self.inner.write();
        match inner.entries.remove(key) {
            Some(old) => {
                inner.used_bytes -= key.len() + old.len();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.inner.read().entries.keys().cloned().collect())
    }
}
