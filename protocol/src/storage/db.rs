//! # SledStore - Persistent Key-Value Backend
//!
//! A [`KeyValueStore`] on top of sled's embedded key-value store. The CLI
//! uses it as its stand-in for browser `localStorage`, so an upload in one
//! invocation is still there when a later invocation buys and decrypts it.
//!
//! ## Tree Layout
//!
//! | Tree      | Key           | Value          |
//! |-----------|---------------|----------------|
//! | `entries` | UTF-8 key     | UTF-8 value    |
//!
//! One tree, because the data model is one flat string map. Key-vault
//! records and mock IPFS objects are told apart by key prefix
//! (see [`crate::config`]).
//!
//! No quota is enforced here. Disk is the limit.

use sled::{Db, Tree};
use std::path::Path;

use super::kv::{KeyValueStore, StorageError, StorageResult};

/// Persistent string store backed by sled.
///
/// sled handles are cheap to clone and safe to share across threads.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: Db,
    entries: Tree,
}

impl SledStore {
    /// Open or create a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a store that lives in a temporary location and is removed
    /// when dropped. For tests.
    pub fn open_temporary() -> StorageResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StorageResult<Self> {
        let entries = db.open_tree("entries")?;
        Ok(Self { db, entries })
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn decode(key: &str, bytes: &[u8]) -> StorageResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| StorageError::Corrupt {
        key: key.to_string(),
    })
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self.entries.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(decode(key, &bytes)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.insert(key.as_bytes(), value.as_bytes())?;
        self.flush()
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        let existed = self.entries.remove(key.as_bytes())?.is_some();
        self.flush()?;
        Ok(existed)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        self.entries
            .iter()
            .keys()
            .map(|k| {
                let k = k?;
                String::from_utf8(k.to_vec()).map_err(|_| StorageError::Corrupt {
                    key: String::from_utf8_lossy(&k).into_owned(),
                })
            })
            .collect()
    }
}
