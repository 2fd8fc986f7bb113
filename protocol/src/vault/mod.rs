//! # Key Vault
//!
//! In this demo the "vault" is nothing more than a JSON array of
//! [`KeyRecord`]s kept under one fixed key of the shared store. The vault
//! holds keys, never files: sealed payloads live in [`crate::ipfs`].
//!
//! ## Semantics worth knowing
//!
//! 1. **Saves append.** There is no uniqueness check on `content_id`; saving
//!    the same key twice leaves two records.
//! 2. **Lookups return the most recent match.** With duplicates present,
//!    [`KeyVault::find`] picks the last record saved for that identifier.
//! 3. **Read-modify-write is not isolated.** Two concurrent saves against the
//!    same store can interleave and one of them can be lost.
//! 4. **Keys are stored in the clear.** A production design would wrap them
//!    (envelope encryption) or release them only through a policy service.

pub mod record;

use thiserror::Error;
use tracing::debug;

use crate::config::KEY_VAULT_STORAGE_KEY;
use crate::ipfs::ContentId;
use crate::storage::{SharedStore, StorageError};

pub use record::{KeyRecord, VaultMode};

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("key vault contents are corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// The store-backed list of saved keys.
#[derive(Clone)]
pub struct KeyVault {
    store: SharedStore,
}

impl KeyVault {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// All records, oldest first.
    pub fn records(&self) -> Result<Vec<KeyRecord>, VaultError> {
        match self.store.get(KEY_VAULT_STORAGE_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Append a record. Returns the number of records after the save.
    pub fn save(&self, record: KeyRecord) -> Result<usize, VaultError> {
        let mut records = self.records()?;
        debug!(cid = %record.content_id, mode = %record.mode, "saving key record");
        records.push(record);
        let json = serde_json::to_string(&records)?;
        self.store.set(KEY_VAULT_STORAGE_KEY, &json)?;
        Ok(records.len())
    }

    /// Most recently saved record for `cid`.
    pub fn find(&self, cid: &ContentId) -> Result<Option<KeyRecord>, VaultError> {
        Ok(self
            .records()?
            .into_iter()
            .rev()
            .find(|r| &r.content_id == cid))
    }

    /// Every record saved for `cid`, oldest first.
    pub fn find_all(&self, cid: &ContentId) -> Result<Vec<KeyRecord>, VaultError> {
        Ok(self
            .records()?
            .into_iter()
            .filter(|r| &r.content_id == cid)
            .collect())
    }
}
