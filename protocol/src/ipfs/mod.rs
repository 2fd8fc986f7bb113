//! # Mock IPFS
//!
//! Stands in for a decentralized content store. Objects are written to the
//! shared key-value store under `mock-ipfs:<cid>` and are never deleted;
//! they live until the store itself is wiped.
//!
//! ```text
//! cid.rs       - ContentId and generate_pseudo_id()
//! envelope.rs  - StorageObject {iv, ct, name} and its base64 JSON encoding
//! ```

pub mod cid;
pub mod envelope;

use thiserror::Error;
use tracing::debug;

use crate::config::MOCK_IPFS_KEY_PREFIX;
use crate::storage::{SharedStore, StorageError};

pub use cid::{generate_pseudo_id, ContentId};
pub use envelope::{EnvelopeError, StorageObject};

#[derive(Debug, Error)]
pub enum IpfsError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),
}

/// The mock content network.
#[derive(Clone)]
pub struct MockIpfs {
    store: SharedStore,
}

impl MockIpfs {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Storage key for a given identifier.
    pub fn storage_key(cid: &ContentId) -> String {
        format!("{MOCK_IPFS_KEY_PREFIX}{cid}")
    }

    /// Pin an object under a freshly minted pseudo identifier.
    pub fn put(&self, object: &StorageObject) -> Result<ContentId, IpfsError> {
        let encoded = object.encode()?;

        let mut cid = generate_pseudo_id();
        while self.store.get(&Self::storage_key(&cid))?.is_some() {
            cid = generate_pseudo_id();
        }

        self.store.set(&Self::storage_key(&cid), &encoded)?;
        debug!(%cid, bytes = encoded.len(), "mock ipfs object pinned");
        Ok(cid)
    }

    /// Fetch the object stored under `cid`, if any.
    pub fn get(&self, cid: &ContentId) -> Result<Option<StorageObject>, IpfsError> {
        match self.store.get(&Self::storage_key(cid))? {
            Some(encoded) => Ok(Some(StorageObject::decode(&encoded)?)),
            None => Ok(None),
        }
    }

    /// Every identifier currently pinned.
    pub fn list(&self) -> Result<Vec<ContentId>, IpfsError> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(MOCK_IPFS_KEY_PREFIX).map(ContentId::new))
            .collect())
    }
}
