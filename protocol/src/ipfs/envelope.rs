//! # Storage Object Envelope
//!
//! What actually lands in the mock IPFS store: a JSON object
//! `{"iv": .., "ct": .., "name": ..}` with base64 fields, itself
//! base64-encoded into one opaque string.
//!
//! There is no version field and no forward-compatibility promise. The
//! format is private to this crate.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::SealedPayload;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("envelope is not valid base64")]
    Base64(#[from] base64::DecodeError),

    #[error("envelope JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A sealed file as stored in mock IPFS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObject {
    /// Base64 nonce.
    pub iv: String,
    /// Base64 `ciphertext || tag`.
    pub ct: String,
    /// Original file name, in the clear.
    pub name: String,
}

impl StorageObject {
    pub fn from_sealed(sealed: &SealedPayload, file_name: impl Into<String>) -> Self {
        Self {
            iv: STANDARD.encode(sealed.nonce),
            ct: STANDARD.encode(&sealed.ciphertext),
            name: file_name.into(),
        }
    }

    pub fn nonce_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(STANDARD.decode(&self.iv)?)
    }

    pub fn ciphertext_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(STANDARD.decode(&self.ct)?)
    }

    /// Encode to the single string written to storage.
    pub fn encode(&self) -> Result<String, EnvelopeError> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json))
    }

    /// Inverse of [`StorageObject::encode`].
    pub fn decode(encoded: &str) -> Result<Self, EnvelopeError> {
        let json = STANDARD.decode(encoded.trim())?;
        Ok(serde_json::from_slice(&json)?)
    }
}
