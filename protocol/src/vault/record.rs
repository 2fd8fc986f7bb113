//! # Key Records
//!
//! A [`KeyRecord`] is what "Save Key to Vault" writes: which upload a key
//! belongs to, the raw key itself, and which flow (plain vault or vault +
//! TEE) the owner picked.
//!
//! The JSON field names are camelCase (`contentId`, `keyMaterial`, ...) and
//! `savedAt` is epoch milliseconds, matching what the browser version kept
//! in `localStorage`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ipfs::ContentId;

/// Which access flow a piece of IP is published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultMode {
    /// Buyer needs a valid license.
    #[default]
    Vault,
    /// Buyer needs a valid license and a verified TEE attestation.
    Tee,
}

impl VaultMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VaultMode::Vault => "vault",
            VaultMode::Tee => "tee",
        }
    }

    /// Tab label on the flow selector.
    pub fn label(&self) -> &'static str {
        match self {
            VaultMode::Vault => "IP Vault",
            VaultMode::Tee => "IP Vault + TEE",
        }
    }
}

impl std::fmt::Display for VaultMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VaultMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vault" => Ok(VaultMode::Vault),
            "tee" => Ok(VaultMode::Tee),
            other => Err(format!("unknown mode {other:?}, expected \"vault\" or \"tee\"")),
        }
    }
}

/// One saved key.
///
/// `key_material` is the raw AES key in base64, stored unwrapped. Anyone who
/// can read the store can read the key; that is the demo's simplification,
/// not a property to rely on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRecord {
    pub content_id: ContentId,
    pub key_material: String,
    pub file_name: String,
    pub mode: VaultMode,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub saved_at: DateTime<Utc>,
}

impl KeyRecord {
    /// Build a record stamped with the current time.
    pub fn new(
        content_id: ContentId,
        key_material: impl Into<String>,
        file_name: impl Into<String>,
        mode: VaultMode,
    ) -> Self {
        Self {
            content_id,
            key_material: key_material.into(),
            file_name: file_name.into(),
            mode,
            saved_at: Utc::now(),
        }
    }
}
