//! Sequencer stages, errors and events.

use serde::Serialize;
use thiserror::Error;

use crate::crypto::EncryptionError;
use crate::ipfs::{ContentId, IpfsError};
use crate::license::LicenseError;
use crate::vault::VaultError;

/// Where the demo currently is.
///
/// The happy path runs strictly forward. Any failure drops back to
/// [`DemoStage::Idle`] with a status message; starting over simply
/// overwrites whatever came before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "cid", rename_all = "snake_case")]
pub enum DemoStage {
    Idle,
    FileSelected,
    Encrypting,
    Uploading,
    Uploaded(ContentId),
    KeySaved,
    LicenseChecking,
    LicenseGranted,
    Decrypting,
    Delivered,
}

impl DemoStage {
    pub fn name(&self) -> &'static str {
        match self {
            DemoStage::Idle => "idle",
            DemoStage::FileSelected => "file_selected",
            DemoStage::Encrypting => "encrypting",
            DemoStage::Uploading => "uploading",
            DemoStage::Uploaded(_) => "uploaded",
            DemoStage::KeySaved => "key_saved",
            DemoStage::LicenseChecking => "license_checking",
            DemoStage::LicenseGranted => "license_granted",
            DemoStage::Decrypting => "decrypting",
            DemoStage::Delivered => "delivered",
        }
    }
}

impl std::fmt::Display for DemoStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DemoStage::Uploaded(cid) => write!(f, "uploaded({cid})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Published on every stage transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DemoEvent {
    StageChanged { stage: DemoStage, status: String },
}

/// Everything that can end a demo operation early.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("please select a file first")]
    NoFileSelected,

    #[error("nothing has been uploaded in this session")]
    NothingUploaded,

    #[error("access denied: no key found for {0}")]
    AccessDenied(ContentId),

    #[error("access denied: {reason}")]
    LicenseDenied { reason: String },

    #[error("payload not found for {0}")]
    PayloadNotFound(ContentId),

    #[error("decryption failed: wrong key or condition not met")]
    DecryptionFailed,

    #[error("encryption failed: {0}")]
    Encryption(EncryptionError),

    #[error("stored key is unusable: {0}")]
    InvalidKey(EncryptionError),

    #[error("mock ipfs error: {0}")]
    Ipfs(#[from] IpfsError),

    #[error("key vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("license check failed: {0}")]
    License(#[from] LicenseError),

    #[error("download failed: {0}")]
    Delivery(#[from] std::io::Error),
}

impl DemoError {
    /// Short, user-facing status line.
    pub fn status_message(&self) -> String {
        match self {
            DemoError::NoFileSelected => "Please select a file first.".to_string(),
            DemoError::NothingUploaded => "Encrypt & upload a file first.".to_string(),
            DemoError::AccessDenied(_) | DemoError::LicenseDenied { .. } => {
                "Access denied: key not found or license invalid.".to_string()
            }
            DemoError::PayloadNotFound(_) => "Payload not found.".to_string(),
            DemoError::DecryptionFailed => {
                "Decryption failed: wrong key or condition not met.".to_string()
            }
            other => format!("Error: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(DemoStage::Idle.to_string(), "idle");
        assert_eq!(
            DemoStage::Uploaded(ContentId::new("bafyq")).to_string(),
            "uploaded(bafyq)"
        );
    }

    #[test]
    fn test_stage_serializes_with_cid() {
        let json = serde_json::to_value(DemoStage::Uploaded(ContentId::new("bafyq"))).unwrap();
        assert_eq!(json["stage"], "uploaded");
        assert_eq!(json["cid"], "bafyq");
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(
            DemoError::NoFileSelected.status_message(),
            "Please select a file first."
        );
        assert!(DemoError::AccessDenied(ContentId::new("x"))
            .status_message()
            .starts_with("Access denied"));
        assert_eq!(
            DemoError::DecryptionFailed.status_message(),
            "Decryption failed: wrong key or condition not met."
        );
        assert_eq!(
            DemoError::PayloadNotFound(ContentId::new("x")).status_message(),
            "Payload not found."
        );
    }
}
