//! The fixed step catalogue narrated by the walkthrough.

use serde::Serialize;

use crate::vault::VaultMode;

/// One narrated step. Immutable once the catalogue is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub index: usize,
    pub title: String,
    pub description: String,
}

impl Step {
    pub fn new(index: usize, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Index of the step where the license is checked.
pub const LICENSE_STEP: usize = 4;

/// Index of the step where decryption is conditionally performed.
pub const CONDITIONAL_DECRYPTION_STEP: usize = 5;

/// The seven-step story for the given flow.
///
/// Both flows share titles; the TEE flow differs in what steps 4 and 5 say
/// about remote attestation.
pub fn default_steps(mode: VaultMode) -> Vec<Step> {
    let (license, decryption) = match mode {
        VaultMode::Vault => (
            "The buyer purchases a license. The on-chain policy checks it before any key is released.",
            "With a valid license, the vault releases the key and the payload is decrypted for the buyer.",
        ),
        VaultMode::Tee => (
            "The buyer purchases a license and their enclave proves itself through remote attestation.",
            "The key is released only into the attested enclave, which decrypts the payload on the buyer's behalf.",
        ),
    };

    [
        (
            "Upload Data",
            "The IP owner selects the file they want to protect.",
        ),
        (
            "Encrypt File",
            "The file is sealed with a fresh AES-256-GCM key before it leaves the owner's machine.",
        ),
        (
            "Store on IPFS",
            "Only the ciphertext is pinned to decentralized storage and labeled with a content identifier.",
        ),
        (
            "Store Key in Vault",
            "The vault keeps the encryption key, never the file. Writing requires ownership of the IP.",
        ),
        ("License & Access", license),
        ("Conditional Decryption", decryption),
        (
            "Access File",
            "The buyer downloads the original file, byte for byte.",
        ),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (title, description))| Step::new(i, title, description))
    .collect()
}
