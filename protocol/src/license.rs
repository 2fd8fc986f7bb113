//! # License Gate
//!
//! The seam between the demo sequencer and whatever decides whether a buyer
//! may read a piece of IP. On the real product that is an on-chain license
//! lookup (plus a remote-attestation check in TEE mode).
//!
//! [`SimulatedLicenseGate`] is what the demo ships with: it waits a fixed
//! delay and always grants. No negative path exists in it. The
//! `ipvault-contracts` crate provides a registry-backed gate that can deny.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::config::LICENSE_CHECK_DELAY;
use crate::ipfs::ContentId;
use crate::vault::VaultMode;

/// Licensee used when the caller does not name one.
pub const DEFAULT_LICENSEE: &str = "demo-buyer";

/// What the buyer is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseRequest {
    pub content_id: ContentId,
    pub licensee: String,
    pub mode: VaultMode,
}

impl LicenseRequest {
    pub fn new(content_id: ContentId, mode: VaultMode) -> Self {
        Self {
            content_id,
            licensee: DEFAULT_LICENSEE.to_string(),
            mode,
        }
    }

    pub fn with_licensee(mut self, licensee: impl Into<String>) -> Self {
        self.licensee = licensee.into();
        self
    }
}

/// Outcome of a license check that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseDecision {
    Granted,
    Denied { reason: String },
}

impl LicenseDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, LicenseDecision::Granted)
    }
}

/// A condition the vault policy attaches to writing or reading IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessCondition {
    /// Writer must own the IP.
    OwnershipOfIp,
    /// Reader must hold a valid license.
    ValidLicense,
    /// Reader's enclave must pass remote attestation.
    ValidRemoteAttestation,
}

impl AccessCondition {
    pub fn label(&self) -> &'static str {
        match self {
            AccessCondition::OwnershipOfIp => "Ownership of IP",
            AccessCondition::ValidLicense => "Valid IP License",
            AccessCondition::ValidRemoteAttestation => "Valid Remote Attestation",
        }
    }

    /// Conditions for uploading under `mode`. Identical for both modes.
    pub fn write_conditions(_mode: VaultMode) -> &'static [AccessCondition] {
        &[AccessCondition::OwnershipOfIp]
    }

    /// Conditions for reading under `mode`.
    pub fn read_conditions(mode: VaultMode) -> &'static [AccessCondition] {
        match mode {
            VaultMode::Vault => &[AccessCondition::ValidLicense],
            VaultMode::Tee => &[
                AccessCondition::ValidLicense,
                AccessCondition::ValidRemoteAttestation,
            ],
        }
    }
}

impl std::fmt::Display for AccessCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The check itself could not be carried out.
#[derive(Debug, Error)]
pub enum LicenseError {
    #[error("license service unavailable: {0}")]
    Unavailable(String),
}

/// Decides whether a buyer may receive the key for a piece of IP.
#[async_trait]
pub trait LicenseGate: Send + Sync {
    async fn check(&self, request: &LicenseRequest) -> Result<LicenseDecision, LicenseError>;
}

/// Fixed-latency gate that always grants.
#[derive(Debug, Clone)]
pub struct SimulatedLicenseGate {
    delay: Duration,
}

impl SimulatedLicenseGate {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedLicenseGate {
    fn default() -> Self {
        Self::new(LICENSE_CHECK_DELAY)
    }
}

#[async_trait]
impl LicenseGate for SimulatedLicenseGate {
    async fn check(&self, request: &LicenseRequest) -> Result<LicenseDecision, LicenseError> {
        debug!(
            cid = %request.content_id,
            licensee = %request.licensee,
            mode = %request.mode,
            delay_ms = self.delay.as_millis() as u64,
            "simulating on-chain license check"
        );
        tokio::time::sleep(self.delay).await;
        Ok(LicenseDecision::Granted)
    }
}
