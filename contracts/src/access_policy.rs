//! # Access Policy
//!
//! The conditions a vault attaches to writing and reading a piece of IP,
//! and a way to check a set of facts about a caller against them.
//!
//! | Mode        | Write            | Read                                      |
//! |-------------|------------------|-------------------------------------------|
//! | IP Vault    | Ownership of IP  | Valid IP License                          |
//! | Vault + TEE | Ownership of IP  | Valid IP License, Valid Remote Attestation |
//!
//! Conditions are checked in the order listed. The first unmet one is the
//! one reported.

use ipvault_protocol::license::AccessCondition;
use ipvault_protocol::vault::VaultMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The caller does not satisfy a condition of the policy.
    #[error("access condition not met: {0}")]
    ConditionNotMet(AccessCondition),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What is known about a caller at the time of the check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvidence {
    /// Caller is the registered owner of the IP.
    pub is_owner: bool,
    /// Caller holds an active, unexpired license.
    pub has_valid_license: bool,
    /// Caller's enclave passed remote attestation.
    pub attestation_verified: bool,
}

impl AccessEvidence {
    pub fn owner() -> Self {
        Self {
            is_owner: true,
            ..Self::default()
        }
    }

    pub fn licensee(attestation_verified: bool) -> Self {
        Self {
            has_valid_license: true,
            attestation_verified,
            ..Self::default()
        }
    }

    pub fn satisfies(&self, condition: AccessCondition) -> bool {
        match condition {
            AccessCondition::OwnershipOfIp => self.is_owner,
            AccessCondition::ValidLicense => self.has_valid_license,
            AccessCondition::ValidRemoteAttestation => self.attestation_verified,
        }
    }
}

/// Write and read conditions for one vault mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    mode: VaultMode,
    write: &'static [AccessCondition],
    read: &'static [AccessCondition],
}

impl AccessPolicy {
    pub fn for_mode(mode: VaultMode) -> Self {
        Self {
            mode,
            write: AccessCondition::write_conditions(mode),
            read: AccessCondition::read_conditions(mode),
        }
    }

    pub fn mode(&self) -> VaultMode {
        self.mode
    }

    pub fn write_conditions(&self) -> &'static [AccessCondition] {
        self.write
    }

    pub fn read_conditions(&self) -> &'static [AccessCondition] {
        self.read
    }

    /// May the caller upload?
    pub fn evaluate_write(&self, evidence: &AccessEvidence) -> Result<(), AccessError> {
        Self::evaluate(self.write, evidence)
    }

    /// May the caller decrypt?
    pub fn evaluate_read(&self, evidence: &AccessEvidence) -> Result<(), AccessError> {
        Self::evaluate(self.read, evidence)
    }

    fn evaluate(
        conditions: &[AccessCondition],
        evidence: &AccessEvidence,
    ) -> Result<(), AccessError> {
        match conditions.iter().find(|c| !evidence.satisfies(**c)) {
            Some(unmet) => Err(AccessError::ConditionNotMet(*unmet)),
            None => Ok(()),
        }
    }
}
