//! # Registry-backed License Gate
//!
//! A [`LicenseGate`] that actually says no. It looks the buyer up in a
//! [`LicenseRegistry`], asks an [`AttestationProvider`] about the buyer's
//! enclave when the request is for TEE mode, and runs the result through
//! the mode's [`AccessPolicy`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use ipvault_protocol::license::{LicenseDecision, LicenseError, LicenseGate, LicenseRequest};
use ipvault_protocol::vault::VaultMode;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::access_policy::{AccessEvidence, AccessPolicy};
use crate::license_registry::LicenseRegistry;

// ---------------------------------------------------------------------------
// Attestation
// ---------------------------------------------------------------------------

/// Verifies that a licensee's code runs inside a trusted enclave.
#[async_trait]
pub trait AttestationProvider: Send + Sync {
    /// `Ok(true)` when the licensee's enclave attests successfully.
    async fn verify(&self, licensee: &str) -> Result<bool, LicenseError>;
}

/// Attestation by comparing a reported enclave measurement against the
/// one expected. Licensees report their measurement with [`enroll`].
///
/// [`enroll`]: SimulatedAttestation::enroll
#[derive(Debug)]
pub struct SimulatedAttestation {
    expected_measurement: String,
    reported: RwLock<HashMap<String, String>>,
}

impl SimulatedAttestation {
    pub fn new(expected_measurement: impl Into<String>) -> Self {
        Self {
            expected_measurement: expected_measurement.into(),
            reported: RwLock::new(HashMap::new()),
        }
    }

    /// Record the measurement `licensee`'s enclave reports.
    pub fn enroll(&self, licensee: impl Into<String>, measurement: impl Into<String>) {
        self.reported
            .write()
            .insert(licensee.into(), measurement.into());
    }
}

#[async_trait]
impl AttestationProvider for SimulatedAttestation {
    async fn verify(&self, licensee: &str) -> Result<bool, LicenseError> {
        let reported = self.reported.read().get(licensee).cloned();
        let ok = reported.as_deref() == Some(self.expected_measurement.as_str());
        debug!(licensee, verified = ok, "attestation checked");
        Ok(ok)
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

pub struct RegistryLicenseGate {
    registry: Arc<LicenseRegistry>,
    attestation: Option<Arc<dyn AttestationProvider>>,
}

impl RegistryLicenseGate {
    /// A gate without attestation. TEE-mode requests will always be denied.
    pub fn new(registry: Arc<LicenseRegistry>) -> Self {
        Self {
            registry,
            attestation: None,
        }
    }

    pub fn with_attestation(mut self, provider: Arc<dyn AttestationProvider>) -> Self {
        self.attestation = Some(provider);
        self
    }

    async fn gather_evidence(&self, request: &LicenseRequest) -> Result<AccessEvidence, LicenseError> {
        let has_valid_license =
            self.registry
                .has_valid_license(&request.content_id, &request.licensee, Utc::now());

        let attestation_verified = match (request.mode, &self.attestation) {
            (VaultMode::Tee, Some(provider)) => provider.verify(&request.licensee).await?,
            _ => false,
        };

        Ok(AccessEvidence {
            is_owner: false,
            has_valid_license,
            attestation_verified,
        })
    }
}

#[async_trait]
impl LicenseGate for RegistryLicenseGate {
    async fn check(&self, request: &LicenseRequest) -> Result<LicenseDecision, LicenseError> {
        let evidence = self.gather_evidence(request).await?;

        match AccessPolicy::for_mode(request.mode).evaluate_read(&evidence) {
            Ok(()) => Ok(LicenseDecision::Granted),
            Err(e) => {
                warn!(
                    cid = %request.content_id,
                    licensee = %request.licensee,
                    mode = %request.mode,
                    "license denied: {e}"
                );
                Ok(LicenseDecision::Denied {
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipvault_protocol::ipfs::ContentId;

    fn setup() -> (Arc<LicenseRegistry>, ContentId) {
        let registry = Arc::new(LicenseRegistry::new());
        let cid = ContentId::new("bafygatetest");
        registry
            .register_ip(cid.clone(), "owner", VaultMode::Tee)
            .unwrap();
        registry.purchase(&cid, "buyer", 50, None).unwrap();
        (registry, cid)
    }

    #[tokio::test]
    async fn test_vault_mode_grants_licensee() {
        let (registry, cid) = setup();
        let gate = RegistryLicenseGate::new(registry);
        let request = LicenseRequest::new(cid, VaultMode::Vault).with_licensee("buyer");
        assert!(gate.check(&request).await.unwrap().is_granted());
    }

    #[tokio::test]
    async fn test_tee_mode_without_provider_denies() {
        let (registry, cid) = setup();
        let gate = RegistryLicenseGate::new(registry);
        let request = LicenseRequest::new(cid, VaultMode::Tee).with_licensee("buyer");
        assert!(!gate.check(&request).await.unwrap().is_granted());
    }

    #[tokio::test]
    async fn test_attestation_measurement_must_match() {
        let (registry, cid) = setup();
        let attestation = Arc::new(SimulatedAttestation::new("mr-enclave-1"));
        attestation.enroll("buyer", "mr-enclave-2");
        let gate = RegistryLicenseGate::new(registry).with_attestation(attestation.clone());
        let request = LicenseRequest::new(cid, VaultMode::Tee).with_licensee("buyer");

        let decision = gate.check(&request).await.unwrap();
        assert_eq!(
            decision,
            LicenseDecision::Denied {
                reason: "access condition not met: Valid Remote Attestation".into()
            }
        );

        attestation.enroll("buyer", "mr-enclave-1");
        assert!(gate.check(&request).await.unwrap().is_granted());
    }
}
