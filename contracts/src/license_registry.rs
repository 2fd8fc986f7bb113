//! # License Registry Contract
//!
//! Records who owns each piece of IP and which licenses have been sold for
//! it. This is the state a real deployment would keep on-chain; here it is
//! an in-process map behind a lock.
//!
//! ## Lifecycle
//!
//! 1. The owner registers a content identifier. This is the write-side
//!    "ownership of IP" condition: the first registrant wins, and another
//!    owner trying to claim the same identifier is rejected.
//! 2. A buyer purchases a license, optionally time-limited.
//! 3. The owner may revoke a license. Revocation is final.
//!
//! A license is valid while it is `Active` and not past its expiry.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use ipvault_protocol::ipfs::ContentId;
use ipvault_protocol::vault::VaultMode;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Someone else already owns this identifier.
    #[error("{content_id} is already registered to {owner}")]
    AlreadyRegistered {
        content_id: ContentId,
        owner: String,
    },

    #[error("{0} is not registered")]
    NotRegistered(ContentId),

    #[error("license {0} not found")]
    LicenseNotFound(String),

    /// The caller is not allowed to perform this operation.
    #[error("unauthorized: {party} does not own {content_id}")]
    Unauthorized {
        party: String,
        content_id: ContentId,
    },

    #[error("invalid state: license is {current}, expected {expected}")]
    InvalidState { current: String, expected: String },

    #[error("owner {0} cannot license their own IP")]
    SelfPurchase(String),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Ownership record for one piece of IP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRegistration {
    pub content_id: ContentId,
    pub owner: String,
    pub mode: VaultMode,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseStatus {
    Active,
    Revoked,
}

impl std::fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseStatus::Active => write!(f, "Active"),
            LicenseStatus::Revoked => write!(f, "Revoked"),
        }
    }
}

/// A license sold to one buyer for one piece of IP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpLicense {
    pub id: String,
    pub content_id: ContentId,
    pub licensee: String,
    /// Price paid, in the smallest unit of whatever currency the deployment uses.
    pub price: u64,
    pub issued_at: DateTime<Utc>,
    /// `None` means perpetual.
    pub expires_at: Option<DateTime<Utc>>,
    pub status: LicenseStatus,
}

impl IpLicense {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.status == LicenseStatus::Active && self.expires_at.map_or(true, |exp| now < exp)
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    registrations: HashMap<ContentId, IpRegistration>,
    licenses: Vec<IpLicense>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Thread-safe registry of IP ownership and licenses.
#[derive(Debug, Default)]
pub struct LicenseRegistry {
    inner: RwLock<RegistryInner>,
}

impl LicenseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `content_id` for `owner`.
    ///
    /// Registering again as the same owner returns the existing record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] if a different owner
    /// holds the identifier.
    pub fn register_ip(
        &self,
        content_id: ContentId,
        owner: impl Into<String>,
        mode: VaultMode,
    ) -> Result<IpRegistration, RegistryError> {
        let owner = owner.into();
        let mut inner = self.inner.write();

        if let Some(existing) = inner.registrations.get(&content_id) {
            if existing.owner != owner {
                return Err(RegistryError::AlreadyRegistered {
                    content_id,
                    owner: existing.owner.clone(),
                });
            }
            return Ok(existing.clone());
        }

        let registration = IpRegistration {
            content_id: content_id.clone(),
            owner,
            mode,
            registered_at: Utc::now(),
        };
        inner
            .registrations
            .insert(content_id, registration.clone());
        info!(cid = %registration.content_id, owner = %registration.owner, "ip registered");
        Ok(registration)
    }

    pub fn registration(&self, content_id: &ContentId) -> Option<IpRegistration> {
        self.inner.read().registrations.get(content_id).cloned()
    }

    /// Sells a license for `content_id` to `licensee`.
    ///
    /// `duration` of `None` issues a perpetual license.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for unknown IP and
    /// [`RegistryError::SelfPurchase`] when the owner tries to buy.
    pub fn purchase(
        &self,
        content_id: &ContentId,
        licensee: impl Into<String>,
        price: u64,
        duration: Option<Duration>,
    ) -> Result<IpLicense, RegistryError> {
        let licensee = licensee.into();
        let mut inner = self.inner.write();

        let registration = inner
            .registrations
            .get(content_id)
            .ok_or_else(|| RegistryError::NotRegistered(content_id.clone()))?;
        if registration.owner == licensee {
            return Err(RegistryError::SelfPurchase(licensee));
        }

        let issued_at = Utc::now();
        let license = IpLicense {
            id: Uuid::new_v4().to_string(),
            content_id: content_id.clone(),
            licensee,
            price,
            issued_at,
            expires_at: duration.map(|d| issued_at + d),
            status: LicenseStatus::Active,
        };
        inner.licenses.push(license.clone());

        info!(
            cid = %content_id,
            licensee = %license.licensee,
            license_id = %license.id,
            price,
            "license purchased"
        );
        Ok(license)
    }

    /// Revokes a license. Only the IP owner may do this.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LicenseNotFound`], [`RegistryError::Unauthorized`]
    /// if `caller` is not the owner, or [`RegistryError::InvalidState`] if the
    /// license is already revoked.
    pub fn revoke(&self, license_id: &str, caller: &str) -> Result<IpLicense, RegistryError> {
        let mut inner = self.inner.write();
        let RegistryInner {
            registrations,
            licenses,
        } = &mut *inner;

        let license = licenses
            .iter_mut()
            .find(|l| l.id == license_id)
            .ok_or_else(|| RegistryError::LicenseNotFound(license_id.to_string()))?;

        let is_owner = registrations
            .get(&license.content_id)
            .map_or(false, |r| r.owner == caller);
        if !is_owner {
            return Err(RegistryError::Unauthorized {
                party: caller.to_string(),
                content_id: license.content_id.clone(),
            });
        }

        if license.status != LicenseStatus::Active {
            return Err(RegistryError::InvalidState {
                current: license.status.to_string(),
                expected: LicenseStatus::Active.to_string(),
            });
        }

        license.status = LicenseStatus::Revoked;
        info!(license_id, cid = %license.content_id, "license revoked");
        Ok(license.clone())
    }

    /// Does `licensee` hold a license for `content_id` that is valid at `now`?
    pub fn has_valid_license(
        &self,
        content_id: &ContentId,
        licensee: &str,
        now: DateTime<Utc>,
    ) -> bool {
        self.inner
            .read()
            .licenses
            .iter()
            .any(|l| &l.content_id == content_id && l.licensee == licensee && l.is_valid_at(now))
    }

    pub fn licenses_for(&self, content_id: &ContentId) -> Vec<IpLicense> {
        self.inner
            .read()
            .licenses
            .iter()
            .filter(|l| &l.content_id == content_id)
            .cloned()
            .collect()
    }
}
