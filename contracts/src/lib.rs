//! # IP Vault Contracts
//!
//! The licensing side of IP Vault. In the demo a license check is a sleep
//! that always succeeds; these contracts are what sits behind the same
//! [`LicenseGate`](ipvault_protocol::license::LicenseGate) seam when the
//! answer has to depend on something:
//!
//! - **Access Policy** - the write/read conditions of each vault mode and
//!   a checker that reports the first unmet one.
//! - **License Registry** - IP ownership, license sales with optional
//!   expiry, and owner-only revocation.
//! - **Gate** - a registry-backed license gate, with pluggable remote
//!   attestation for TEE mode.
//!
//! ## Design Principles
//!
//! 1. State transitions are explicit: enum variants, not boolean flags.
//! 2. Ownership gates every privileged operation.
//! 3. Every public record type is serializable (serde).

pub mod access_policy;
pub mod gate;
pub mod license_registry;

pub use access_policy::{AccessError, AccessEvidence, AccessPolicy};
pub use gate::{AttestationProvider, RegistryLicenseGate, SimulatedAttestation};
pub use license_registry::{IpLicense, IpRegistration, LicenseRegistry, LicenseStatus, RegistryError};
