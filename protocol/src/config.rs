//! # Demo Configuration & Constants
//!
//! Every magic number in the IP Vault demo lives here. The page this engine
//! backs hard-coded these values inline; pulling them into one place keeps the
//! CLI, the tests, and the library in agreement.
//!
//! Runtime-tunable values (autoplay cadence, the fake license latency,
//! storage quota) also have a [`DemoConfig`] knob so a front end can override
//! them without touching the constants.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// AES-256-GCM, the same AEAD the browser demo asked `crypto.subtle` for.
pub const SYMMETRIC_ALGORITHM: &str = "AES-256-GCM";

/// AES-256-GCM key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce length in bytes. 96 bits, the only size worth using.
pub const AES_NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const AES_TAG_LENGTH: usize = 16;

// ---------------------------------------------------------------------------
// Storage Layout
// ---------------------------------------------------------------------------

/// Fixed key under which the key vault keeps its JSON array of records.
pub const KEY_VAULT_STORAGE_KEY: &str = "ipvault.keys";

/// Prefix for mock IPFS entries. The full key is `mock-ipfs:<cid>`.
pub const MOCK_IPFS_KEY_PREFIX: &str = "mock-ipfs:";

/// Prefix of every pseudo content identifier. Looks like a CIDv1, is not one.
pub const PSEUDO_CID_PREFIX: &str = "bafy";

/// Number of random base-36 characters appended after [`PSEUDO_CID_PREFIX`].
pub const PSEUDO_CID_RANDOM_LENGTH: usize = 32;

/// Roughly what browsers grant a single origin for `localStorage`.
pub const DEFAULT_STORAGE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Autoplay cadence of the walkthrough.
pub const AUTOPLAY_INTERVAL: Duration = Duration::from_millis(2_200);

/// Artificial latency of the simulated on-chain license check.
pub const LICENSE_CHECK_DELAY: Duration = Duration::from_millis(800);

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// Runtime knobs for a demo session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Interval between autoplay ticks.
    pub autoplay_interval: Duration,
    /// Delay applied by [`crate::license::SimulatedLicenseGate`].
    pub license_check_delay: Duration,
    /// Byte quota for the in-memory store. `None` means unbounded.
    pub storage_quota: Option<usize>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            autoplay_interval: AUTOPLAY_INTERVAL,
            license_check_delay: LICENSE_CHECK_DELAY,
            storage_quota: Some(DEFAULT_STORAGE_QUOTA_BYTES),
        }
    }
}

impl DemoConfig {
    /// Override the autoplay interval from a millisecond count.
    /// Zero is rejected by tokio's interval, so it is bumped to 1ms.
    pub fn with_autoplay_ms(mut self, ms: u64) -> Self {
        self.autoplay_interval = Duration::from_millis(ms.max(1));
        self
    }

    /// Override the simulated license latency from a millisecond count.
    pub fn with_license_delay_ms(mut self, ms: u64) -> Self {
        self.license_check_delay = Duration::from_millis(ms);
        self
    }
}
