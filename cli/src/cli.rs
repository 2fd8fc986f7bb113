//! # CLI Interface
//!
//! Argument structure for `ipvault`, via `clap` derive. One subcommand per
//! thing the demo page let you click, plus `demo` to run the whole story in
//! one go.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ipvault_protocol::config::{AUTOPLAY_INTERVAL, LICENSE_CHECK_DELAY};
use ipvault_protocol::vault::VaultMode;

/// IP Vault demo: encrypt, store, license, decrypt.
///
/// Everything runs locally. "IPFS" is a key prefix in the data store and
/// the license check is simulated.
#[derive(Parser, Debug)]
#[command(
    name = "ipvault",
    about = "IP Vault demo: encrypt, store, license, decrypt",
    version,
    propagate_version = true
)]
pub struct IpvaultCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Directory holding the persistent store.
    #[arg(long, short = 'd', global = true, env = "IPVAULT_DATA_DIR", default_value = ".ipvault")]
    pub data_dir: PathBuf,

    /// Use a throwaway in-memory store with a browser-sized quota.
    #[arg(long, global = true)]
    pub memory: bool,

    /// Log output format: pretty or json.
    #[arg(long, global = true, env = "IPVAULT_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encrypt a file and upload it to mock IPFS.
    Upload(UploadArgs),
    /// Save a key record to the vault.
    SaveKey(SaveKeyArgs),
    /// Check the license, then decrypt and download a file.
    Buy(BuyArgs),
    /// List saved key records.
    Records(RecordsArgs),
    /// Upload, save the key and buy it back, in one go.
    Demo(DemoArgs),
    /// Step through the guided tour.
    Walkthrough(WalkthroughArgs),
    /// Print the owner-to-buyer flow diagram for a mode.
    Flow(FlowArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// File to encrypt.
    pub file: PathBuf,

    /// Vault mode recorded with the key: vault or tee.
    #[arg(long, short = 'm', default_value = "vault")]
    pub mode: VaultMode,

    /// Also save the generated key to the vault.
    #[arg(long)]
    pub save_key: bool,
}

#[derive(Args, Debug)]
pub struct SaveKeyArgs {
    /// Content identifier the key belongs to.
    pub cid: String,

    /// Base64 key material, as printed by `upload`.
    pub key: String,

    /// Original file name.
    #[arg(long, short = 'n', default_value = "download.bin")]
    pub name: String,

    #[arg(long, short = 'm', default_value = "vault")]
    pub mode: VaultMode,
}

#[derive(Args, Debug)]
pub struct LicenseArgs {
    /// Vault mode used for the license request.
    #[arg(long, short = 'm', default_value = "vault")]
    pub mode: VaultMode,

    /// Simulated license check latency.
    #[arg(
        long,
        env = "IPVAULT_LICENSE_DELAY_MS",
        default_value_t = LICENSE_CHECK_DELAY.as_millis() as u64
    )]
    pub license_delay_ms: u64,

    /// Directory to write the decrypted file into.
    #[arg(long, short = 'o', default_value = ".")]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct BuyArgs {
    /// Content identifier to purchase.
    pub cid: String,

    #[command(flatten)]
    pub license: LicenseArgs,
}

#[derive(Args, Debug)]
pub struct RecordsArgs {
    /// Only show records for this content identifier.
    #[arg(long)]
    pub cid: Option<String>,

    /// Print raw JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// File to run through the whole flow.
    pub file: PathBuf,

    #[command(flatten)]
    pub license: LicenseArgs,
}

#[derive(Args, Debug)]
pub struct WalkthroughArgs {
    #[arg(long, short = 'm', default_value = "vault")]
    pub mode: VaultMode,

    /// Step to start on. Out-of-range values clamp to the last step.
    #[arg(long, default_value_t = 0)]
    pub start: usize,

    /// Advance automatically instead of printing the whole tour.
    #[arg(long)]
    pub autoplay: bool,

    /// Number of autoplay ticks before stopping.
    #[arg(long, default_value_t = 7)]
    pub ticks: usize,

    /// Autoplay interval.
    #[arg(
        long,
        env = "IPVAULT_AUTOPLAY_MS",
        default_value_t = AUTOPLAY_INTERVAL.as_millis() as u64
    )]
    pub interval_ms: u64,
}

#[derive(Args, Debug)]
pub struct FlowArgs {
    #[arg(long, short = 'm', default_value = "vault")]
    pub mode: VaultMode,
}
