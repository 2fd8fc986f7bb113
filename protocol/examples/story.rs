//! Narrated run of the IP Vault story, step by step.
//!
//! Follows the seven walkthrough steps and performs each one for real
//! against an in-memory store: an owner seals a file, parks it on mock IPFS,
//! saves the key, and a buyer passes the license check and gets the file
//! back. Ends with a buyer who never got a key, for contrast.
//!
//! Run with:
//!   cargo run --example story

use std::sync::Arc;
use std::time::{Duration, Instant};

use ipvault_protocol::demo::{DemoSequencer, MemorySink, SelectedFile};
use ipvault_protocol::ipfs::{ContentId, MockIpfs};
use ipvault_protocol::license::SimulatedLicenseGate;
use ipvault_protocol::storage::{KeyValueStore, MemoryStore, SharedStore};
use ipvault_protocol::vault::VaultMode;
use ipvault_protocol::walkthrough::{default_steps, Step, TabbedFlow};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

const BG_MAGENTA: &str = "\x1b[45m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn banner(mode: VaultMode) {
    println!();
    println!("{BG_MAGENTA}{BOLD}{WHITE}                                                                    {RESET}");
    println!(
        "{BG_MAGENTA}{BOLD}{WHITE}    {:<64}{RESET}",
        format!("{}  --  Encrypt, Store, License, Decrypt", mode.label())
    );
    println!("{BG_MAGENTA}{BOLD}{WHITE}    AES-256-GCM  |  mock IPFS  |  simulated license check          {RESET}");
    println!("{BG_MAGENTA}{BOLD}{WHITE}                                                                    {RESET}");
    println!();
}

fn section(step: &Step, total: usize) {
    println!();
    println!(
        "{BOLD}{CYAN}===[{YELLOW} Step {}/{total} {CYAN}]============================================================{RESET}",
        step.index + 1
    );
    println!("{BOLD}{WHITE}  {}{RESET}", step.title);
    println!("{DIM}  {}{RESET}", step.description);
    println!("{CYAN}------------------------------------------------------------------------{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn failure(text: &str) {
    println!("{RED}  [DENIED] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn timing(label: &str, elapsed: Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    println!("{DIM}{MAGENTA}  [{label}: {ms:.2} ms]{RESET}");
}

/// First and last few characters of a long value.
fn abbreviate(value: &str) -> String {
    if value.len() <= 20 {
        return value.to_string();
    }
    format!("{}...{}", &value[..10], &value[value.len() - 6..])
}

// ---------------------------------------------------------------------------
// Story
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    let mode = VaultMode::Tee;
    let steps = default_steps(mode);
    let total = steps.len();

    banner(mode);
    println!("  {DIM}{}{RESET}", TabbedFlow::new(mode).diagram());

    let store: SharedStore = Arc::new(MemoryStore::new());
    let gate = Arc::new(SimulatedLicenseGate::default());
    let mut owner = DemoSequencer::new(store.clone(), gate.clone()).with_mode(mode);

    // Step 1: Upload data
    section(&steps[0], total);
    let lyrics = b"Verse 1: the chorus nobody has heard yet".to_vec();
    owner.select_file(SelectedFile::new("unreleased.txt", lyrics.clone()));
    info("File", "unreleased.txt");
    info("Size", &format!("{} bytes", lyrics.len()));
    success(owner.status());

    // Steps 2 & 3: Encrypt, store on IPFS
    section(&steps[1], total);
    let start = Instant::now();
    let receipt = match owner.encrypt_and_upload() {
        Ok(r) => r,
        Err(e) => {
            failure(&e.status_message());
            return;
        }
    };
    timing("seal + upload", start.elapsed());
    info("Key", &abbreviate(&receipt.key_material));
    success("Sealed with a fresh key and nonce");

    section(&steps[2], total);
    info("CID", receipt.content_id.as_str());
    let stored = store
        .get(&MockIpfs::storage_key(&receipt.content_id))
        .ok()
        .flatten()
        .unwrap_or_default();
    info("Envelope", &abbreviate(&stored));
    success("Ciphertext pinned to mock IPFS");

    // Step 4: Store key in vault
    section(&steps[3], total);
    if let Err(e) = owner.save_last_key() {
        failure(&e.status_message());
        return;
    }
    success(owner.status());

    // Steps 5-7: License, conditional decryption, access
    section(&steps[4], total);
    let mut buyer = DemoSequencer::new(store.clone(), gate.clone()).with_mode(mode);
    let mut sink = MemorySink::new();
    let start = Instant::now();
    let outcome = buyer.buy_and_download(&receipt.content_id, &mut sink).await;
    timing("license check", start.elapsed());

    section(&steps[5], total);
    match outcome {
        Ok(delivery) => {
            success("License valid, enclave attested, key released");
            section(&steps[6], total);
            info("Delivered", &delivery.receipt.file_name);
            let plaintext = sink.last().map(|(_, bytes)| bytes.clone()).unwrap_or_default();
            info("Contents", &String::from_utf8_lossy(&plaintext));
            if plaintext == lyrics {
                success("Plaintext matches the original byte for byte");
            }
        }
        Err(e) => failure(&e.status_message()),
    }

    // Contrast: someone asks for an identifier nobody uploaded.
    println!();
    println!("{BOLD}{CYAN}===[{YELLOW} Epilogue {CYAN}]============================================================{RESET}");
    let mut stranger = DemoSequencer::new(store, gate).with_mode(mode);
    let bogus = ContentId::new("bafynothinghereatall");
    match stranger.buy_and_download(&bogus, &mut MemorySink::new()).await {
        Ok(_) => success("unexpectedly delivered"),
        Err(e) => failure(&e.status_message()),
    }
    println!();
}
