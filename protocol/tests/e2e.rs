//! End-to-end integration tests for the IP Vault core.
//!
//! These run the owner and buyer halves of the demo against real storage
//! backends: an owner sequencer uploads and saves a key, a separate buyer
//! sequencer over the same store purchases and downloads. Persistence tests
//! reopen a sled database between the two halves.
//!
//! Each test gets its own store. License checks use paused tokio time so
//! the simulated delay costs nothing.

use std::sync::Arc;
use std::time::Duration;

use ipvault_protocol::config::{DemoConfig, KEY_VAULT_STORAGE_KEY, MOCK_IPFS_KEY_PREFIX};
use ipvault_protocol::demo::{
    DemoError, DemoEvent, DemoSequencer, DemoStage, DirectorySink, MemorySink, SelectedFile,
};
use ipvault_protocol::ipfs::{ContentId, StorageObject};
use ipvault_protocol::license::{
    LicenseDecision, LicenseError, LicenseGate, LicenseRequest, SimulatedLicenseGate,
};
use ipvault_protocol::storage::{KeyValueStore, MemoryStore, SharedStore, SledStore};
use ipvault_protocol::vault::{KeyVault, VaultMode};
use ipvault_protocol::walkthrough::{
    default_steps, TabbedFlow, WalkthroughController, WalkthroughEvent, WalkthroughPlayer,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn gate() -> Arc<dyn LicenseGate> {
    Arc::new(SimulatedLicenseGate::new(DemoConfig::default().license_check_delay))
}

/// Owner side: select, upload, save. Returns the CID.
fn publish(store: SharedStore, name: &str, bytes: &[u8], mode: VaultMode) -> ContentId {
    let mut owner = DemoSequencer::new(store, gate()).with_mode(mode);
    owner.select_file(SelectedFile::new(name, bytes.to_vec()));
    let receipt = owner.encrypt_and_upload().expect("upload");
    owner.save_last_key().expect("save key");
    receipt.content_id
}

/// A gate that refuses everyone.
struct DenyAll;

#[async_trait::async_trait]
impl LicenseGate for DenyAll {
    async fn check(&self, _request: &LicenseRequest) -> Result<LicenseDecision, LicenseError> {
        Ok(LicenseDecision::Denied {
            reason: "license expired".into(),
        })
    }
}

/// A gate whose backend is down.
struct Offline;

#[async_trait::async_trait]
impl LicenseGate for Offline {
    async fn check(&self, _request: &LicenseRequest) -> Result<LicenseDecision, LicenseError> {
        Err(LicenseError::Unavailable("registry unreachable".into()))
    }
}

// ---------------------------------------------------------------------------
// Demo flow
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_owner_and_buyer_share_a_store() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let cid = publish(store.clone(), "ten.bin", b"0123456789", VaultMode::Vault);

    let mut buyer = DemoSequencer::new(store, gate());
    let mut sink = MemorySink::new();
    let delivery = buyer.buy_and_download(&cid, &mut sink).await.unwrap();

    assert_eq!(delivery.content_id, cid);
    assert_eq!(delivery.receipt.file_name, "ten.bin");
    assert_eq!(sink.last().unwrap().1, b"0123456789");
    assert_eq!(buyer.stage(), &DemoStage::Delivered);
}

#[tokio::test(start_paused = true)]
async fn test_buyer_event_sequence() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let cid = publish(store.clone(), "a.txt", b"abc", VaultMode::Tee);

    let mut buyer = DemoSequencer::new(store, gate()).with_mode(VaultMode::Tee);
    let mut rx = buyer.subscribe();
    buyer
        .buy_and_download(&cid, &mut MemorySink::new())
        .await
        .unwrap();

    let mut names = Vec::new();
    while let Ok(DemoEvent::StageChanged { stage, .. }) = rx.try_recv() {
        names.push(stage.name());
    }
    assert_eq!(
        names,
        vec!["license_checking", "license_granted", "decrypting", "delivered"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_license_check_takes_configured_delay() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let cid = publish(store.clone(), "a.txt", b"abc", VaultMode::Vault);

    let slow = Arc::new(SimulatedLicenseGate::new(Duration::from_secs(5)));
    let mut buyer = DemoSequencer::new(store, slow);

    let start = tokio::time::Instant::now();
    buyer
        .buy_and_download(&cid, &mut MemorySink::new())
        .await
        .unwrap();
    assert!(start.elapsed() >= Duration::from_secs(5));
}

#[tokio::test]
async fn test_denied_license_blocks_download() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let cid = publish(store.clone(), "a.txt", b"abc", VaultMode::Vault);

    let mut buyer = DemoSequencer::new(store, Arc::new(DenyAll));
    let mut sink = MemorySink::new();
    let err = buyer.buy_and_download(&cid, &mut sink).await.unwrap_err();

    assert!(matches!(err, DemoError::LicenseDenied { ref reason } if reason == "license expired"));
    assert_eq!(buyer.stage(), &DemoStage::Idle);
    assert_eq!(
        buyer.status(),
        "Access denied: key not found or license invalid."
    );
    assert!(sink.deliveries.is_empty());
}

#[tokio::test]
async fn test_offline_gate_surfaces_error() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let cid = publish(store.clone(), "a.txt", b"abc", VaultMode::Vault);

    let mut buyer = DemoSequencer::new(store, Arc::new(Offline));
    let err = buyer
        .buy_and_download(&cid, &mut MemorySink::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DemoError::License(_)));
    assert!(buyer.status().contains("registry unreachable"));
}

#[tokio::test(start_paused = true)]
async fn test_empty_file_round_trips() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let cid = publish(store.clone(), "empty.txt", b"", VaultMode::Vault);

    let mut sink = MemorySink::new();
    DemoSequencer::new(store, gate())
        .buy_and_download(&cid, &mut sink)
        .await
        .unwrap();
    assert!(sink.last().unwrap().1.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tampered_payload_fails_decryption() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let cid = publish(store.clone(), "a.txt", b"original", VaultMode::Vault);

    // Swap in a payload sealed under some other key.
    let other = ipvault_protocol::crypto::SymmetricKey::generate();
    let sealed = ipvault_protocol::crypto::seal(&other, b"forged").unwrap();
    let forged = StorageObject::from_sealed(&sealed, "a.txt").encode().unwrap();
    store
        .set(&format!("{MOCK_IPFS_KEY_PREFIX}{cid}"), &forged)
        .unwrap();

    let mut sink = MemorySink::new();
    let err = DemoSequencer::new(store, gate())
        .buy_and_download(&cid, &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, DemoError::DecryptionFailed));
    assert!(sink.deliveries.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_corrupt_vault_is_reported() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let cid = publish(store.clone(), "a.txt", b"abc", VaultMode::Vault);
    store.set(KEY_VAULT_STORAGE_KEY, "{not json").unwrap();

    let err = DemoSequencer::new(store, gate())
        .buy_and_download(&cid, &mut MemorySink::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DemoError::Vault(_)));
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_sled_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("store");

    let cid = {
        let store: SharedStore = Arc::new(SledStore::open(&db_path).unwrap());
        publish(store, "score.pdf", b"%PDF-1.7 fake", VaultMode::Tee)
    };

    let store: SharedStore = Arc::new(SledStore::open(&db_path).unwrap());
    let records = KeyVault::new(store.clone()).records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].mode, VaultMode::Tee);

    let out = dir.path().join("downloads");
    let mut sink = DirectorySink::new(&out);
    let delivery = DemoSequencer::new(store, gate())
        .buy_and_download(&cid, &mut sink)
        .await
        .unwrap();

    let saved = delivery.receipt.location.unwrap();
    assert_eq!(saved, out.join("score.pdf"));
    assert_eq!(std::fs::read(saved).unwrap(), b"%PDF-1.7 fake");
}

#[test]
fn test_vault_json_layout() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let cid = publish(store.clone(), "a.txt", b"abc", VaultMode::Vault);

    let raw = store.get(KEY_VAULT_STORAGE_KEY).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &json.as_array().unwrap()[0];
    assert_eq!(entry["contentId"], cid.as_str());
    assert_eq!(entry["fileName"], "a.txt");
    assert_eq!(entry["mode"], "vault");
    assert!(entry["savedAt"].is_i64());
    assert!(entry["keyMaterial"].is_string());
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_autoplay_runs_the_full_tour() {
    let config = DemoConfig::default();
    let controller = WalkthroughController::new(default_steps(VaultMode::Vault)).unwrap();
    let mut player = WalkthroughPlayer::new(controller, config.autoplay_interval);
    let mut rx = player.subscribe();

    player.toggle_play();
    // Seven ticks take us around the loop and back to the first step.
    tokio::time::sleep(config.autoplay_interval * 7 + config.autoplay_interval / 2).await;
    player.pause();

    assert_eq!(player.state().active_index, 0);
    assert!(!player.is_playing());

    let mut visited = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let WalkthroughEvent::StepChanged { index } = event {
            visited.push(index);
        }
    }
    assert_eq!(visited, vec![1, 2, 3, 4, 5, 6, 0]);
}

#[test]
fn test_flow_tabs_match_step_text() {
    let mut flow = TabbedFlow::new(VaultMode::Vault);
    assert!(!flow.diagram().contains("TEE"));
    assert!(flow.select(VaultMode::Tee));
    assert!(flow.diagram().contains("TEE"));

    let tee_steps = default_steps(VaultMode::Tee);
    assert!(tee_steps
        .iter()
        .any(|s| s.description.to_lowercase().contains("attestation")));
}
