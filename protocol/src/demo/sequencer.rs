//! # Demo Sequencer
//!
//! The end-to-end "encrypt → store → license-gate → decrypt" flow, run
//! entirely against the local store.
//!
//! ## Pipeline
//!
//! ```text
//! select_file        Idle → FileSelected
//! encrypt_and_upload FileSelected → Encrypting → Uploading → Uploaded(cid)
//! save_key           → KeySaved
//! buy_and_download   → LicenseChecking → LicenseGranted → Decrypting → Delivered
//! ```
//!
//! Each operation borrows the sequencer mutably, so one sequencer runs one
//! operation at a time. Two sequencers over the same store are not isolated
//! from each other (see [`crate::vault`]).
//!
//! A payload that fails to decode or authenticate is reported as
//! [`DemoError::DecryptionFailed`], whatever the cause.
//!
//! On any error the sequencer falls back to [`DemoStage::Idle`], records
//! [`DemoError::status_message`] as its status and returns the error. There
//! is no automatic retry.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::crypto::{open, seal, SymmetricKey};
use crate::ipfs::{ContentId, MockIpfs, StorageObject};
use crate::license::{LicenseDecision, LicenseGate, LicenseRequest, DEFAULT_LICENSEE};
use crate::storage::SharedStore;
use crate::vault::{KeyRecord, KeyVault, VaultMode};

use super::io::{DeliveryReceipt, DownloadSink, SelectedFile};
use super::stage::{DemoError, DemoEvent, DemoStage};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// What "Encrypt & Upload" hands back to the owner.
///
/// `key_material` is the raw key in base64. It is shown to the owner and
/// later saved as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub content_id: ContentId,
    pub key_material: String,
    pub file_name: String,
    pub mode: VaultMode,
}

/// A successful purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub content_id: ContentId,
    pub receipt: DeliveryReceipt,
}

pub struct DemoSequencer {
    ipfs: MockIpfs,
    vault: KeyVault,
    gate: Arc<dyn LicenseGate>,
    mode: VaultMode,
    licensee: String,
    stage: DemoStage,
    status: String,
    selected: Option<SelectedFile>,
    last_upload: Option<UploadReceipt>,
    events: broadcast::Sender<DemoEvent>,
}

impl DemoSequencer {
    pub fn new(store: SharedStore, gate: Arc<dyn LicenseGate>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            ipfs: MockIpfs::new(Arc::clone(&store)),
            vault: KeyVault::new(store),
            gate,
            mode: VaultMode::default(),
            licensee: DEFAULT_LICENSEE.to_string(),
            stage: DemoStage::Idle,
            status: String::new(),
            selected: None,
            last_upload: None,
            events,
        }
    }

    pub fn with_mode(mut self, mode: VaultMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_licensee(mut self, licensee: impl Into<String>) -> Self {
        self.licensee = licensee.into();
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DemoEvent> {
        self.events.subscribe()
    }

    pub fn stage(&self) -> &DemoStage {
        &self.stage
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn mode(&self) -> VaultMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: VaultMode) {
        self.mode = mode;
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn last_upload(&self) -> Option<&UploadReceipt> {
        self.last_upload.as_ref()
    }

    pub fn vault(&self) -> &KeyVault {
        &self.vault
    }

    pub fn ipfs(&self) -> &MockIpfs {
        &self.ipfs
    }

    /// Back to a blank slate. Stored data is untouched.
    pub fn reset(&mut self) {
        self.selected = None;
        self.last_upload = None;
        self.transition(DemoStage::Idle, "");
    }

    /// Pick the file to upload. Replaces any previous selection.
    pub fn select_file(&mut self, file: SelectedFile) {
        let status = format!("Selected {} ({} bytes)", file.name, file.len());
        self.selected = Some(file);
        self.transition(DemoStage::FileSelected, status);
    }

    /// Seal the selected file under a fresh key and pin it to mock IPFS.
    pub fn encrypt_and_upload(&mut self) -> Result<UploadReceipt, DemoError> {
        let outcome = self.run_encrypt_and_upload();
        outcome.map_err(|e| self.fail(e))
    }

    fn run_encrypt_and_upload(&mut self) -> Result<UploadReceipt, DemoError> {
        let file = self.selected.clone().ok_or(DemoError::NoFileSelected)?;

        self.transition(DemoStage::Encrypting, "Encrypting...");
        let key = SymmetricKey::generate();
        let sealed = seal(&key, &file.bytes).map_err(DemoError::Encryption)?;

        self.transition(DemoStage::Uploading, "Uploading to mock IPFS...");
        let object = StorageObject::from_sealed(&sealed, file.name.clone());
        let cid = self.ipfs.put(&object)?;

        let receipt = UploadReceipt {
            content_id: cid.clone(),
            key_material: key.export_base64(),
            file_name: file.name.clone(),
            mode: self.mode,
        };
        self.last_upload = Some(receipt.clone());

        info!(%cid, file = %file.name, bytes = file.len(), mode = %self.mode, "file sealed and uploaded");
        self.transition(DemoStage::Uploaded(cid.clone()), format!("Uploaded. CID: {cid}"));
        Ok(receipt)
    }

    /// Append a key record to the vault. Duplicates are kept.
    pub fn save_key(
        &mut self,
        key_material: &str,
        content_id: &ContentId,
        file_name: &str,
        mode: VaultMode,
    ) -> Result<KeyRecord, DemoError> {
        let record = KeyRecord::new(content_id.clone(), key_material, file_name, mode);
        match self.vault.save(record.clone()) {
            Ok(count) => {
                info!(cid = %content_id, records = count, "key saved to vault");
                self.transition(DemoStage::KeySaved, "Key saved to vault.");
                Ok(record)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Save the key from the most recent upload in this session.
    pub fn save_last_key(&mut self) -> Result<KeyRecord, DemoError> {
        let receipt = match self.last_upload.clone() {
            Some(r) => r,
            None => return Err(self.fail(DemoError::NothingUploaded)),
        };
        self.save_key(
            &receipt.key_material,
            &receipt.content_id,
            &receipt.file_name,
            receipt.mode,
        )
    }

    /// Check the license, fetch key and payload, decrypt, and hand the
    /// plaintext to `sink` under its original file name.
    pub async fn buy_and_download(
        &mut self,
        content_id: &ContentId,
        sink: &mut dyn DownloadSink,
    ) -> Result<Delivery, DemoError> {
        let outcome = self.run_buy_and_download(content_id, sink).await;
        outcome.map_err(|e| self.fail(e))
    }

    async fn run_buy_and_download(
        &mut self,
        content_id: &ContentId,
        sink: &mut dyn DownloadSink,
    ) -> Result<Delivery, DemoError> {
        self.transition(DemoStage::LicenseChecking, "Checking license...");
        let request =
            LicenseRequest::new(content_id.clone(), self.mode).with_licensee(self.licensee.clone());
        if let LicenseDecision::Denied { reason } = self.gate.check(&request).await? {
            return Err(DemoError::LicenseDenied { reason });
        }
        self.transition(DemoStage::LicenseGranted, "License OK.");

        let record = self
            .vault
            .find(content_id)?
            .ok_or_else(|| DemoError::AccessDenied(content_id.clone()))?;
        let key = SymmetricKey::import_base64(&record.key_material).map_err(DemoError::InvalidKey)?;

        let object = self
            .ipfs
            .get(content_id)?
            .ok_or_else(|| DemoError::PayloadNotFound(content_id.clone()))?;

        self.transition(DemoStage::Decrypting, "Decrypting...");
        // A mangled payload reads the same as a wrong key.
        let nonce = object.nonce_bytes().map_err(|_| DemoError::DecryptionFailed)?;
        let ciphertext = object
            .ciphertext_bytes()
            .map_err(|_| DemoError::DecryptionFailed)?;
        let plaintext = open(&key, &nonce, &ciphertext).map_err(|_| DemoError::DecryptionFailed)?;

        let receipt = sink.deliver(&object.name, &plaintext).await?;
        info!(cid = %content_id, file = %object.name, bytes = plaintext.len(), "file delivered");
        self.transition(DemoStage::Delivered, format!("Delivered {}.", object.name));

        Ok(Delivery {
            content_id: content_id.clone(),
            receipt,
        })
    }

    fn transition(&mut self, stage: DemoStage, status: impl Into<String>) {
        self.stage = stage;
        self.status = status.into();
        tracing::debug!(stage = %self.stage, status = %self.status, "demo stage changed");
        let _ = self.events.send(DemoEvent::StageChanged {
            stage: self.stage.clone(),
            status: self.status.clone(),
        });
    }

    fn fail(&mut self, error: DemoError) -> DemoError {
        warn!(error = %error, stage = %self.stage, "demo operation failed");
        self.transition(DemoStage::Idle, error.status_message());
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::io::MemorySink;
    use crate::license::SimulatedLicenseGate;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::time::Duration;

    fn sequencer() -> (DemoSequencer, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let gate = Arc::new(SimulatedLicenseGate::new(Duration::from_millis(800)));
        (DemoSequencer::new(store.clone(), gate), store)
    }

    #[test]
    fn test_upload_without_file_reports_status() {
        let (mut seq, store) = sequencer();
        let err = seq.encrypt_and_upload().unwrap_err();
        assert!(matches!(err, DemoError::NoFileSelected));
        assert_eq!(seq.stage(), &DemoStage::Idle);
        assert_eq!(seq.status(), "Please select a file first.");
        assert!(store.is_empty());
    }

    #[test]
    fn test_upload_walks_stages_in_order() {
        let (mut seq, _) = sequencer();
        let mut rx = seq.subscribe();

        seq.select_file(SelectedFile::new("a.txt", b"hello".to_vec()));
        let receipt = seq.encrypt_and_upload().unwrap();

        let stages: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|DemoEvent::StageChanged { stage, .. }| stage.name().to_string())
            .collect();
        assert_eq!(
            stages,
            vec!["file_selected", "encrypting", "uploading", "uploaded"]
        );
        assert_eq!(seq.stage(), &DemoStage::Uploaded(receipt.content_id.clone()));
        assert_eq!(seq.last_upload(), Some(&receipt));
    }

    #[test]
    fn test_upload_stores_ciphertext_not_plaintext() {
        let (mut seq, store) = sequencer();
        seq.select_file(SelectedFile::new("secret.txt", b"top secret formula".to_vec()));
        let receipt = seq.encrypt_and_upload().unwrap();

        let object = seq.ipfs().get(&receipt.content_id).unwrap().unwrap();
        assert_eq!(object.name, "secret.txt");
        let ct = object.ciphertext_bytes().unwrap();
        assert_ne!(&ct[..18], b"top secret formula");

        // Nothing is written to the vault until the key is saved.
        assert!(store.get(crate::config::KEY_VAULT_STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_save_last_key_requires_upload() {
        let (mut seq, _) = sequencer();
        assert!(matches!(
            seq.save_last_key(),
            Err(DemoError::NothingUploaded)
        ));
        assert_eq!(seq.stage(), &DemoStage::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_flow_delivers_original_bytes() {
        let (mut seq, _) = sequencer();
        let original = b"0123456789".to_vec();

        seq.select_file(SelectedFile::new("ten.bin", original.clone()));
        let receipt = seq.encrypt_and_upload().unwrap();
        seq.save_last_key().unwrap();
        assert_eq!(seq.stage(), &DemoStage::KeySaved);

        let mut sink = MemorySink::new();
        let delivery = seq
            .buy_and_download(&receipt.content_id, &mut sink)
            .await
            .unwrap();

        assert_eq!(seq.stage(), &DemoStage::Delivered);
        assert_eq!(delivery.receipt.bytes, 10);
        assert_eq!(sink.last().unwrap(), &("ten.bin".to_string(), original));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_cid_is_access_denied() {
        let (mut seq, _) = sequencer();
        let mut sink = MemorySink::new();

        let err = seq
            .buy_and_download(&ContentId::new("bafyneveruploaded"), &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, DemoError::AccessDenied(_)));
        assert_eq!(seq.stage(), &DemoStage::Idle);
        assert!(seq.status().starts_with("Access denied"));
        assert!(sink.deliveries.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_without_payload_is_payload_not_found() {
        let (mut seq, _) = sequencer();
        let cid = ContentId::new("bafyorphan");
        seq.save_key(
            &SymmetricKey::generate().export_base64(),
            &cid,
            "ghost.txt",
            VaultMode::Vault,
        )
        .unwrap();

        let mut sink = MemorySink::new();
        let err = seq.buy_and_download(&cid, &mut sink).await.unwrap_err();
        assert!(matches!(err, DemoError::PayloadNotFound(_)));
        assert_eq!(seq.status(), "Payload not found.");
        assert!(sink.deliveries.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_key_fails_decryption() {
        let (mut seq, _) = sequencer();
        seq.select_file(SelectedFile::new("a.txt", b"payload".to_vec()));
        let receipt = seq.encrypt_and_upload().unwrap();

        // Save an unrelated key for the real upload.
        let wrong = SymmetricKey::generate().export_base64();
        seq.save_key(&wrong, &receipt.content_id, "a.txt", VaultMode::Vault)
            .unwrap();

        let mut sink = MemorySink::new();
        let err = seq
            .buy_and_download(&receipt.content_id, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, DemoError::DecryptionFailed));
        assert_eq!(
            seq.status(),
            "Decryption failed: wrong key or condition not met."
        );
        assert!(sink.deliveries.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_saved_key_wins() {
        let (mut seq, _) = sequencer();
        seq.select_file(SelectedFile::new("a.txt", b"payload".to_vec()));
        let receipt = seq.encrypt_and_upload().unwrap();

        let wrong = SymmetricKey::generate().export_base64();
        seq.save_key(&wrong, &receipt.content_id, "a.txt", VaultMode::Vault)
            .unwrap();
        seq.save_last_key().unwrap();
        assert_eq!(seq.vault().records().unwrap().len(), 2);

        let mut sink = MemorySink::new();
        seq.buy_and_download(&receipt.content_id, &mut sink)
            .await
            .unwrap();
        assert_eq!(sink.last().unwrap().1, b"payload");
    }

    #[tokio::test(start_paused = true)]
    async fn test_garbage_key_material_is_invalid_key() {
        let (mut seq, _) = sequencer();
        seq.select_file(SelectedFile::new("a.txt", b"payload".to_vec()));
        let receipt = seq.encrypt_and_upload().unwrap();
        seq.save_key("not-a-key", &receipt.content_id, "a.txt", VaultMode::Vault)
            .unwrap();

        let mut sink = MemorySink::new();
        let err = seq
            .buy_and_download(&receipt.content_id, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, DemoError::InvalidKey(_)));
    }

    #[test]
    fn test_quota_failure_resets_to_idle() {
        let store = Arc::new(MemoryStore::with_quota(64));
        let gate = Arc::new(SimulatedLicenseGate::default());
        let mut seq = DemoSequencer::new(store, gate);

        seq.select_file(SelectedFile::new("big.bin", vec![0u8; 1024]));
        let err = seq.encrypt_and_upload().unwrap_err();
        assert!(matches!(err, DemoError::Ipfs(_)));
        assert_eq!(seq.stage(), &DemoStage::Idle);
        assert!(seq.status().contains("quota"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mangled_ciphertext_reads_as_decryption_failure() {
        let (mut seq, store) = sequencer();
        seq.select_file(SelectedFile::new("a.txt", b"payload".to_vec()));
        let receipt = seq.encrypt_and_upload().unwrap();
        seq.save_last_key().unwrap();

        let mut object = seq.ipfs().get(&receipt.content_id).unwrap().unwrap();
        object.ct.insert(3, '!');
        store
            .set(&MockIpfs::storage_key(&receipt.content_id), &object.encode().unwrap())
            .unwrap();

        let mut sink = MemorySink::new();
        let err = seq
            .buy_and_download(&receipt.content_id, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, DemoError::DecryptionFailed));
        assert_eq!(
            seq.status(),
            "Decryption failed: wrong key or condition not met."
        );
        assert!(sink.deliveries.is_empty());
    }

    #[test]
    fn test_reset_clears_session() {
        let (mut seq, _) = sequencer();
        seq.set_mode(VaultMode::Tee);
        seq.select_file(SelectedFile::new("a.txt", b"payload".to_vec()));
        assert_eq!(seq.selected_file().unwrap().name, "a.txt");
        let receipt = seq.encrypt_and_upload().unwrap();
        assert_eq!(receipt.mode, VaultMode::Tee);

        let mut rx = seq.subscribe();
        seq.reset();

        assert!(seq.selected_file().is_none());
        assert!(seq.last_upload().is_none());
        assert_eq!(seq.stage(), &DemoStage::Idle);
        assert_eq!(seq.status(), "");
        assert_eq!(seq.mode(), VaultMode::Tee);
        assert_eq!(
            rx.try_recv().unwrap(),
            DemoEvent::StageChanged {
                stage: DemoStage::Idle,
                status: String::new(),
            }
        );
        // Stored data outlives the session.
        assert_eq!(seq.ipfs().list().unwrap().len(), 1);
        assert!(matches!(
            seq.save_last_key(),
            Err(DemoError::NothingUploaded)
        ));
    }

    #[test]
    fn test_restart_overwrites_previous_upload() {
        let (mut seq, _) = sequencer();
        seq.select_file(SelectedFile::new("a.txt", b"first".to_vec()));
        let first = seq.encrypt_and_upload().unwrap();
        seq.select_file(SelectedFile::new("b.txt", b"second".to_vec()));
        assert_eq!(seq.stage(), &DemoStage::FileSelected);
        let second = seq.encrypt_and_upload().unwrap();

        assert_ne!(first.content_id, second.content_id);
        assert_eq!(seq.last_upload().unwrap().file_name, "b.txt");
        assert_eq!(seq.ipfs().list().unwrap().len(), 2);
    }
}
