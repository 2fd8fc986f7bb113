//! # AES-256-GCM Sealing
//!
//! Authenticated encryption for uploaded IP. The whole file is sealed in a
//! single AEAD call, so the output is `ciphertext || tag` with the 16-byte
//! GCM tag appended by `aes-gcm`. No chunking, no streaming: the demo keeps
//! the entire payload in memory.
//!
//! ## Keys
//!
//! Every upload gets a fresh [`SymmetricKey`] from the OS CSPRNG. The key
//! can be exported as base64 so the caller can show it or park it in the key
//! vault. It is exported in the clear. That is a demo simplification; a real
//! vault would wrap it before it ever left this module.
//!
//! ## Nonces
//!
//! Random 96-bit nonces, one per seal. Since each key seals exactly one
//! payload, nonce reuse under the same key cannot happen in this flow.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use thiserror::Error;

use crate::config::{AES_KEY_LENGTH, AES_NONCE_LENGTH};

/// Errors that can occur during sealing and opening.
///
/// Kept vague on purpose: a wrong key and a tampered ciphertext both come
/// back as [`EncryptionError::DecryptFailed`].
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("encryption failed")]
    EncryptFailed,

    #[error("decryption failed -- wrong key or corrupted ciphertext")]
    DecryptFailed,

    #[error("invalid key length: expected {AES_KEY_LENGTH} bytes")]
    InvalidKeyLength,

    #[error("invalid nonce length: expected {AES_NONCE_LENGTH} bytes")]
    InvalidNonceLength,

    #[error("key material is not valid base64")]
    InvalidKeyEncoding,
}

/// A raw AES-256 key.
///
/// `Debug` never prints the key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; AES_KEY_LENGTH]);

impl SymmetricKey {
    /// Generate a fresh key from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; AES_KEY_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap existing key bytes.
    pub fn from_bytes(bytes: [u8; AES_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Build a key from a slice of unknown length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EncryptionError> {
        let arr: [u8; AES_KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| EncryptionError::InvalidKeyLength)?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; AES_KEY_LENGTH] {
        &self.0
    }

    /// Export the raw key as standard base64.
    pub fn export_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Import a key previously produced by [`SymmetricKey::export_base64`].
    pub fn import_base64(encoded: &str) -> Result<Self, EncryptionError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| EncryptionError::InvalidKeyEncoding)?;
        Self::from_slice(&bytes)
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// Output of [`seal`]: the nonce plus `ciphertext || tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub nonce: [u8; AES_NONCE_LENGTH],
    pub ciphertext: Vec<u8>,
}

/// Draw a random 96-bit nonce.
pub fn generate_nonce() -> [u8; AES_NONCE_LENGTH] {
    let mut nonce = [0u8; AES_NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Seal `plaintext` under `key` with a fresh random nonce.
///
/// Any length is accepted, including zero: an empty plaintext seals to a
/// bare 16-byte tag.
///
/// ```
/// use ipvault_protocol::crypto::encryption::{open, seal, SymmetricKey};
///
/// let key = SymmetricKey::generate();
/// let sealed = seal(&key, b"chapter one").unwrap();
/// let recovered = open(&key, &sealed.nonce, &sealed.ciphertext).unwrap();
/// assert_eq!(recovered, b"chapter one");
/// ```
pub fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Result<SealedPayload, EncryptionError> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| EncryptionError::EncryptFailed)?;

    let nonce_bytes = generate_nonce();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| EncryptionError::EncryptFailed)?;

    Ok(SealedPayload {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Open a payload produced by [`seal`].
///
/// # Errors
///
/// [`EncryptionError::DecryptFailed`] for a wrong key, a wrong nonce, or any
/// modification of the ciphertext or tag. The cases are not distinguished.
pub fn open(
    key: &SymmetricKey,
    nonce: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    if nonce.len() != AES_NONCE_LENGTH {
        return Err(EncryptionError::InvalidNonceLength);
    }

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| EncryptionError::DecryptFailed)?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| EncryptionError::DecryptFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AES_TAG_LENGTH;

    fn test_key() -> SymmetricKey {
        let mut key = [0u8; 32];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        SymmetricKey::from_bytes(key)
    }

    #[test]
    fn test_seal_open_roundtrip_various_lengths() {
        let key = SymmetricKey::generate();
        for len in [0usize, 1, 10, 15, 16, 17, 4096, 65_537] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let sealed = seal(&key, &plaintext).unwrap();
            assert_eq!(sealed.ciphertext.len(), len + AES_TAG_LENGTH);
            let recovered = open(&key, &sealed.nonce, &sealed.ciphertext).unwrap();
            assert_eq!(recovered, plaintext, "length {len}");
        }
    }

    #[test]
    fn test_wrong_key_never_yields_plaintext() {
        let key = test_key();
        let sealed = seal(&key, b"licensed manuscript").unwrap();

        let mut wrong = *key.as_bytes();
        wrong[31] ^= 0x01;
        let wrong = SymmetricKey::from_bytes(wrong);

        assert!(matches!(
            open(&wrong, &sealed.nonce, &sealed.ciphertext),
            Err(EncryptionError::DecryptFailed)
        ));
        // A completely unrelated key fails the same way.
        assert!(open(&SymmetricKey::generate(), &sealed.nonce, &sealed.ciphertext).is_err());
    }

    #[test]
    fn test_tampered_tag_fails() {
        let key = test_key();
        let mut sealed = seal(&key, b"secret").unwrap();
        let last = sealed.ciphertext.len() - 1;
        sealed.ciphertext[last] ^= 0xFF;
        assert!(open(&key, &sealed.nonce, &sealed.ciphertext).is_err());
    }

    #[test]
    fn test_bad_nonce_length_rejected() {
        let key = test_key();
        let sealed = seal(&key, b"secret").unwrap();
        assert!(matches!(
            open(&key, &sealed.nonce[..8], &sealed.ciphertext),
            Err(EncryptionError::InvalidNonceLength)
        ));
    }

    #[test]
    fn test_unique_nonces() {
        let key = test_key();
        let a = seal(&key, b"message").unwrap();
        let b = seal(&key, b"message").unwrap();
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn test_key_export_import_roundtrip() {
        let key = SymmetricKey::generate();
        let exported = key.export_base64();
        assert_eq!(SymmetricKey::import_base64(&exported).unwrap(), key);
    }

    #[test]
    fn test_import_rejects_garbage() {
        assert!(matches!(
            SymmetricKey::import_base64("not base64 at all!"),
            Err(EncryptionError::InvalidKeyEncoding)
        ));
        // Valid base64, but only 16 bytes.
        let short = STANDARD.encode([7u8; 16]);
        assert!(matches!(
            SymmetricKey::import_base64(&short),
            Err(EncryptionError::InvalidKeyLength)
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", test_key());
        assert_eq!(rendered, "SymmetricKey(<redacted>)");
    }
}
