//! # Cryptographic Primitives
//!
//! Thin, typed wrappers over `aes-gcm` and the OS random source. This is the
//! only place in the workspace that touches cipher state directly.
//!
//! The browser version leaned on `crypto.subtle`; here the same five
//! capabilities (generate, export, import, encrypt, decrypt) map onto
//! [`SymmetricKey`] and the [`seal`] / [`open`] pair.

pub mod encryption;

pub use encryption::{open, seal, EncryptionError, SealedPayload, SymmetricKey};
