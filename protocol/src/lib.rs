// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # IP Vault - Core Library
//!
//! The engine behind the IP Vault demo: an owner encrypts a file, parks the
//! ciphertext on (mock) IPFS, drops the key in a vault, and a buyer walks
//! away with the plaintext once a license check says yes.
//!
//! Nothing here talks to a real network. The "IPFS" is a prefix in a
//! key-value store, the "license check" is a trait with a simulated
//! implementation that sleeps and says yes, and the "vault" is a JSON array.
//! The cryptography, on the other hand, is real: AES-256-GCM with a fresh
//! key and nonce per upload.
//!
//! ## Architecture
//!
//! - **config** - Constants and the runtime-tunable [`config::DemoConfig`].
//! - **crypto** - AES-256-GCM sealing. Don't roll your own.
//! - **storage** - The key-value seam: in-memory (with quota) or sled.
//! - **ipfs** - Pseudo-CIDs and the base64 JSON envelope.
//! - **vault** - Key records, saved append-only.
//! - **license** - The license gate trait and access conditions.
//! - **demo** - The encrypt → store → license → decrypt sequencer.
//! - **walkthrough** - The seven-step guided tour and its autoplay.
//!
//! ## Design Philosophy
//!
//! 1. The demo is a demo. Plaintext keys sit next to the ciphertext.
//! 2. Every failure lands back in a known state with a readable status.
//! 3. Timers are tokio tasks, so tests run on paused time.

pub mod config;
pub mod crypto;
pub mod demo;
pub mod ipfs;
pub mod license;
pub mod storage;
pub mod vault;
pub mod walkthrough;
