//! # Storage Module
//!
//! The demo's only shared mutable state is a flat string map. This module
//! defines that map as a trait and ships two backends.
//!
//! ```text
//! kv.rs  - KeyValueStore trait, StorageError, MemoryStore (quota-aware)
//! db.rs  - SledStore, the persistent backend used by the CLI
//! ```
//!
//! Higher layers ([`crate::ipfs::MockIpfs`], [`crate::vault::KeyVault`])
//! share one store through [`SharedStore`] and partition it by key prefix.

use std::sync::Arc;

pub mod db;
pub mod kv;

pub use db::SledStore;
pub use kv::{KeyValueStore, MemoryStore, StorageError, StorageResult};

/// A store handle shared between the mock IPFS layer and the key vault.
pub type SharedStore = Arc<dyn KeyValueStore>;
