//! # Pseudo Content Identifiers
//!
//! The demo labels uploads with something that *looks* like an IPFS CIDv1
//! (`bafy...`) but is just a random base-36 string. It is not derived from
//! the ciphertext, so it gives no deduplication and no integrity check:
//! uploading the same file twice yields two unrelated identifiers.
//!
//! [`generate_pseudo_id`] is deliberately the only constructor that mints new
//! identifiers. A real content-addressing scheme would hash the payload and
//! belongs in a different type.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{PSEUDO_CID_PREFIX, PSEUDO_CID_RANDOM_LENGTH};

const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// An identifier for a mock IPFS object.
///
/// Any string is accepted when parsing user input, since a buyer may ask for
/// an identifier that was never uploaded. Lookups then simply miss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier has the shape [`generate_pseudo_id`] produces.
    pub fn is_pseudo(&self) -> bool {
        self.0
            .strip_prefix(PSEUDO_CID_PREFIX)
            .map(|rest| {
                rest.len() == PSEUDO_CID_RANDOM_LENGTH
                    && rest.bytes().all(|b| BASE36_ALPHABET.contains(&b))
            })
            .unwrap_or(false)
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Mint a fresh random identifier: `bafy` followed by 32 base-36 characters.
pub fn generate_pseudo_id() -> ContentId {
    let mut rng = rand::thread_rng();
    let mut id = String::with_capacity(PSEUDO_CID_PREFIX.len() + PSEUDO_CID_RANDOM_LENGTH);
    id.push_str(PSEUDO_CID_PREFIX);
    for _ in 0..PSEUDO_CID_RANDOM_LENGTH {
        let idx = rng.gen_range(0..BASE36_ALPHABET.len());
        id.push(BASE36_ALPHABET[idx] as char);
    }
    ContentId(id)
}
