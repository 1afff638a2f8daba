#![cfg_attr(not(feature = "std"), no_std)]

use serde::{Deserialize, Serialize};

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Width of every hash value, seed and root in bytes.
pub const HASH_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub leaf_index: u32,
    pub auth_path: Vec<[u8; HASH_LEN]>,  // leaf -> root, one sibling per level
    pub ots_signature: Vec<[u8; HASH_LEN]>,  // one value per WOTS+ chain
    pub public_root: [u8; HASH_LEN],  // root of the signing tree, not trusted on its own
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    pub root: [u8; HASH_LEN],
    pub height: u32,
}

// Storage form of a private key. `used_leaves` must be persisted together with
// `seed`; resetting it reuses one-time keys.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKeyState {
    pub seed: [u8; HASH_LEN],
    pub height: u32,
    pub max_leaves: u32,
    pub used_leaves: u32,
}

impl core::fmt::Debug for PrivateKeyState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PrivateKeyState")
            .field("seed", &"<redacted>")
            .field("height", &self.height)
            .field("max_leaves", &self.max_leaves)
            .field("used_leaves", &self.used_leaves)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntryState {
    pub public_key: PublicKey,
    pub private_key: PrivateKeyState,
}
