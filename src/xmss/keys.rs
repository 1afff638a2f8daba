// Private key state and key pairs

use std::sync::Arc;

use zeroize::Zeroizing;

use super::error::{Result, XmssError};
use super::hash::Hash;
use super::merkle::MerkleTree;
pub use xmss_types::{PublicKey, Signature};

/// A built tree together with the fingerprint of the scheme that built it.
#[derive(Clone)]
struct CachedTree {
    scheme_id: Hash,
    tree: Arc<MerkleTree>,
}

/// Private key of one tree: the seed plus the leaf counter.
///
/// `used_leaves` only moves forward, and only through signing. The built
/// tree is cached alongside the seed it was derived from, tagged with the
/// scheme that built it. `expected_root` is the public root the key was
/// issued under, when known; a rebuilt tree must reproduce it.
#[derive(Clone)]
pub struct PrivateKey {
    seed: Zeroizing<Hash>,
    height: u32,
    max_leaves: u32,
    used_leaves: u32,
    expected_root: Option<Hash>,
    tree: Option<CachedTree>,
}

impl PrivateKey {
    pub(crate) fn new(seed: Zeroizing<Hash>, height: u32) -> Self {
        Self {
            seed,
            height,
            max_leaves: 1 << height,
            used_leaves: 0,
            expected_root: None,
            tree: None,
        }
    }

    /// Restore a key from stored parts, checking the counter invariants.
    pub(crate) fn restore(
        seed: Zeroizing<Hash>,
        height: u32,
        max_leaves: u32,
        used_leaves: u32,
    ) -> Result<Self> {
        super::config::validate_height(height)?;
        if max_leaves != 1 << height {
            return Err(XmssError::InvalidKeyState {
                reason: format!(
                    "max_leaves {} does not match height {} (expected {})",
                    max_leaves,
                    height,
                    1u32 << height
                ),
            });
        }
        if used_leaves > max_leaves {
            return Err(XmssError::InvalidKeyState {
                reason: format!(
                    "used_leaves {} exceeds max_leaves {}",
                    used_leaves, max_leaves
                ),
            });
        }
        Ok(Self {
            seed,
            height,
            max_leaves,
            used_leaves,
            expected_root: None,
            tree: None,
        })
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn max_leaves(&self) -> u32 {
        self.max_leaves
    }

    pub fn used_leaves(&self) -> u32 {
        self.used_leaves
    }

    pub fn remaining(&self) -> u32 {
        self.max_leaves - self.used_leaves
    }

    pub fn is_exhausted(&self) -> bool {
        self.used_leaves >= self.max_leaves
    }

    pub(crate) fn seed(&self) -> &Hash {
        &self.seed
    }

    pub(crate) fn cached_tree(&self) -> Option<&Arc<MerkleTree>> {
        self.tree.as_ref().map(|cached| &cached.tree)
    }

    /// Fingerprint of the scheme that built the cached tree.
    pub(crate) fn cached_scheme(&self) -> Option<&Hash> {
        self.tree.as_ref().map(|cached| &cached.scheme_id)
    }

    pub(crate) fn set_cached_tree(&mut self, scheme_id: Hash, tree: Arc<MerkleTree>) {
        self.tree = Some(CachedTree { scheme_id, tree });
    }

    /// Record the root of a freshly issued key.
    pub(crate) fn issued_under(mut self, root: Hash) -> Self {
        self.expected_root = Some(root);
        self
    }

    pub(crate) fn expected_root(&self) -> Option<&Hash> {
        self.expected_root.as_ref()
    }

    /// Pin the root this key was issued under.
    ///
    /// Fails if the key is already pinned to, or holds a cached tree for,
    /// a different root.
    pub(crate) fn bind_root(&mut self, root: Hash) -> Result<()> {
        let known = self
            .expected_root
            .or_else(|| self.cached_tree().map(|tree| tree.root()));
        if let Some(known) = known {
            if known != root {
                return Err(XmssError::InvalidKeyState {
                    reason: "private key belongs to a different public root".to_string(),
                });
            }
        }
        self.expected_root = Some(root);
        Ok(())
    }

    /// Index the next signature will use, or `KeysExhausted`.
    pub(crate) fn next_leaf(&self) -> Result<u32> {
        if self.is_exhausted() {
            return Err(XmssError::KeysExhausted {
                used: self.used_leaves,
                max: self.max_leaves,
            });
        }
        Ok(self.used_leaves)
    }

    /// Record that `leaf_index` has been consumed.
    pub(crate) fn mark_used(&mut self, leaf_index: u32) {
        debug_assert_eq!(leaf_index, self.used_leaves);
        self.used_leaves = leaf_index + 1;
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("seed", &"<redacted>")
            .field("height", &self.height)
            .field("max_leaves", &self.max_leaves)
            .field("used_leaves", &self.used_leaves)
            .field("root_bound", &self.expected_root.is_some())
            .field("tree_cached", &self.tree.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}
