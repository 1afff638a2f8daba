// XMSS signing scheme and the single-tree stateful signer

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::config::{ParameterSet, SchemeConfig};
use super::error::{Result, XmssError};
use super::hash::{hash, DomainTags, Hash};
use super::keys::{KeyPair, PrivateKey, PublicKey, Signature};
use super::merkle::{verify_path, MerkleTree};
use super::wots::{Winternitz, Wots, WotsParams};

/// One parameterised XMSS instance: Winternitz base, tree height, domain
/// tags, optional tweak seed and tree cache policy.
///
/// The scheme itself holds no key state and is safe to share across threads.
#[derive(Debug, Clone)]
pub struct XmssScheme {
    config: SchemeConfig,
    tags: DomainTags,
    wots: Wots,
    fingerprint: Hash,
}

impl XmssScheme {
    /// Create a scheme from a validated configuration
    ///
    /// Preconditions:
    /// - config.height within 1..=20
    ///
    /// Postconditions:
    /// - Hashes under the default domain tags
    pub fn new(config: SchemeConfig) -> Result<Self> {
        Self::with_domain_tags(config, DomainTags::DEFAULT)
    }

    pub fn from_parameter_set(params: ParameterSet) -> Result<Self> {
        Self::new(params.scheme_config())
    }

    /// Create a scheme hashing under a custom tag set.
    pub fn with_domain_tags(config: SchemeConfig, tags: DomainTags) -> Result<Self> {
        config.validate()?;
        let wots = Wots::new(WotsParams::new(config.winternitz), tags, config.tweak);
        let fingerprint = scheme_fingerprint(&config, &tags);
        Ok(Self {
            config,
            tags,
            wots,
            fingerprint,
        })
    }

    pub fn config(&self) -> &SchemeConfig {
        &self.config
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn winternitz(&self) -> Winternitz {
        self.config.winternitz
    }

    /// Number of WOTS+ chains per one-time signature.
    pub fn chain_len(&self) -> usize {
        self.wots.params().len()
    }

    pub fn max_leaves(&self) -> u32 {
        1 << self.config.height
    }

    pub fn domain_tags(&self) -> &DomainTags {
        &self.tags
    }

    pub fn wots(&self) -> &Wots {
        &self.wots
    }

    /// Identifies everything that shapes the tree built from a seed.
    pub fn fingerprint(&self) -> &Hash {
        &self.fingerprint
    }

    /// Generate a fresh key pair from the OS entropy source
    ///
    /// Postconditions:
    /// - Private key has used_leaves = 0 and max_leaves = 2^height
    /// - Public key root is the root of the tree built from the new seed
    pub fn generate_key_pair(&self) -> Result<KeyPair> {
        self.generate_key_pair_with_rng(&mut OsRng)
    }

    pub fn generate_key_pair_with_rng<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<KeyPair> {
        let mut seed = Zeroizing::new([0u8; 32]);
        rng.try_fill_bytes(&mut seed[..])?;
        Ok(self.key_pair_from_secret(seed))
    }

    /// Deterministic key generation from a caller-supplied seed.
    pub fn key_pair_from_seed(&self, seed: Hash) -> KeyPair {
        self.key_pair_from_secret(Zeroizing::new(seed))
    }

    fn key_pair_from_secret(&self, seed: Zeroizing<Hash>) -> KeyPair {
        let tree = self.build_tree(&seed);
        let public_key = PublicKey {
            root: tree.root(),
            height: self.config.height,
        };
        let mut private_key = PrivateKey::new(seed, self.config.height).issued_under(public_key.root);
        if self.config.cache_trees {
            private_key.set_cached_tree(self.fingerprint, Arc::new(tree));
        }
        info!(
            height = self.config.height,
            winternitz = self.config.winternitz.value(),
            max_leaves = self.max_leaves(),
            "generated XMSS key pair"
        );
        KeyPair {
            public_key,
            private_key,
        }
    }

    /// Build the full tree for `seed`; leaves are derived in parallel.
    pub fn build_tree(&self, seed: &Hash) -> MerkleTree {
        MerkleTree::build(self.tags.tree, self.config.height, |i| self.wots.leaf(seed, i))
    }

    /// Sign message with the next unused leaf of `key`
    ///
    /// Preconditions:
    /// - message is non-empty
    /// - key was generated for this scheme's height
    ///
    /// Postconditions:
    /// - key.used_leaves is incremented by exactly one
    /// - Returned signature carries the tree root and a height-long auth path
    ///
    /// Invariants:
    /// - A leaf index is never handed out twice for the same key
    pub fn sign(&self, key: &mut PrivateKey, message: &[u8]) -> Result<Signature> {
        if message.is_empty() {
            return Err(XmssError::EmptyMessage);
        }
        if key.height() != self.config.height {
            return Err(XmssError::InvalidKeyState {
                reason: format!(
                    "key height {} does not match scheme height {}",
                    key.height(),
                    self.config.height
                ),
            });
        }
        let leaf_index = key.next_leaf()?;
        let tree = self.tree_for(key)?;
        let auth_path = tree
            .auth_path(leaf_index)
            .ok_or_else(|| XmssError::InvalidKeyState {
                reason: format!("leaf {} outside tree of height {}", leaf_index, tree.height()),
            })?;

        let leaf_seed = self.wots.leaf_seed(key.seed(), leaf_index);
        let digest = self.wots.message_digest(message);
        let ots_signature = self.wots.sign_digest(&leaf_seed, &digest);
        key.mark_used(leaf_index);

        if key.is_exhausted() {
            warn!(
                leaf_index,
                max_leaves = key.max_leaves(),
                "XMSS key exhausted after this signature"
            );
        } else {
            debug!(leaf_index, remaining = key.remaining(), "signed message");
        }

        Ok(Signature {
            leaf_index,
            auth_path,
            ots_signature,
            public_root: tree.root(),
        })
    }

    /// Tree for `key`: the cached one if this scheme built it, else a rebuild.
    ///
    /// A cache from another scheme, or a rebuild that misses the root the key
    /// was issued under, is `InvalidKeyState`; no leaf is consumed.
    fn tree_for(&self, key: &mut PrivateKey) -> Result<Arc<MerkleTree>> {
        if let Some(scheme_id) = key.cached_scheme() {
            if *scheme_id != self.fingerprint {
                return Err(XmssError::InvalidKeyState {
                    reason: "cached tree was built by a different scheme configuration"
                        .to_string(),
                });
            }
        }
        if let Some(tree) = key.cached_tree() {
            return Ok(Arc::clone(tree));
        }

        let tree = Arc::new(self.build_tree(key.seed()));
        if let Some(expected) = key.expected_root() {
            if *expected != tree.root() {
                return Err(XmssError::InvalidKeyState {
                    reason: "rebuilt tree root does not match the key's public root".to_string(),
                });
            }
        }
        if self.config.cache_trees {
            key.set_cached_tree(self.fingerprint, Arc::clone(&tree));
        }
        Ok(tree)
    }

    /// Verify a signature against a trusted public key.
    ///
    /// Malformed signatures verify as `false`; this never panics on
    /// attacker-controlled input.
    pub fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        let height = public_key.height;
        if message.is_empty() || height == 0 || height > super::config::MAX_HEIGHT {
            return false;
        }
        if signature.ots_signature.len() != self.chain_len()
            || signature.auth_path.len() != height as usize
            || signature.leaf_index >= (1u32 << height)
        {
            return false;
        }
        // The embedded root is only a hint; the trusted key decides.
        if signature.public_root != public_key.root {
            return false;
        }

        let digest = self.wots.message_digest(message);
        let public_chains = match self
            .wots
            .recover_public_chains(&digest, &signature.ots_signature)
        {
            Some(chains) => chains,
            None => return false,
        };
        let leaf = self.wots.leaf_hash(&public_chains);
        verify_path(
            self.tags.tree,
            &leaf,
            signature.leaf_index,
            &signature.auth_path,
            &public_key.root,
        )
    }

    pub fn remaining_signatures(&self, key: &PrivateKey) -> u32 {
        key.remaining()
    }
}

/// SHA-256 over every parameter that changes the tree built from a seed.
/// The cache policy is excluded.
fn scheme_fingerprint(config: &SchemeConfig, tags: &DomainTags) -> Hash {
    let mut buf = Vec::with_capacity(128);
    buf.extend_from_slice(&config.winternitz.value().to_be_bytes());
    buf.extend_from_slice(&config.height.to_be_bytes());
    match &config.tweak {
        Some(tweak) => {
            buf.push(1);
            buf.extend_from_slice(tweak);
        }
        None => buf.push(0),
    }
    for tag in [tags.ots, tags.chain, tags.leaf, tags.tree, tags.msg, tags.prf] {
        buf.push(tag.len() as u8);
        buf.extend_from_slice(tag);
    }
    hash(b"scheme", &[buf.as_slice()])
}

/// Lifecycle of a single-tree signer. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerState {
    Uninitialized,
    Active { used_leaves: u32, max_leaves: u32 },
    Exhausted { max_leaves: u32 },
}

/// Stateful signer over one tree.
///
/// Not synchronised; share it through a `KeyManager` or keep one per thread.
#[derive(Debug)]
pub struct TreeSigner {
    scheme: Arc<XmssScheme>,
    key: Option<KeyPair>,
}

impl TreeSigner {
    /// A signer with no key loaded.
    pub fn new(scheme: Arc<XmssScheme>) -> Self {
        Self { scheme, key: None }
    }

    /// A signer with a freshly generated key.
    pub fn generate(scheme: Arc<XmssScheme>) -> Result<Self> {
        let mut signer = Self::new(scheme);
        signer.initialize()?;
        Ok(signer)
    }

    /// Load a restored key pair, rejecting one that does not belong to this scheme.
    pub fn from_key_pair(scheme: Arc<XmssScheme>, mut pair: KeyPair) -> Result<Self> {
        if pair.private_key.height() != scheme.height()
            || pair.public_key.height != scheme.height()
        {
            return Err(XmssError::InvalidKeyState {
                reason: format!(
                    "key pair height {}/{} does not match scheme height {}",
                    pair.public_key.height,
                    pair.private_key.height(),
                    scheme.height()
                ),
            });
        }
        pair.private_key.bind_root(pair.public_key.root)?;
        Ok(Self {
            scheme,
            key: Some(pair),
        })
    }

    /// Generate a key if none is loaded; returns the active public key.
    pub fn initialize(&mut self) -> Result<PublicKey> {
        if let Some(pair) = &self.key {
            return Ok(pair.public_key);
        }
        let pair = self.scheme.generate_key_pair()?;
        let public_key = pair.public_key;
        self.key = Some(pair);
        Ok(public_key)
    }

    pub fn state(&self) -> SignerState {
        match &self.key {
            None => SignerState::Uninitialized,
            Some(pair) if pair.private_key.is_exhausted() => SignerState::Exhausted {
                max_leaves: pair.private_key.max_leaves(),
            },
            Some(pair) => SignerState::Active {
                used_leaves: pair.private_key.used_leaves(),
                max_leaves: pair.private_key.max_leaves(),
            },
        }
    }

    pub fn scheme(&self) -> &XmssScheme {
        &self.scheme
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.key.as_ref().map(|pair| &pair.public_key)
    }

    pub fn private_key(&self) -> Option<&PrivateKey> {
        self.key.as_ref().map(|pair| &pair.private_key)
    }

    pub fn key_pair(&self) -> Option<&KeyPair> {
        self.key.as_ref()
    }

    pub fn sign(&mut self, message: &[u8]) -> Result<Signature> {
        let pair = self.key.as_mut().ok_or(XmssError::NotInitialized)?;
        self.scheme.sign(&mut pair.private_key, message)
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        match &self.key {
            Some(pair) => self.scheme.verify(&pair.public_key, message, signature),
            None => false,
        }
    }

    /// Zero when no key is loaded.
    pub fn remaining_signatures(&self) -> u32 {
        self.private_key().map_or(0, PrivateKey::remaining)
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state(), SignerState::Exhausted { .. })
    }

    pub fn into_key_pair(self) -> Option<KeyPair> {
        self.key
    }
}
