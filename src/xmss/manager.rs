// Multi-tree key manager with automatic rotation
//
// Every operation runs under one mutex held for its whole duration, so leaf
// allocation is linearizable across threads. State only changes after a
// successful sign, which makes a poisoned lock safe to recover.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use super::config::ManagerConfig;
use super::error::{Result, XmssError};
use super::keys::{KeyPair, PublicKey, Signature};
use super::signer::{TreeSigner, XmssScheme};
use xmss_types::TreeEntryState;

#[derive(Debug)]
struct ManagerState {
    trees: Vec<TreeSigner>,
    active: usize,
}

impl ManagerState {
    fn active_tree(&self) -> Option<&TreeSigner> {
        self.trees.get(self.active)
    }
}

/// Ordered list of trees plus an active cursor.
///
/// Rotated trees stay in the list so their roots remain available to
/// verifiers; nothing here re-certifies a new root.
#[derive(Debug)]
pub struct KeyManager {
    scheme: Arc<XmssScheme>,
    rotation_threshold_percent: u8,
    state: Mutex<ManagerState>,
}

impl KeyManager {
    /// Create a manager holding one freshly generated tree
    ///
    /// Preconditions:
    /// - config passes `ManagerConfig::validate`
    ///
    /// Postconditions:
    /// - tree_count() == 1 and the new tree is active
    pub fn new(config: ManagerConfig) -> Result<Self> {
        config.validate()?;
        let scheme = Arc::new(XmssScheme::new(config.scheme)?);
        let first = TreeSigner::generate(Arc::clone(&scheme))?;
        info!(
            height = scheme.height(),
            max_leaves = scheme.max_leaves(),
            "key manager initialised with first tree"
        );
        Ok(Self {
            scheme,
            rotation_threshold_percent: config.rotation_threshold_percent,
            state: Mutex::new(ManagerState {
                trees: vec![first],
                active: 0,
            }),
        })
    }

    /// Restore a manager from stored entries.
    ///
    /// An empty entry list is accepted; signing then fails with `ManagerEmpty`.
    pub fn from_entries(
        config: ManagerConfig,
        entries: Vec<TreeEntryState>,
        active: usize,
    ) -> Result<Self> {
        config.validate()?;
        let scheme = Arc::new(XmssScheme::new(config.scheme)?);

        if !entries.is_empty() && active >= entries.len() {
            return Err(XmssError::InvalidKeyState {
                reason: format!(
                    "active tree {} out of range for {} entries",
                    active,
                    entries.len()
                ),
            });
        }

        let trees = entries
            .iter()
            .map(|entry| {
                let pair = KeyPair::try_from(entry)?;
                TreeSigner::from_key_pair(Arc::clone(&scheme), pair)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(trees = trees.len(), active, "key manager restored");
        Ok(Self {
            scheme,
            rotation_threshold_percent: config.rotation_threshold_percent,
            state: Mutex::new(ManagerState {
                trees,
                active: if entries.is_empty() { 0 } else { active },
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn scheme(&self) -> &XmssScheme {
        &self.scheme
    }

    pub fn rotation_threshold_percent(&self) -> u8 {
        self.rotation_threshold_percent
    }

    /// Sign with the active tree, rotating first if it is exhausted
    ///
    /// Postconditions:
    /// - exactly one leaf across all trees is consumed
    /// - if the active tree was exhausted, the next existing tree (or a newly
    ///   generated one) becomes active before signing
    /// - the signature that exhausts a tree also rotates, under the same
    ///   lock, so `active_public_key` names the tree of the next signature
    pub fn sign(&self, message: &[u8]) -> Result<Signature> {
        let mut state = self.lock();
        if state.trees.is_empty() {
            return Err(XmssError::ManagerEmpty);
        }
        if message.is_empty() {
            return Err(XmssError::EmptyMessage);
        }

        self.rotate_if_exhausted(&mut state)?;

        let was_over = self.over_threshold(&state);
        let active = state.active;
        let signature = state.trees[active].sign(message)?;
        if !was_over && self.over_threshold(&state) {
            warn!(
                tree = active,
                threshold_percent = self.rotation_threshold_percent,
                remaining = state.trees[active].remaining_signatures(),
                "active XMSS tree crossed rotation threshold"
            );
        }
        if state.trees[active].is_exhausted() {
            // The signature is already issued; a failed rotation is retried
            // by the next sign.
            if let Err(err) = self.rotate_if_exhausted(&mut state) {
                warn!(error = %err, "rotation after exhaustion failed");
            }
        }
        Ok(signature)
    }

    fn rotate_if_exhausted(&self, state: &mut ManagerState) -> Result<()> {
        while state.active_tree().map_or(false, TreeSigner::is_exhausted) {
            if state.active + 1 < state.trees.len() {
                state.active += 1;
                info!(tree = state.active, "advanced to next stored XMSS tree");
            } else {
                let fresh = TreeSigner::generate(Arc::clone(&self.scheme))?;
                state.trees.push(fresh);
                state.active = state.trees.len() - 1;
                info!(
                    tree = state.active,
                    tree_count = state.trees.len(),
                    "rotated to newly generated XMSS tree"
                );
            }
        }
        Ok(())
    }

    fn over_threshold(&self, state: &ManagerState) -> bool {
        match state.active_tree().and_then(TreeSigner::private_key) {
            Some(key) => {
                key.used_leaves() as u64 * 100
                    >= key.max_leaves() as u64 * self.rotation_threshold_percent as u64
            }
            None => true,
        }
    }

    /// Verify against a trusted public key; any of `all_public_keys` qualifies.
    pub fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        self.scheme.verify(public_key, message, signature)
    }

    pub fn active_public_key(&self) -> Option<PublicKey> {
        self.lock().active_tree().and_then(|tree| tree.public_key().copied())
    }

    /// Key the next `sign` will verify under.
    ///
    /// This is the active tree, or the first stored tree after it that still
    /// has leaves. `None` when the manager is empty or the next `sign` has to
    /// generate a new tree first.
    pub fn next_public_key(&self) -> Option<PublicKey> {
        let state = self.lock();
        state
            .trees
            .iter()
            .skip(state.active)
            .find(|tree| !tree.is_exhausted())
            .and_then(|tree| tree.public_key().copied())
    }

    /// Signatures left in the active tree; zero when the manager is empty.
    pub fn remaining_signatures(&self) -> u32 {
        self.lock()
            .active_tree()
            .map_or(0, TreeSigner::remaining_signatures)
    }

    /// True once usage of the active tree reaches the rotation threshold.
    pub fn needs_rotation(&self) -> bool {
        self.over_threshold(&self.lock())
    }

    pub fn tree_count(&self) -> usize {
        self.lock().trees.len()
    }

    pub fn active_index(&self) -> Option<usize> {
        let state = self.lock();
        (!state.trees.is_empty()).then_some(state.active)
    }

    /// Public keys of every tree, oldest first.
    pub fn all_public_keys(&self) -> Vec<PublicKey> {
        self.lock()
            .trees
            .iter()
            .filter_map(|tree| tree.public_key().copied())
            .collect()
    }

    /// Snapshot of every tree for a key-storage collaborator.
    ///
    /// The returned states contain seeds; persist them with their counters.
    pub fn export_entries(&self) -> Vec<TreeEntryState> {
        self.lock()
            .trees
            .iter()
            .filter_map(|tree| tree.key_pair().map(TreeEntryState::from))
            .collect()
    }
}
