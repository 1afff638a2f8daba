// Conversions between library key types and the xmss-types storage forms
//
// Key-storage collaborators only ever see `PrivateKeyState`; the seed is
// copied out explicitly and the counter travels with it.

use zeroize::Zeroizing;

use super::error::XmssError;
use super::keys::{KeyPair, PrivateKey};
use xmss_types::{PrivateKeyState, TreeEntryState};

impl From<&PrivateKey> for PrivateKeyState {
    fn from(key: &PrivateKey) -> Self {
        PrivateKeyState {
            seed: *key.seed(),
            height: key.height(),
            max_leaves: key.max_leaves(),
            used_leaves: key.used_leaves(),
        }
    }
}

impl TryFrom<&PrivateKeyState> for PrivateKey {
    type Error = XmssError;

    fn try_from(state: &PrivateKeyState) -> Result<Self, Self::Error> {
        PrivateKey::restore(
            Zeroizing::new(state.seed),
            state.height,
            state.max_leaves,
            state.used_leaves,
        )
    }
}

impl From<&KeyPair> for TreeEntryState {
    fn from(pair: &KeyPair) -> Self {
        TreeEntryState {
            public_key: pair.public_key,
            private_key: PrivateKeyState::from(&pair.private_key),
        }
    }
}

impl TryFrom<&TreeEntryState> for KeyPair {
    type Error = XmssError;

    fn try_from(entry: &TreeEntryState) -> Result<Self, Self::Error> {
        let mut private_key = PrivateKey::try_from(&entry.private_key)?;
        if entry.public_key.height != private_key.height() {
            return Err(XmssError::InvalidKeyState {
                reason: format!(
                    "public key height {} does not match private key height {}",
                    entry.public_key.height,
                    private_key.height()
                ),
            });
        }
        // Checked against the rebuilt tree on first sign
        private_key.bind_root(entry.public_key.root)?;
        Ok(KeyPair {
            public_key: entry.public_key,
            private_key,
        })
    }
}
