// Signing interfaces consumed by collaborators (block producers, registries)

use super::error::Result;
use super::keys::{PublicKey, Signature};
use super::manager::KeyManager;
use super::signer::XmssScheme;

/// Produces signatures over arbitrary messages.
pub trait MessageSigner {
    fn sign_message(&self, message: &[u8]) -> Result<Signature>;

    /// Key the next `sign_message` will verify against.
    ///
    /// `None` when no key is known yet, e.g. a key manager that must generate
    /// a fresh tree before it can sign again.
    fn public_key(&self) -> Option<PublicKey>;
}

/// Checks signatures against a trusted public key.
pub trait MessageVerifier {
    fn verify_message(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool;
}

impl MessageSigner for KeyManager {
    fn sign_message(&self, message: &[u8]) -> Result<Signature> {
        self.sign(message)
    }

    fn public_key(&self) -> Option<PublicKey> {
        self.next_public_key()
    }
}

impl MessageVerifier for XmssScheme {
    fn verify_message(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        self.verify(public_key, message, signature)
    }
}

impl MessageVerifier for KeyManager {
    fn verify_message(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        self.verify(public_key, message, signature)
    }
}
