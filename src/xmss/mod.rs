// Stateful hash-based signatures: WOTS+ one-time keys under a Merkle tree,
// with a multi-tree key manager on top.
//
// Layering, bottom-up: hash -> wots / merkle -> signer -> manager. The
// manager is the only type that synchronises; everything below it is
// single-owner or read-only.

pub mod config;
pub mod conversions;
pub mod error;
pub mod hash;
pub mod keys;
pub mod manager;
pub mod merkle;
pub mod message;
pub mod signer;
pub mod traits;
pub mod wots;

pub use config::{ManagerConfig, ParameterMetadata, ParameterSet, SchemeConfig};
pub use error::{Result, XmssError};
pub use hash::{DomainTags, Hash};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use manager::KeyManager;
pub use merkle::MerkleTree;
pub use message::MessagePreprocessor;
pub use signer::{SignerState, TreeSigner, XmssScheme};
pub use traits::{MessageSigner, MessageVerifier};
pub use wots::{Winternitz, Wots, WotsParams};
