// Domain-separated keyed hash used by every layer of the scheme

use sha2::{Digest, Sha256};
pub use xmss_types::HASH_LEN;

pub type Hash = [u8; HASH_LEN];

/// Tag for deriving private chain starts from a leaf seed.
pub const DOMAIN_OTS: &[u8] = b"ots";
/// Tag for a single WOTS+ chain step.
pub const DOMAIN_CHAIN: &[u8] = b"chain";
/// Tag for compressing public chain ends into a tree leaf.
pub const DOMAIN_LEAF: &[u8] = b"leaf";
/// Tag for internal Merkle nodes.
pub const DOMAIN_TREE: &[u8] = b"tree";
/// Tag for the message digest that gets signed.
pub const DOMAIN_MSG: &[u8] = b"msg";
/// Tag for deriving per-leaf seeds from the tree seed.
pub const DOMAIN_PRF: &[u8] = b"prf";

/// The set of domain tags a scheme instance hashes under.
///
/// Two schemes with different tag sets never produce comparable outputs, even
/// for the same seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainTags {
    pub ots: &'static [u8],
    pub chain: &'static [u8],
    pub leaf: &'static [u8],
    pub tree: &'static [u8],
    pub msg: &'static [u8],
    pub prf: &'static [u8],
}

impl DomainTags {
    pub const DEFAULT: DomainTags = DomainTags {
        ots: DOMAIN_OTS,
        chain: DOMAIN_CHAIN,
        leaf: DOMAIN_LEAF,
        tree: DOMAIN_TREE,
        msg: DOMAIN_MSG,
        prf: DOMAIN_PRF,
    };
}

impl Default for DomainTags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// `H(domain, parts...)`: SHA-256 over `len(domain) || domain || parts`.
///
/// Parts are absorbed without length prefixes, so at any call site only the
/// last part may vary in length.
pub fn hash(domain: &[u8], parts: &[&[u8]]) -> Hash {
    debug_assert!(domain.len() <= u8::MAX as usize);
    let mut hasher = Sha256::new();
    hasher.update([domain.len() as u8]);
    hasher.update(domain);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
