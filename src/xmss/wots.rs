//! Winternitz one-time signatures (WOTS+).
//!
//! A 32-byte digest is split into `len1` base-`w` digits, followed by `len2`
//! checksum digits. Chain `i` of a signature is the private chain start
//! advanced `d_i` steps; the verifier advances it the remaining
//! `w - 1 - d_i` steps and lands on the public chain end.
//!
//! ```text
//!   priv[i] --step 0--> ... --step d_i-1--> sig[i] --...--> pub[i]
//!            \_______ d_i steps _______/           \_ w-1-d_i _/
//! ```
//!
//! The checksum grows when a message digit shrinks, so lowering any digit to
//! reuse revealed chain values forces some checksum digit up, which needs a
//! chain value that was never revealed.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::error::XmssError;
use super::hash::{hash, DomainTags, Hash, HASH_LEN};
use super::message::MessagePreprocessor;

/// Winternitz base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Winternitz {
    W4,
    W16,
}

impl Winternitz {
    pub fn value(self) -> u32 {
        match self {
            Winternitz::W4 => 4,
            Winternitz::W16 => 16,
        }
    }

    /// Bits per digit.
    pub fn log2(self) -> u32 {
        match self {
            Winternitz::W4 => 2,
            Winternitz::W16 => 4,
        }
    }
}

impl Default for Winternitz {
    fn default() -> Self {
        Winternitz::W16
    }
}

impl TryFrom<u32> for Winternitz {
    type Error = XmssError;

    fn try_from(w: u32) -> Result<Self, Self::Error> {
        match w {
            4 => Ok(Winternitz::W4),
            16 => Ok(Winternitz::W16),
            _ => Err(XmssError::InvalidWinternitz { w }),
        }
    }
}

impl From<Winternitz> for u32 {
    fn from(w: Winternitz) -> u32 {
        w.value()
    }
}

/// Derived WOTS+ lengths for one Winternitz base and `N = 32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WotsParams {
    winternitz: Winternitz,
    len1: usize,
    len2: usize,
}

impl WotsParams {
    pub fn new(winternitz: Winternitz) -> Self {
        let w = winternitz.value();
        let len1 = (8 * HASH_LEN).div_ceil(winternitz.log2() as usize);

        // Smallest len2 with w^len2 > len1 * (w - 1)
        let max_checksum = len1 as u32 * (w - 1);
        let mut len2 = 1;
        let mut capacity = w;
        while capacity <= max_checksum {
            capacity *= w;
            len2 += 1;
        }

        Self {
            winternitz,
            len1,
            len2,
        }
    }

    pub fn winternitz(&self) -> Winternitz {
        self.winternitz
    }

    pub fn w(&self) -> u32 {
        self.winternitz.value()
    }

    /// Number of message digits.
    pub fn len1(&self) -> usize {
        self.len1
    }

    /// Number of checksum digits.
    pub fn len2(&self) -> usize {
        self.len2
    }

    /// Total number of chains.
    pub fn len(&self) -> usize {
        self.len1 + self.len2
    }

    /// The `len1` base-w message digits of `digest`, high bits of each byte
    /// first. Positions past the end of `digest` decode as 0.
    pub fn message_digits(&self, digest: &[u8]) -> Vec<u32> {
        let log_w = self.winternitz.log2() as usize;
        let per_byte = 8 / log_w;
        let mask = (1u32 << log_w) - 1;

        (0..self.len1)
            .map(|i| match digest.get(i / per_byte) {
                Some(&byte) => {
                    let shift = 8 - log_w * (i % per_byte + 1);
                    (byte as u32 >> shift) & mask
                }
                None => 0,
            })
            .collect()
    }

    /// `Σ (w - 1 - d)` over the message digits.
    pub fn checksum(&self, message_digits: &[u32]) -> u32 {
        let w = self.w();
        message_digits.iter().map(|d| w - 1 - d).sum()
    }

    /// `checksum` in exactly `len2` base-w digits, most significant first.
    pub fn checksum_digits(&self, mut checksum: u32) -> Vec<u32> {
        let w = self.w();
        let mut digits = vec![0u32; self.len2];
        for slot in digits.iter_mut().rev() {
            *slot = checksum % w;
            checksum /= w;
        }
        digits
    }

    /// Message digits followed by checksum digits; exactly `len()` entries.
    pub fn digits(&self, digest: &[u8]) -> Vec<u32> {
        let mut digits = self.message_digits(digest);
        let checksum = self.checksum(&digits);
        digits.extend(self.checksum_digits(checksum));
        digits
    }
}

/// WOTS+ operations under one parameter set, tag set and optional tweak seed.
#[derive(Debug, Clone)]
pub struct Wots {
    params: WotsParams,
    tags: DomainTags,
    tweak: Option<Hash>,
}

impl Wots {
    pub fn new(params: WotsParams, tags: DomainTags, tweak: Option<Hash>) -> Self {
        Self {
            params,
            tags,
            tweak,
        }
    }

    pub fn params(&self) -> &WotsParams {
        &self.params
    }

    /// Advance `x` by `steps` chain steps, starting at position `start`.
    pub fn chain(&self, x: &Hash, chain_index: u32, start: u32, steps: u32) -> Hash {
        let chain_bytes = chain_index.to_be_bytes();
        let mut value = *x;
        for step in start..start + steps {
            let step_bytes = step.to_be_bytes();
            value = match &self.tweak {
                Some(tweak) => hash(
                    self.tags.chain,
                    &[tweak, &chain_bytes, &step_bytes, &value],
                ),
                None => hash(self.tags.chain, &[&chain_bytes, &step_bytes, &value]),
            };
        }
        value
    }

    /// Per-leaf secret derived from the tree seed.
    pub fn leaf_seed(&self, tree_seed: &Hash, leaf_index: u32) -> Zeroizing<Hash> {
        Zeroizing::new(hash(
            self.tags.prf,
            &[tree_seed, &leaf_index.to_be_bytes()],
        ))
    }

    /// `priv[i] = H(ots, leaf_seed, i)`.
    pub fn private_chains(&self, leaf_seed: &Hash) -> Zeroizing<Vec<Hash>> {
        Zeroizing::new(
            (0..self.params.len() as u32)
                .map(|i| hash(self.tags.ots, &[leaf_seed, &i.to_be_bytes()]))
                .collect(),
        )
    }

    /// Every private chain advanced the full `w - 1` steps.
    pub fn public_chains(&self, private: &[Hash]) -> Vec<Hash> {
        let top = self.params.w() - 1;
        private
            .iter()
            .enumerate()
            .map(|(i, x)| self.chain(x, i as u32, 0, top))
            .collect()
    }

    /// Compress public chain ends into a single tree leaf.
    pub fn leaf_hash(&self, public: &[Hash]) -> Hash {
        let mut buf = Vec::with_capacity(public.len() * HASH_LEN);
        for end in public {
            buf.extend_from_slice(end);
        }
        hash(self.tags.leaf, &[&buf])
    }

    /// Leaf value of one-time key `leaf_index` under `tree_seed`.
    pub fn leaf(&self, tree_seed: &Hash, leaf_index: u32) -> Hash {
        let leaf_seed = self.leaf_seed(tree_seed, leaf_index);
        let private = self.private_chains(&leaf_seed);
        self.leaf_hash(&self.public_chains(&private))
    }

    /// Domain-separated digest of an arbitrary message.
    pub fn message_digest(&self, message: &[u8]) -> Hash {
        MessagePreprocessor::preprocess(self.tags.msg, message)
    }

    /// Sign a digest with the one-time key behind `leaf_seed`.
    pub fn sign_digest(&self, leaf_seed: &Hash, digest: &Hash) -> Vec<Hash> {
        let digits = self.params.digits(digest);
        let private = self.private_chains(leaf_seed);
        private
            .iter()
            .zip(digits)
            .enumerate()
            .map(|(i, (x, d))| self.chain(x, i as u32, 0, d))
            .collect()
    }

    /// Recover the public chain ends a signature commits to.
    ///
    /// Returns `None` when the signature has the wrong number of chains.
    pub fn recover_public_chains(&self, digest: &Hash, signature: &[Hash]) -> Option<Vec<Hash>> {
        if signature.len() != self.params.len() {
            return None;
        }
        let top = self.params.w() - 1;
        let digits = self.params.digits(digest);
        Some(
            signature
                .iter()
                .zip(digits)
                .enumerate()
                .map(|(i, (x, d))| self.chain(x, i as u32, d, top - d))
                .collect(),
        )
    }

    /// Check a signature directly against known public chain ends.
    pub fn verify_chains(&self, public: &[Hash], digest: &Hash, signature: &[Hash]) -> bool {
        if public.len() != self.params.len() {
            return false;
        }
        match self.recover_public_chains(digest, signature) {
            Some(recovered) => recovered == public,
            None => false,
        }
    }

    /// Sign `message` with a standalone one-time key. `None` for an empty message.
    pub fn ots_sign(&self, key_seed: &Hash, message: &[u8]) -> Option<Vec<Hash>> {
        if message.is_empty() {
            return None;
        }
        let digest = self.message_digest(message);
        Some(self.sign_digest(key_seed, &digest))
    }

    /// Leaf-hash form of the public key for a standalone one-time key.
    pub fn ots_public_key(&self, key_seed: &Hash) -> Hash {
        let private = self.private_chains(key_seed);
        self.leaf_hash(&self.public_chains(&private))
    }

    /// Verify a standalone one-time signature against the leaf-hash form of
    /// its public key.
    pub fn ots_verify(&self, public_key_hash: &Hash, message: &[u8], signature: &[Hash]) -> bool {
        if message.is_empty() {
            return false;
        }
        let digest = self.message_digest(message);
        match self.recover_public_chains(&digest, signature) {
            Some(recovered) => self.leaf_hash(&recovered) == *public_key_hash,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xmss::hash::{hash, DOMAIN_PRF};
    use proptest::prelude::*;

    fn wots(w: Winternitz) -> Wots {
        Wots::new(WotsParams::new(w), DomainTags::DEFAULT, None)
    }

    fn key_seed(label: &[u8]) -> Hash {
        hash(DOMAIN_PRF, &[label])
    }

    #[test]
    fn test_chain_lengths() {
        let w16 = WotsParams::new(Winternitz::W16);
        assert_eq!(w16.len1(), 64);
        assert_eq!(w16.len2(), 3);
        assert_eq!(w16.len(), 67);

        let w4 = WotsParams::new(Winternitz::W4);
        assert_eq!(w4.len1(), 128);
        assert_eq!(w4.len2(), 5);
        assert_eq!(w4.len(), 133);
    }

    #[test]
    fn test_winternitz_from_u32() {
        assert_eq!(Winternitz::try_from(16).unwrap(), Winternitz::W16);
        assert_eq!(Winternitz::try_from(4).unwrap(), Winternitz::W4);
        for w in [0u32, 1, 2, 8, 99] {
            assert!(matches!(
                Winternitz::try_from(w),
                Err(XmssError::InvalidWinternitz { .. })
            ));
        }
    }

    #[test]
    fn test_message_digits_w16() {
        let params = WotsParams::new(Winternitz::W16);
        let mut digest = [0u8; 32];
        digest[0] = 0xab;

        let digits = params.digits(&digest);
        assert_eq!(digits.len(), 67);
        assert_eq!(digits[0], 0xa);
        assert_eq!(digits[1], 0xb);
        assert!(digits[2..64].iter().all(|&d| d == 0));
    }

    #[test]
    fn test_message_digits_w4() {
        let params = WotsParams::new(Winternitz::W4);
        let mut digest = [0u8; 32];
        digest[0] = 0b11_10_01_00;

        let digits = params.digits(&digest);
        assert_eq!(digits.len(), 133);
        assert_eq!(&digits[..4], &[3, 2, 1, 0]);
    }

    #[test]
    fn test_checksum_digits_w16() {
        let params = WotsParams::new(Winternitz::W16);

        // all-zero digest: every digit 0, checksum 64 * 15 = 960 = 0x3c0
        let digits = params.digits(&[0u8; 32]);
        assert_eq!(&digits[64..], &[0x3, 0xc, 0x0]);

        // all-0xff digest: checksum 0
        let digits = params.digits(&[0xffu8; 32]);
        assert_eq!(&digits[64..], &[0, 0, 0]);
    }

    #[test]
    fn test_checksum_digits_w4() {
        let params = WotsParams::new(Winternitz::W4);
        // 128 * 3 = 384 = 1*256 + 2*64 + 0*16 + 0*4 + 0
        let digits = params.digits(&[0u8; 32]);
        assert_eq!(&digits[128..], &[1, 2, 0, 0, 0]);
    }

    #[test]
    fn test_short_digest_pads_with_zero_digits() {
        let params = WotsParams::new(Winternitz::W16);
        let digits = params.message_digits(&[0xff]);
        assert_eq!(digits.len(), 64);
        assert_eq!(&digits[..2], &[15, 15]);
        assert!(digits[2..].iter().all(|&d| d == 0));
    }

    #[test]
    fn test_chain_composes() {
        let wots = wots(Winternitz::W16);
        let x = key_seed(b"chain");
        let full = wots.chain(&x, 3, 0, 15);
        let mid = wots.chain(&x, 3, 0, 6);
        assert_eq!(wots.chain(&mid, 3, 6, 9), full);
        assert_eq!(wots.chain(&x, 3, 0, 0), x);
        // chain position is part of each step
        assert_ne!(wots.chain(&mid, 3, 0, 9), full);
        // chain index is part of each step
        assert_ne!(wots.chain(&x, 4, 0, 15), full);
    }

    #[test]
    fn test_tweak_changes_public_key() {
        let seed = key_seed(b"tweak");
        let plain = wots(Winternitz::W16);
        let tweaked = Wots::new(
            WotsParams::new(Winternitz::W16),
            DomainTags::DEFAULT,
            Some([9u8; 32]),
        );
        assert_ne!(plain.ots_public_key(&seed), tweaked.ots_public_key(&seed));
    }

    #[test]
    fn test_leaf_derivation_deterministic() {
        let wots = wots(Winternitz::W16);
        let tree_seed = key_seed(b"tree");

        let a = wots.private_chains(&wots.leaf_seed(&tree_seed, 5));
        let b = wots.private_chains(&wots.leaf_seed(&tree_seed, 5));
        assert_eq!(*a, *b);
        assert_eq!(wots.public_chains(&a), wots.public_chains(&b));
        assert_eq!(wots.leaf(&tree_seed, 5), wots.leaf(&tree_seed, 5));
        assert_ne!(wots.leaf(&tree_seed, 5), wots.leaf(&tree_seed, 6));
    }

    #[test]
    fn test_sign_verify_against_public_chains() {
        for w in [Winternitz::W16, Winternitz::W4] {
            let wots = wots(w);
            let seed = key_seed(b"direct");
            let public = wots.public_chains(&wots.private_chains(&seed));
            let digest = wots.message_digest(b"direct check");

            let sig = wots.sign_digest(&seed, &digest);
            assert_eq!(sig.len(), wots.params().len());
            assert!(wots.verify_chains(&public, &digest, &sig));

            let other = wots.message_digest(b"other message");
            assert!(!wots.verify_chains(&public, &other, &sig));
        }
    }

    #[test]
    fn test_ots_sign_and_verify() {
        let wots = wots(Winternitz::W16);
        let key = key_seed(b"ots-test-key");
        let msg = b"ots-test-message";

        let sig = wots.ots_sign(&key, msg).unwrap();
        assert_eq!(sig.len(), 67);

        let pub_hash = wots.ots_public_key(&key);
        assert!(wots.ots_verify(&pub_hash, msg, &sig));
        assert!(!wots.ots_verify(&pub_hash, b"wrong", &sig));
    }

    #[test]
    fn test_ots_sign_rejects_empty_message() {
        let wots = wots(Winternitz::W16);
        assert!(wots.ots_sign(&key_seed(b"k"), b"").is_none());
        assert!(!wots.ots_verify(&[0u8; 32], b"", &[]));
    }

    #[test]
    fn test_chain_count_mismatch_is_rejected() {
        let wots = wots(Winternitz::W16);
        let key = key_seed(b"mismatch");
        let pub_hash = wots.ots_public_key(&key);
        let mut sig = wots.ots_sign(&key, b"message").unwrap();

        sig.pop();
        assert!(!wots.ots_verify(&pub_hash, b"message", &sig));
        assert!(wots
            .recover_public_chains(&wots.message_digest(b"message"), &sig)
            .is_none());

        let public = wots.public_chains(&wots.private_chains(&key));
        let digest = wots.message_digest(b"message");
        let full = wots.sign_digest(&key, &digest);
        assert!(!wots.verify_chains(&public[..66], &digest, &full));
    }

    #[test]
    fn test_tampered_chain_value_rejected() {
        let wots = wots(Winternitz::W16);
        let key = key_seed(b"tamper");
        let pub_hash = wots.ots_public_key(&key);
        let sig = wots.ots_sign(&key, b"message").unwrap();

        for i in [0usize, 33, 66] {
            let mut forged = sig.clone();
            forged[i][0] ^= 0x01;
            assert!(!wots.ots_verify(&pub_hash, b"message", &forged));
        }
    }

    proptest! {
        #[test]
        fn prop_digits_in_range_and_count(digest in proptest::array::uniform32(any::<u8>())) {
            for w in [Winternitz::W16, Winternitz::W4] {
                let params = WotsParams::new(w);
                let digits = params.digits(&digest);
                prop_assert_eq!(digits.len(), params.len());
                prop_assert!(digits.iter().all(|&d| d < params.w()));
            }
        }

        #[test]
        fn prop_checksum_digits_encode_checksum(digest in proptest::array::uniform32(any::<u8>())) {
            for w in [Winternitz::W16, Winternitz::W4] {
                let params = WotsParams::new(w);
                let message = params.message_digits(&digest);
                let checksum = params.checksum(&message);
                let decoded = params
                    .checksum_digits(checksum)
                    .iter()
                    .fold(0u32, |acc, &d| acc * params.w() + d);
                prop_assert_eq!(decoded, checksum);
            }
        }
    }
}
