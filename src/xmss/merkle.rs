//! Merkle tree over one-time public keys.
//!
//! Nodes are stored 1-indexed in a flat vector: node 1 is the root, the
//! children of node `j` are `2j` and `2j + 1`, and the leaves of a tree of
//! height `h` occupy `[2^h, 2^(h+1))`.
//!
//! ```text
//!              1            <- root
//!          2       3
//!        4   5   6   7      <- leaves (h = 2)
//! ```

use rayon::prelude::*;

use super::hash::{hash, Hash};

#[derive(Clone, PartialEq, Eq)]
pub struct MerkleTree {
    height: u32,
    leaf_count: usize,
    nodes: Vec<Hash>,
}

impl MerkleTree {
    /// Build a tree over precomputed leaves.
    ///
    /// No leaves gives a height-0 tree with an all-zero root; a single leaf
    /// is its own root. Leaf counts that are not a power of two are padded
    /// with all-zero leaves.
    pub fn from_leaves(tree_domain: &[u8], leaves: &[Hash]) -> Self {
        if leaves.is_empty() {
            return Self {
                height: 0,
                leaf_count: 0,
                nodes: vec![[0u8; 32]; 2],
            };
        }

        let width = leaves.len().next_power_of_two();
        let mut nodes = vec![[0u8; 32]; 2 * width];
        nodes[width..width + leaves.len()].copy_from_slice(leaves);
        hash_internal_nodes(tree_domain, &mut nodes, width);

        Self {
            height: width.trailing_zeros(),
            leaf_count: leaves.len(),
            nodes,
        }
    }

    /// Build a full tree of `2^height` leaves, computing leaf `i` with
    /// `leaf_at(i)`. Leaves are generated in parallel.
    pub fn build<F>(tree_domain: &[u8], height: u32, leaf_at: F) -> Self
    where
        F: Fn(u32) -> Hash + Sync,
    {
        let width = 1usize << height;
        let mut nodes = vec![[0u8; 32]; 2 * width];
        nodes[width..]
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, slot)| *slot = leaf_at(i as u32));
        hash_internal_nodes(tree_domain, &mut nodes, width);

        Self {
            height,
            leaf_count: width,
            nodes,
        }
    }

    pub fn root(&self) -> Hash {
        self.nodes[1]
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of real (unpadded) leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn leaf(&self, leaf_index: u32) -> Option<Hash> {
        if (leaf_index as usize) >= self.leaf_count {
            return None;
        }
        Some(self.nodes[(1usize << self.height) + leaf_index as usize])
    }

    /// Node by 1-based tree index.
    pub fn node(&self, index: usize) -> Option<Hash> {
        if index == 0 {
            return None;
        }
        self.nodes.get(index).copied()
    }

    /// Sibling hashes from leaf to root, `height` entries.
    pub fn auth_path(&self, leaf_index: u32) -> Option<Vec<Hash>> {
        if (leaf_index as usize) >= (1usize << self.height) {
            return None;
        }
        let mut path = Vec::with_capacity(self.height as usize);
        let mut index = (1usize << self.height) + leaf_index as usize;
        for _ in 0..self.height {
            path.push(self.nodes[index ^ 1]);
            index /= 2;
        }
        Some(path)
    }
}

impl std::fmt::Debug for MerkleTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerkleTree")
            .field("height", &self.height)
            .field("leaf_count", &self.leaf_count)
            .field("root", &hex_prefix(&self.root()))
            .finish()
    }
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes[..4].iter().map(|b| format!("{:02x}", b)).collect::<String>() + ".."
}

fn hash_internal_nodes(tree_domain: &[u8], nodes: &mut [Hash], width: usize) {
    for j in (1..width).rev() {
        nodes[j] = hash(tree_domain, &[&nodes[2 * j], &nodes[2 * j + 1]]);
    }
}

/// Walk an authentication path up from `leaf`.
///
/// At each level an even index means the running node is the left child.
pub fn root_from_path(tree_domain: &[u8], leaf: &Hash, leaf_index: u32, path: &[Hash]) -> Hash {
    let mut current = *leaf;
    let mut index = leaf_index;
    for sibling in path {
        current = if index & 1 == 0 {
            hash(tree_domain, &[&current, sibling])
        } else {
            hash(tree_domain, &[sibling, &current])
        };
        index >>= 1;
    }
    current
}

/// Check that `path` connects `leaf` at `leaf_index` to `expected_root`.
pub fn verify_path(
    tree_domain: &[u8],
    leaf: &Hash,
    leaf_index: u32,
    path: &[Hash],
    expected_root: &Hash,
) -> bool {
    if path.len() >= 32 || (leaf_index as u64) >= (1u64 << path.len()) {
        return false;
    }
    root_from_path(tree_domain, leaf, leaf_index, path) == *expected_root
}
