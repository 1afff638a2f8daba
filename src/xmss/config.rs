// Parameter sets, scheme configuration and key-manager configuration

use serde::{Deserialize, Serialize};

use super::error::{Result, XmssError};
use super::hash::{Hash, HASH_LEN};
use super::wots::{Winternitz, WotsParams};

/// Smallest tree height the tree builder accepts.
pub const MIN_HEIGHT: u32 = 1;
/// Largest tree height: 2^20 one-time keys.
pub const MAX_HEIGHT: u32 = 20;
pub const DEFAULT_HEIGHT: u32 = 10;
pub const DEFAULT_ROTATION_THRESHOLD_PERCENT: u8 = 90;

/// Externally exposed XMSS parameter sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ParameterSet {
    /// Tree height 10, Winternitz parameter 16
    /// LIFETIME = 2^10 = 1,024 signatures
    H10_W16,

    /// Tree height 16, Winternitz parameter 16
    /// LIFETIME = 2^16 = 65,536 signatures
    H16_W16,

    /// Tree height 20, Winternitz parameter 16
    /// LIFETIME = 2^20 = 1,048,576 signatures
    H20_W16,

    /// Tree height 10, Winternitz parameter 4
    H10_W4,

    /// Tree height 16, Winternitz parameter 4
    H16_W4,

    /// Tree height 20, Winternitz parameter 4
    H20_W4,
}

/// Metadata for an XMSS parameter set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    pub lifetime: u32,
    pub tree_height: u32,
    pub winternitz_parameter: u32,
    pub chain_count: usize,
    pub hash_function: String,
    pub signature_size_bytes: usize,
    pub public_key_size_bytes: usize,
}

impl ParameterSet {
    pub const ALL: [ParameterSet; 6] = [
        ParameterSet::H10_W16,
        ParameterSet::H16_W16,
        ParameterSet::H20_W16,
        ParameterSet::H10_W4,
        ParameterSet::H16_W4,
        ParameterSet::H20_W4,
    ];

    pub fn height(&self) -> u32 {
        match self {
            ParameterSet::H10_W16 | ParameterSet::H10_W4 => 10,
            ParameterSet::H16_W16 | ParameterSet::H16_W4 => 16,
            ParameterSet::H20_W16 | ParameterSet::H20_W4 => 20,
        }
    }

    pub fn winternitz(&self) -> Winternitz {
        match self {
            ParameterSet::H10_W16 | ParameterSet::H16_W16 | ParameterSet::H20_W16 => {
                Winternitz::W16
            }
            ParameterSet::H10_W4 | ParameterSet::H16_W4 | ParameterSet::H20_W4 => Winternitz::W4,
        }
    }

    /// Look up the exposed set for a (height, w) pair.
    pub fn find(height: u32, winternitz: Winternitz) -> Option<ParameterSet> {
        Self::ALL
            .into_iter()
            .find(|p| p.height() == height && p.winternitz() == winternitz)
    }

    /// Get metadata for this parameter set
    pub fn metadata(&self) -> ParameterMetadata {
        let height = self.height();
        let chain_count = WotsParams::new(self.winternitz()).len();
        ParameterMetadata {
            lifetime: 1 << height,
            tree_height: height,
            winternitz_parameter: self.winternitz().value(),
            chain_count,
            hash_function: "SHA-256".to_string(),
            signature_size_bytes: estimate_signature_size(height, chain_count),
            public_key_size_bytes: estimate_public_key_size(),
        }
    }

    pub fn scheme_config(&self) -> SchemeConfig {
        SchemeConfig {
            winternitz: self.winternitz(),
            height: self.height(),
            ..SchemeConfig::default()
        }
    }
}

/// Estimate signature size
///
/// Signature consists of:
/// - leaf_index: 4 bytes
/// - auth_path: tree_height * hash_len bytes
/// - ots_signature: chain_count * hash_len bytes
/// - public_root: hash_len bytes
fn estimate_signature_size(tree_height: u32, chain_count: usize) -> usize {
    4 + (tree_height as usize * HASH_LEN) + (chain_count * HASH_LEN) + HASH_LEN
}

/// Public key consists of the root and a 4-byte height
fn estimate_public_key_size() -> usize {
    HASH_LEN + 4
}

/// Configuration of one signing scheme instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeConfig {
    pub winternitz: Winternitz,
    pub height: u32,
    /// Keep each key's built tree in memory instead of rebuilding per signature.
    pub cache_trees: bool,
    /// Optional public seed mixed into every chain step.
    pub tweak: Option<Hash>,
}

impl Default for SchemeConfig {
    fn default() -> Self {
        Self {
            winternitz: Winternitz::W16,
            height: DEFAULT_HEIGHT,
            cache_trees: true,
            tweak: None,
        }
    }
}

impl SchemeConfig {
    pub fn new(height: u32, winternitz: Winternitz) -> Self {
        Self {
            winternitz,
            height,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_height(self.height)
    }
}

/// Configuration of a rotating key manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub scheme: SchemeConfig,
    /// Share of the active tree's leaves, in percent, after which
    /// `needs_rotation` reports true.
    pub rotation_threshold_percent: u8,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            scheme: SchemeConfig::default(),
            rotation_threshold_percent: DEFAULT_ROTATION_THRESHOLD_PERCENT,
        }
    }
}

impl ManagerConfig {
    pub fn with_height(height: u32) -> Self {
        Self {
            scheme: SchemeConfig {
                height,
                ..SchemeConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.scheme.validate()?;
        if self.rotation_threshold_percent == 0 || self.rotation_threshold_percent > 100 {
            return Err(XmssError::InvalidConfig(format!(
                "rotation threshold must be in 1..=100 percent, got {}",
                self.rotation_threshold_percent
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_height(height: u32) -> Result<()> {
    if !(MIN_HEIGHT..=MAX_HEIGHT).contains(&height) {
        return Err(XmssError::InvalidHeight {
            height,
            min: MIN_HEIGHT,
            max: MAX_HEIGHT,
        });
    }
    Ok(())
}
