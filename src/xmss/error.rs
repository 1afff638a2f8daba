// Error types for the signer and key manager

use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmssError {
    /// Tree height outside the supported range
    #[error("Invalid tree height {height}: supported heights are {min}..={max}")]
    InvalidHeight { height: u32, min: u32, max: u32 },

    /// Winternitz parameter other than 4 or 16
    #[error("Invalid Winternitz parameter {w}: expected 4 or 16")]
    InvalidWinternitz { w: u32 },

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Signing without a private key
    #[error("Signer not initialized: no private key loaded")]
    NotInitialized,

    /// Signing a zero-length message
    #[error("Refusing to sign an empty message")]
    EmptyMessage,

    /// Every one-time leaf of the tree has been consumed
    #[error("One-time keys exhausted: {used}/{max} leaves used")]
    KeysExhausted { used: u32, max: u32 },

    /// Key manager holds no trees
    #[error("Key manager has no trees")]
    ManagerEmpty,

    /// Restored key state breaks a key invariant
    #[error("Invalid key state: {reason}")]
    InvalidKeyState { reason: String },

    /// The OS entropy source failed while drawing a seed
    #[error("Entropy source failure: {0}")]
    Entropy(String),
}

impl XmssError {
    /// Exhaustion is recovered by rotating to a fresh tree, not by retrying.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, XmssError::KeysExhausted { .. })
    }

    /// Errors caused by how the caller invoked the API.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            XmssError::NotInitialized | XmssError::EmptyMessage | XmssError::ManagerEmpty
        )
    }
}

impl From<rand::Error> for XmssError {
    fn from(err: rand::Error) -> Self {
        XmssError::Entropy(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, XmssError>;
