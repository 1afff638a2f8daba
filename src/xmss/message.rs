// Message preprocessing: arbitrary-length messages become 32-byte digests

use super::hash::{hash, Hash};

/// Message preprocessor that converts arbitrary-length messages to 32-byte digests
pub struct MessagePreprocessor;

impl MessagePreprocessor {
    /// Hash message to a 32-byte digest under the message domain tag
    ///
    /// Preconditions: None (accepts any byte slice)
    /// Postconditions: Returns exactly 32 bytes
    /// Invariants: Same domain and input always produce the same output
    pub fn preprocess(domain: &[u8], message: &[u8]) -> Hash {
        hash(domain, &[message])
    }
}
