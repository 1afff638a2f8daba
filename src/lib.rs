pub mod benchmark;
pub mod xmss;

// Re-export main types
pub use benchmark::{BenchmarkMetrics, BenchmarkReport};
pub use xmss::{
    DomainTags, KeyManager, KeyPair, ManagerConfig, MessageSigner, MessageVerifier, ParameterSet,
    PrivateKey, PublicKey, SchemeConfig, Signature, SignerState, TreeSigner, Winternitz,
    XmssError, XmssScheme,
};
pub use xmss_types::{PrivateKeyState, TreeEntryState};
