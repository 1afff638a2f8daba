use std::sync::Arc;
use std::thread;

use xmss_hashsig::{
    KeyManager, ManagerConfig, MessageSigner, MessageVerifier, PrivateKey, PrivateKeyState,
    PublicKey, SchemeConfig, Signature, Winternitz, XmssError, XmssScheme,
};

fn scheme(height: u32) -> XmssScheme {
    XmssScheme::new(SchemeConfig::new(height, Winternitz::W16)).expect("Failed to create scheme")
}

fn signed(height: u32, message: &[u8]) -> (XmssScheme, PublicKey, Signature) {
    let scheme = scheme(height);
    let mut pair = scheme.key_pair_from_seed([0x42; 32]);
    let sig = scheme
        .sign(&mut pair.private_key, message)
        .expect("Failed to sign");
    (scheme, pair.public_key, sig)
}

#[test]
fn test_hello_world_scenario() {
    let scheme = scheme(4);
    let mut pair = scheme.generate_key_pair().expect("Failed to generate keypair");
    let message = b"hello, XMSS world!";

    let first = scheme.sign(&mut pair.private_key, message).expect("Failed to sign");
    assert_eq!(first.leaf_index, 0);
    assert_eq!(first.auth_path.len(), 4);
    assert_eq!(first.ots_signature.len(), 67);
    assert_eq!(first.public_root, pair.public_key.root);
    assert!(scheme.verify(&pair.public_key, message, &first));

    let second_message = b"second XMSS message";
    let second = scheme.sign(&mut pair.private_key, second_message).expect("Failed to sign");
    assert_eq!(second.leaf_index, 1);
    assert_ne!(first.ots_signature, second.ots_signature);
    assert!(scheme.verify(&pair.public_key, second_message, &second));
    assert!(!scheme.verify(&pair.public_key, message, &second));
    assert_eq!(pair.private_key.used_leaves(), 2);
}

fn round_trip(height: u32, signatures: u32) {
    let scheme = scheme(height);
    let mut pair = scheme.generate_key_pair().expect("Failed to generate keypair");
    assert_eq!(pair.private_key.max_leaves(), 1 << height);

    for i in 0..signatures {
        let message = format!("round trip {}", i);
        let sig = scheme
            .sign(&mut pair.private_key, message.as_bytes())
            .expect("Failed to sign");
        assert_eq!(sig.leaf_index, i);
        assert_eq!(sig.auth_path.len(), height as usize);
        assert!(scheme.verify(&pair.public_key, message.as_bytes(), &sig));
        assert_eq!(pair.private_key.used_leaves(), i + 1);
    }
}

#[test]
fn test_round_trip_height_10() {
    round_trip(10, 5);
}

#[test]
#[ignore] // Builds 2^16 leaves
fn test_round_trip_height_16() {
    round_trip(16, 3);
}

#[test]
#[ignore] // Builds 2^20 leaves
fn test_round_trip_height_20() {
    round_trip(20, 2);
}

#[test]
fn test_exhaustion_without_wraparound() {
    let scheme = scheme(2);
    let mut pair = scheme.generate_key_pair().expect("Failed to generate keypair");

    for i in 0..4u32 {
        let sig = scheme.sign(&mut pair.private_key, b"fill").expect("Failed to sign");
        assert_eq!(sig.leaf_index, i);
    }
    for _ in 0..2 {
        match scheme.sign(&mut pair.private_key, b"one too many") {
            Err(XmssError::KeysExhausted { used, max }) => {
                assert_eq!(used, 4);
                assert_eq!(max, 4);
            }
            other => panic!("Expected KeysExhausted, got {:?}", other),
        }
    }
    assert_eq!(pair.private_key.used_leaves(), 4);
    assert_eq!(scheme.remaining_signatures(&pair.private_key), 0);
}

#[test]
fn test_tampered_signatures_rejected() {
    let message = b"tamper target";
    let (scheme, pk, sig) = signed(4, message);
    assert!(scheme.verify(&pk, message, &sig));

    for level in 0..sig.auth_path.len() {
        let mut forged = sig.clone();
        forged.auth_path[level][0] ^= 0x01;
        assert!(!scheme.verify(&pk, message, &forged), "auth path level {}", level);
    }

    for chain in [0usize, 10, 63, 64, 66] {
        let mut forged = sig.clone();
        forged.ots_signature[chain][31] ^= 0x80;
        assert!(!scheme.verify(&pk, message, &forged), "chain {}", chain);
    }

    let mut forged = sig.clone();
    forged.leaf_index = 1;
    assert!(!scheme.verify(&pk, message, &forged));

    assert!(!scheme.verify(&pk, b"tamper targeT", &sig));
    assert!(!scheme.verify(&pk, b"", &sig));
}

#[test]
fn test_length_validation() {
    let message = b"length checks";
    let (scheme, pk, sig) = signed(4, message);

    let mut short = sig.clone();
    short.ots_signature.pop();
    assert!(!scheme.verify(&pk, message, &short));

    let mut long = sig.clone();
    long.ots_signature.push([0u8; 32]);
    assert!(!scheme.verify(&pk, message, &long));

    let mut short_path = sig.clone();
    short_path.auth_path.pop();
    assert!(!scheme.verify(&pk, message, &short_path));

    let mut long_path = sig.clone();
    long_path.auth_path.push([0u8; 32]);
    assert!(!scheme.verify(&pk, message, &long_path));

    for leaf_index in [16u32, u32::MAX] {
        let mut out_of_range = sig.clone();
        out_of_range.leaf_index = leaf_index;
        assert!(!scheme.verify(&pk, message, &out_of_range));
    }

    let empty = Signature {
        leaf_index: 0,
        auth_path: vec![],
        ots_signature: vec![],
        public_root: pk.root,
    };
    assert!(!scheme.verify(&pk, message, &empty));
}

#[test]
fn test_winternitz_4_round_trip() {
    let scheme = XmssScheme::new(SchemeConfig::new(3, Winternitz::W4)).expect("Failed to create scheme");
    assert_eq!(scheme.chain_len(), 133);

    let mut pair = scheme.generate_key_pair().expect("Failed to generate keypair");
    let sig = scheme
        .sign(&mut pair.private_key, b"base four")
        .expect("Failed to sign");
    assert_eq!(sig.ots_signature.len(), 133);
    assert!(scheme.verify(&pair.public_key, b"base four", &sig));

    // A W=16 verifier rejects the longer signature outright
    assert!(!self::scheme(3).verify(&pair.public_key, b"base four", &sig));
}

#[test]
fn test_restored_key_rebuilds_identical_paths() {
    let scheme = scheme(3);
    let mut live = scheme.key_pair_from_seed([0x11; 32]);
    scheme.sign(&mut live.private_key, b"first").expect("Failed to sign");

    let state = PrivateKeyState::from(&live.private_key);
    let mut restored = PrivateKey::try_from(&state).expect("Failed to restore");

    for i in 0..7 {
        let message = format!("after restore {}", i);
        let a = scheme.sign(&mut live.private_key, message.as_bytes()).expect("Failed to sign");
        let b = scheme.sign(&mut restored, message.as_bytes()).expect("Failed to sign");
        assert_eq!(a, b, "cached and rebuilt signatures differ at leaf {}", a.leaf_index);
    }
}

#[test]
fn test_manager_rotation_height_4() {
    let manager = KeyManager::new(ManagerConfig::with_height(4)).expect("Failed to create manager");

    let mut signed = Vec::new();
    for i in 0..17 {
        let message = format!("block {}", i).into_bytes();
        let sig = manager.sign_message(&message).expect("Failed to sign");
        signed.push((message, sig));
    }

    assert_eq!(manager.tree_count(), 2);
    let keys = manager.all_public_keys();
    assert_ne!(keys[0].root, keys[1].root);

    for (message, sig) in &signed {
        let key = keys
            .iter()
            .find(|k| k.root == sig.public_root)
            .expect("Signature from unknown tree");
        assert!(manager.verify_message(key, message, sig));
    }
    assert_eq!(signed[16].1.public_root, keys[1].root);
}

#[test]
fn test_concurrent_verification() {
    let (scheme, pk, sig) = signed(4, b"shared");
    let scheme = Arc::new(scheme);
    let sig = Arc::new(sig);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let scheme = Arc::clone(&scheme);
            let sig = Arc::clone(&sig);
            thread::spawn(move || (0..5).all(|_| scheme.verify(&pk, b"shared", &sig)))
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("Verifier thread panicked"));
    }
}

#[test]
fn test_standalone_one_time_signature() {
    let scheme = scheme(2);
    let wots = scheme.wots();
    let key = [0x5a; 32];
    let public = wots.ots_public_key(&key);

    let sig = wots.ots_sign(&key, b"one-shot").expect("Failed to sign");
    assert!(wots.ots_verify(&public, b"one-shot", &sig));
    assert!(!wots.ots_verify(&public, b"two-shot", &sig));
}

#[test]
fn test_tweaked_scheme_round_trip() {
    let config = SchemeConfig {
        tweak: Some([0xee; 32]),
        ..SchemeConfig::new(3, Winternitz::W16)
    };
    let tweaked = XmssScheme::new(config).expect("Failed to create scheme");
    let mut pair = tweaked.key_pair_from_seed([1u8; 32]);
    let sig = tweaked
        .sign(&mut pair.private_key, b"tweaked")
        .expect("Failed to sign");

    assert!(tweaked.verify(&pair.public_key, b"tweaked", &sig));
    assert_ne!(pair.public_key, scheme(3).key_pair_from_seed([1u8; 32]).public_key);
}
