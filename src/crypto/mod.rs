//! Cryptographic provider for the ledger
//!
//! This module provides:
//! - SHA-256 hashing
//! - RSA key management (PKCS#1 v1.5 SHA256withRSA signatures)
//! - RSA encryption helpers

pub mod hash;
pub mod keys;

pub use hash::{sha256, sha256_hex, sha256_hex_chunks};
pub use keys::{
    decrypt, encrypt, sign, verify, KeyError, KeyPair, PrivateKey, PublicKey, RSA_KEY_BITS,
};
