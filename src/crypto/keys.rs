//! RSA key management for the ledger
//!
//! Provides key pair generation, PKCS#1 v1.5 SHA256withRSA signing and
//! verification, and RSA encryption. Public keys travel as base64-encoded
//! X.509 SubjectPublicKeyInfo DER, which is also the form embedded in
//! serialized outputs.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

use super::hash::sha256_hex;

/// Modulus size used for newly generated key pairs
pub const RSA_KEY_BITS: usize = 2048;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature encoding")]
    InvalidSignature,
    #[error("Invalid ciphertext encoding")]
    InvalidCiphertext,
    #[error("Decrypted message is not valid UTF-8")]
    InvalidPlaintext,
    #[error("Public key encoding failed: {0}")]
    Encoding(#[from] rsa::pkcs8::spki::Error),
    #[error("Signing failed: {0}")]
    Signing(#[from] rsa::signature::Error),
    #[error("RSA error: {0}")]
    Rsa(#[from] rsa::Error),
}

/// An RSA public key together with its canonical base64 encoding
#[derive(Clone)]
pub struct PublicKey {
    key: RsaPublicKey,
    encoded: String,
}

impl PublicKey {
    /// Wrap an RSA public key, computing its X.509 base64 encoding
    pub fn from_rsa(key: RsaPublicKey) -> Result<Self, KeyError> {
        let der = key.to_public_key_der()?;
        let encoded = BASE64.encode(der.as_bytes());
        Ok(Self { key, encoded })
    }

    /// Parse a base64-encoded X.509 public key
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|_| KeyError::InvalidPublicKey)?;
        let key =
            RsaPublicKey::from_public_key_der(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::from_rsa(key)
    }

    /// Canonical base64 encoding of the key
    pub fn to_base64(&self) -> &str {
        &self.encoded
    }

    /// Short identifier for display purposes
    pub fn fingerprint(&self) -> String {
        sha256_hex(self.encoded.as_bytes())[..10].to_string()
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for PublicKey {}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.fingerprint())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        PublicKey::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// An RSA private key
#[derive(Clone)]
pub struct PrivateKey {
    key: RsaPrivateKey,
}

impl PrivateKey {
    pub fn from_rsa(key: RsaPrivateKey) -> Self {
        Self { key }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

impl KeyPair {
    /// Generate a new random RSA-2048 key pair
    pub fn generate() -> Result<Self, KeyError> {
        Self::generate_with_bits(RSA_KEY_BITS)
    }

    /// Generate a new random key pair with the given modulus size
    pub fn generate_with_bits(bits: usize) -> Result<Self, KeyError> {
        let private = RsaPrivateKey::new(&mut OsRng, bits)?;
        let public_key = PublicKey::from_rsa(private.to_public_key())?;
        Ok(Self {
            public_key,
            private_key: PrivateKey::from_rsa(private),
        })
    }

    /// Sign a message with the private key
    pub fn sign(&self, message: &str) -> Result<String, KeyError> {
        sign(message, &self.private_key)
    }

    /// Verify a signature against this key pair's public key
    pub fn verify(&self, message: &str, signature: &str) -> Result<bool, KeyError> {
        verify(message, signature, &self.public_key)
    }
}

/// Sign a UTF-8 message, returning the base64 signature
pub fn sign(message: &str, private_key: &PrivateKey) -> Result<String, KeyError> {
    let signing_key = SigningKey::<Sha256>::new(private_key.key.clone());
    let signature = signing_key.try_sign(message.as_bytes())?;
    Ok(BASE64.encode(signature.to_bytes()))
}

/// Verify a base64 signature over a UTF-8 message
///
/// A well-formed signature that does not match yields `Ok(false)`; a
/// signature that cannot even be decoded is an error.
pub fn verify(message: &str, signature: &str, public_key: &PublicKey) -> Result<bool, KeyError> {
    let bytes = BASE64
        .decode(signature)
        .map_err(|_| KeyError::InvalidSignature)?;
    let signature = Signature::try_from(bytes.as_slice()).map_err(|_| KeyError::InvalidSignature)?;

    let verifying_key = VerifyingKey::<Sha256>::new(public_key.key.clone());
    Ok(verifying_key.verify(message.as_bytes(), &signature).is_ok())
}

/// Encrypt a UTF-8 message with PKCS#1 v1.5 padding, returning base64
pub fn encrypt(message: &str, public_key: &PublicKey) -> Result<String, KeyError> {
    let ciphertext = public_key
        .key
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, message.as_bytes())?;
    Ok(BASE64.encode(ciphertext))
}

/// Decrypt a base64 ciphertext produced by [`encrypt`]
pub fn decrypt(ciphertext: &str, private_key: &PrivateKey) -> Result<String, KeyError> {
    let bytes = BASE64
        .decode(ciphertext)
        .map_err(|_| KeyError::InvalidCiphertext)?;
    let plaintext = private_key.key.decrypt(Pkcs1v15Encrypt, &bytes)?;
    String::from_utf8(plaintext).map_err(|_| KeyError::InvalidPlaintext)
}

/// Key pairs shared by every test in the crate. RSA-2048 generation is slow,
/// so they are created once per test binary.
#[cfg(test)]
pub(crate) fn test_key_pair(slot: usize) -> &'static KeyPair {
    use std::sync::OnceLock;

    static KEYS: OnceLock<Vec<KeyPair>> = OnceLock::new();
    let keys = KEYS.get_or_init(|| {
        (0..3)
            .map(|_| KeyPair::generate().expect("key generation"))
            .collect()
    });
    &keys[slot]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let kp = test_key_pair(0);
        let signature = kp.sign("Hello, ledger!").unwrap();

        assert!(kp.verify("Hello, ledger!", &signature).unwrap());
        assert!(!kp.verify("Hello, ledger?", &signature).unwrap());
    }

    #[test]
    fn test_signature_from_other_key_fails() {
        let signer = test_key_pair(0);
        let other = test_key_pair(1);
        let signature = signer.sign("payload").unwrap();

        assert!(!verify("payload", &signature, &other.public_key).unwrap());
    }

    #[test]
    fn test_malformed_signature_is_error() {
        let kp = test_key_pair(0);
        assert!(matches!(
            kp.verify("payload", "Bad Signature"),
            Err(KeyError::InvalidSignature)
        ));
    }

    #[test]
    fn test_public_key_base64_round_trip() {
        let kp = test_key_pair(1);
        let encoded = kp.public_key.to_base64();

        let parsed = PublicKey::from_base64(encoded).unwrap();
        assert_eq!(parsed, kp.public_key);
        assert!(!encoded.contains('_'));
    }

    #[test]
    fn test_invalid_public_key() {
        assert!(matches!(
            PublicKey::from_base64("not a key"),
            Err(KeyError::InvalidPublicKey)
        ));
        assert!(matches!(
            PublicKey::from_base64("AAAA"),
            Err(KeyError::InvalidPublicKey)
        ));
    }

    #[test]
    fn test_encrypt_and_decrypt() {
        let kp = test_key_pair(2);
        let ciphertext = encrypt("secret message", &kp.public_key).unwrap();

        assert_ne!(ciphertext, "secret message");
        assert_eq!(decrypt(&ciphertext, &kp.private_key).unwrap(), "secret message");
    }

    #[test]
    fn test_public_key_serde() {
        let kp = test_key_pair(0);
        let json = serde_json::to_string(&kp.public_key).unwrap();
        let parsed: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, kp.public_key);
    }
}
