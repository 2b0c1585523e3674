//! Token encryption using AES-256-GCM.
//!
//! Notion access tokens are sealed before they reach the database and opened
//! on the way out. Sealed values are versioned strings of the form
//! `v1:<base64(nonce || ciphertext)>` with a fresh random nonce per seal.

#![allow(deprecated)]

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

const VERSION_PREFIX: &str = "v1:";
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Crypto error types
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: expected 32 bytes, got {length}")]
    KeyLength { length: usize },
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("invalid sealed token format")]
    InvalidFormat,
    #[error("sealed token is not valid UTF-8")]
    InvalidUtf8,
}

/// Secure wrapper for the encryption key with zeroization on drop.
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct CryptoKey(Vec<u8>);

impl CryptoKey {
    /// Create a new crypto key from bytes
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::KeyLength {
                length: bytes.len(),
            });
        }
        Ok(CryptoKey(bytes))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Seals and opens access tokens with a single service-wide key.
#[derive(Debug, Clone)]
pub struct TokenCipher {
    key: CryptoKey,
}

impl TokenCipher {
    pub fn new(key: CryptoKey) -> Self {
        Self { key }
    }

    /// Encrypts `plaintext` into a versioned sealed string.
    pub fn seal(&self, plaintext: &str) -> Result<String, CryptoError> {
        let cipher_key = Key::<Aes256Gcm>::from_slice(self.key.as_bytes());
        let cipher = Aes256Gcm::new(cipher_key);

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);

        Ok(format!("{}{}", VERSION_PREFIX, BASE64.encode(&combined)))
    }

    /// Opens a sealed string produced by [`seal`](Self::seal).
    ///
    /// An unknown version tag, truncated data, a wrong key, or tampered
    /// ciphertext all fail; this never returns attacker-controlled garbage.
    pub fn open(&self, sealed: &str) -> Result<String, CryptoError> {
        let encoded = sealed
            .strip_prefix(VERSION_PREFIX)
            .ok_or(CryptoError::InvalidFormat)?;
        let combined = BASE64
            .decode(encoded)
            .map_err(|_| CryptoError::InvalidFormat)?;

        if combined.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::InvalidFormat);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let cipher_key = Key::<Aes256Gcm>::from_slice(self.key.as_bytes());
        let cipher = Aes256Gcm::new(cipher_key);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        match String::from_utf8(plaintext) {
            Ok(token) => Ok(token),
            Err(err) => {
                let mut bytes = err.into_bytes();
                bytes.zeroize();
                Err(CryptoError::InvalidUtf8)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> TokenCipher {
        TokenCipher::new(CryptoKey::new(vec![7u8; 32]).expect("valid test key"))
    }

    #[test]
    fn seal_open_roundtrip() {
        let cipher = test_cipher();

        let sealed = cipher.seal("secret-notion-token").expect("seal succeeds");
        assert!(sealed.starts_with("v1:"));
        assert!(!sealed.contains("secret-notion-token"));

        let opened = cipher.open(&sealed).expect("open succeeds");
        assert_eq!(opened, "secret-notion-token");
    }

    #[test]
    fn fresh_nonce_per_seal() {
        let cipher = test_cipher();

        let first = cipher.seal("same-token").expect("seal succeeds");
        let second = cipher.seal("same-token").expect("seal succeeds");

        assert_ne!(first, second);
        assert_eq!(cipher.open(&first).unwrap(), "same-token");
        assert_eq!(cipher.open(&second).unwrap(), "same-token");
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let cipher = test_cipher();
        let sealed = cipher.seal("secret").expect("seal succeeds");

        let mut combined = BASE64.decode(&sealed[3..]).unwrap();
        let last = combined.len() - 1;
        combined[last] ^= 0x01;
        let tampered = format!("v1:{}", BASE64.encode(&combined));

        assert!(matches!(
            cipher.open(&tampered),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let sealed = test_cipher().seal("secret").expect("seal succeeds");

        let other = TokenCipher::new(CryptoKey::new(vec![9u8; 32]).unwrap());
        assert!(matches!(
            other.open(&sealed),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let cipher = test_cipher();

        assert!(matches!(
            cipher.open("v2:AAAA"),
            Err(CryptoError::InvalidFormat)
        ));
        assert!(matches!(
            cipher.open("plaintext-token"),
            Err(CryptoError::InvalidFormat)
        ));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let cipher = test_cipher();
        let short = format!("v1:{}", BASE64.encode([0u8; 8]));

        assert!(matches!(
            cipher.open(&short),
            Err(CryptoError::InvalidFormat)
        ));
    }

    #[test]
    fn key_length_is_enforced() {
        assert!(matches!(
            CryptoKey::new(vec![0u8; 16]),
            Err(CryptoError::KeyLength { length: 16 })
        ));
        assert!(matches!(
            CryptoKey::new(vec![0u8; 64]),
            Err(CryptoError::KeyLength { length: 64 })
        ));
    }
}
