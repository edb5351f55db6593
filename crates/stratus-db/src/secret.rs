//! AES-256-GCM encryption for tenant database passwords at rest.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use stratus_core::error::StratusError;

/// Encrypts/decrypts tenant database passwords stored in the catalog.
#[derive(Clone)]
pub struct PasswordCipher {
    key: [u8; 32],
}

impl PasswordCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Encrypt a plaintext password.
    ///
    /// Returns `base64(nonce || ciphertext || tag)`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, StratusError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| StratusError::Crypto(format!("AES-GCM encrypt: {e}")))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(combined))
    }

    /// Decrypt an encrypted password back to plaintext.
    pub fn decrypt(&self, encoded: &str) -> Result<String, StratusError> {
        let combined = STANDARD
            .decode(encoded)
            .map_err(|e| StratusError::Crypto(format!("base64 decode: {e}")))?;

        if combined.len() < 13 {
            return Err(StratusError::Crypto("ciphertext too short".into()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(12);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| StratusError::Crypto(format!("AES-GCM decrypt: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| StratusError::Crypto(format!("decrypted password not UTF-8: {e}")))
    }
}
