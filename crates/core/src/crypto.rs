//! AES-256-GCM encryption for stored OAuth tokens.
//!
//! Every encrypt call draws a fresh random 96-bit nonce and prepends it to
//! the sealed bytes (`nonce || ciphertext || tag`), so encrypting the same
//! plaintext twice never produces the same stored value. Decryption
//! authenticates the whole blob and rejects anything truncated, tampered
//! with, or sealed under a different key.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::Rng;

/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

/// Raw key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// The configured key is not 64 hex characters.
    #[error("cipher key must be {} hex characters", KEY_LEN * 2)]
    InvalidKey,

    /// Sealing failed (plaintext exceeded the AES-GCM length limit).
    #[error("encryption failed")]
    Encrypt,

    /// The stored bytes failed authentication: truncated, tampered with,
    /// or encrypted under a different key.
    #[error("ciphertext failed authentication")]
    Corrupt,
}

// ---------------------------------------------------------------------------
// TokenCipher
// ---------------------------------------------------------------------------

/// Seals and opens token material with a process-wide AES-256 key.
///
/// The key is injected at construction so tests can use a fixed one; nothing
/// in this module reads the environment.
#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher").finish_non_exhaustive()
    }
}

impl TokenCipher {
    /// Build a cipher from a 64-character hex key string.
    pub fn from_hex(hex_key: &str) -> Result<Self, CipherError> {
        let key = decode_hex_key(hex_key)?;
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CipherError::InvalidKey)?;
        Ok(Self { cipher })
    }

    /// Seal a plaintext token. Output layout: `nonce || ciphertext || tag`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CipherError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Open a sealed token previously produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
        if sealed.len() < NONCE_LEN {
            return Err(CipherError::Corrupt);
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CipherError::Corrupt)
    }

    /// Seal a UTF-8 string token.
    pub fn encrypt_str(&self, plaintext: &str) -> Result<Vec<u8>, CipherError> {
        self.encrypt(plaintext.as_bytes())
    }

    /// Open a sealed token and interpret the plaintext as UTF-8.
    pub fn decrypt_str(&self, sealed: &[u8]) -> Result<String, CipherError> {
        let bytes = self.decrypt(sealed)?;
        String::from_utf8(bytes).map_err(|_| CipherError::Corrupt)
    }
}

/// Decode a 64-character hex string into raw key bytes.
fn decode_hex_key(hex: &str) -> Result<[u8; KEY_LEN], CipherError> {
    if hex.len() != KEY_LEN * 2 {
        return Err(CipherError::InvalidKey);
    }
    let mut out = [0u8; KEY_LEN];
    for (i, chunk) in hex.as_bytes().chunks_exact(2).enumerate() {
        let hi = (chunk[0] as char).to_digit(16).ok_or(CipherError::InvalidKey)?;
        let lo = (chunk[1] as char).to_digit(16).ok_or(CipherError::InvalidKey)?;
        out[i] = ((hi << 4) | lo) as u8;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
