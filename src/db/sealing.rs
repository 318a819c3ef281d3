//! Secret-at-rest sealing for wallet columns.
//!
//! Sealed form is `base64(nonce || ciphertext)` with a fresh random 12-byte
//! nonce per value, under a 32-byte ChaCha20-Poly1305 key.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum SealingError {
    #[error("Invalid base64 encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Key must be {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Sealed value is too short")]
    Truncated,

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed - tampered value or wrong key")]
    DecryptionFailed,

    #[error("Unsealed value is not UTF-8")]
    NotUtf8,
}

pub type SealingResult<T> = Result<T, SealingError>;

impl From<SealingError> for crate::error::AppError {
    fn from(err: SealingError) -> Self {
        Self::Sealing(err.to_string())
    }
}

/// Decode a base64 32-byte key.
pub fn decode_key(base64_key: &str) -> SealingResult<Zeroizing<[u8; KEY_LEN]>> {
    let bytes = Zeroizing::new(BASE64.decode(base64_key.trim())?);
    if bytes.len() != KEY_LEN {
        return Err(SealingError::InvalidKeyLength(bytes.len()));
    }
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&bytes);
    Ok(key)
}

/// Symmetric sealer for secret columns.
#[derive(Clone)]
pub struct Sealer {
    cipher: ChaCha20Poly1305,
}

impl std::fmt::Debug for Sealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Sealer(<key>)")
    }
}

impl Sealer {
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(key.into()),
        }
    }

    pub fn from_base64(base64_key: &str) -> SealingResult<Self> {
        let key = decode_key(base64_key)?;
        Ok(Self::new(&key))
    }

    pub fn seal(&self, plaintext: &str) -> SealingResult<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| SealingError::EncryptionFailed)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    pub fn open(&self, sealed: &str) -> SealingResult<Zeroizing<String>> {
        let raw = BASE64.decode(sealed)?;
        if raw.len() <= NONCE_LEN {
            return Err(SealingError::Truncated);
        }
        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| SealingError::DecryptionFailed)?;

        String::from_utf8(plaintext)
            .map(Zeroizing::new)
            .map_err(|_| SealingError::NotUtf8)
    }
}
