//! Key material engine.
//!
//! Turns untrusted user text into a validated ed25519 keypair:
//!
//! - [`KeyMaterial::generate`] creates a fresh 12-word BIP-39 wallet
//! - [`KeyMaterial::derive_from_mnemonic`] re-derives a wallet from a phrase
//! - [`KeyMaterial::parse_private_key`] accepts Base58, JSON array, or
//!   comma-separated secret keys, in that order of precedence
//!
//! Every mnemonic goes through the single hardened path `m/44'/501'/0'/0'`.
//! Nothing here touches the network.

pub mod derivation;
pub mod keygen;
pub mod parse;
pub mod redact;

pub use derivation::SOLANA_DERIVATION_PATH;
pub use keygen::{normalize_mnemonic, GeneratedWallet, KeyMaterial};
pub use parse::{parse_private_key, KeyEncoding};
pub use redact::{mnemonic_fragment, redact};

use crate::error::{AppError, AppResult};
use ed25519_dalek::SigningKey;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const PUBLIC_KEY_LEN: usize = 32;
pub const SECRET_KEY_LEN: usize = 64;

/// Ed25519 keypair in the Solana layout: the 64-byte secret key is the
/// 32-byte seed followed by the 32-byte public key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    public_key: [u8; PUBLIC_KEY_LEN],
    secret_key: [u8; SECRET_KEY_LEN],
}

impl KeyPair {
    /// Build a keypair from a 32-byte ed25519 seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self {
            public_key: signing_key.verifying_key().to_bytes(),
            secret_key: signing_key.to_keypair_bytes(),
        }
    }

    /// Build a keypair from 64 secret-key bytes, checking that the trailing
    /// public key half matches the seed half.
    pub fn from_secret_bytes(bytes: &[u8]) -> AppResult<Self> {
        let mut raw: [u8; SECRET_KEY_LEN] = bytes.try_into().map_err(|_| {
            AppError::UnrecognizedKeyFormat(format!(
                "expected {} bytes, got {}",
                SECRET_KEY_LEN,
                bytes.len()
            ))
        })?;
        let result = SigningKey::from_keypair_bytes(&raw);
        raw.zeroize();
        let signing_key = result.map_err(|_| {
            AppError::UnrecognizedKeyFormat("public key half does not match secret".into())
        })?;

        Ok(Self {
            public_key: signing_key.verifying_key().to_bytes(),
            secret_key: signing_key.to_keypair_bytes(),
        })
    }

    pub fn public_key_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    pub fn secret_key_bytes(&self) -> &[u8; SECRET_KEY_LEN] {
        &self.secret_key
    }

    /// Base58 address
    pub fn public_key_base58(&self) -> String {
        bs58::encode(self.public_key).into_string()
    }

    /// Base58 of the full 64-byte secret key (Phantom/Solflare export format)
    pub fn secret_key_base58(&self) -> String {
        bs58::encode(self.secret_key).into_string()
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key && self.secret_key == other.secret_key
    }
}

impl Eq for KeyPair {}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_base58())
            .finish_non_exhaustive()
    }
}

/// Check that `input` is a Base58 string of a 32-byte public key.
pub fn is_valid_public_key(input: &str) -> bool {
    matches!(
        bs58::decode(input.trim()).into_vec(),
        Ok(bytes) if bytes.len() == PUBLIC_KEY_LEN
    )
}
