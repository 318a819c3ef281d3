//! SLIP-0010 hierarchical derivation for ed25519.
//!
//! Ed25519 only supports hardened children, so every path segment must carry
//! the `'` marker.

use crate::error::{AppError, AppResult};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

type HmacSha512 = Hmac<Sha512>;

/// The one derivation path this bot supports (Solana coin type 501).
pub const SOLANA_DERIVATION_PATH: &str = "m/44'/501'/0'/0'";

const HARDENED_OFFSET: u32 = 0x8000_0000;
const MASTER_HMAC_KEY: &[u8] = b"ed25519 seed";

/// Private key plus chain code at one node of the tree.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ExtendedKey {
    key: [u8; 32],
    chain_code: [u8; 32],
}

impl ExtendedKey {
    /// I = HMAC-SHA512(Key = "ed25519 seed", Data = seed)
    pub fn master(seed: &[u8]) -> AppResult<Self> {
        hmac_split(MASTER_HMAC_KEY, &[seed])
    }

    /// I = HMAC-SHA512(Key = chain_code, Data = 0x00 || key || ser32(index'))
    pub fn derive_hardened(&self, index: u32) -> AppResult<Self> {
        let hardened = (index | HARDENED_OFFSET).to_be_bytes();
        hmac_split(&self.chain_code, &[&[0x00], &self.key, &hardened])
    }

    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }
}

fn hmac_split(key: &[u8], parts: &[&[u8]]) -> AppResult<ExtendedKey> {
    let mut mac = <HmacSha512 as Mac>::new_from_slice(key)
        .map_err(|e| AppError::DerivationFailure(format!("hmac init: {}", e)))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());

    let mut extended = ExtendedKey {
        key: [0u8; 32],
        chain_code: [0u8; 32],
    };
    extended.key.copy_from_slice(&out[..32]);
    extended.chain_code.copy_from_slice(&out[32..]);
    Ok(extended)
}

/// Parse a fully-hardened path like `m/44'/501'/0'/0'` into raw indices.
pub fn parse_path(path: &str) -> AppResult<Vec<u32>> {
    let mut segments = path.split('/');
    if segments.next() != Some("m") {
        return Err(AppError::DerivationFailure(format!(
            "path must start with 'm': {}",
            path
        )));
    }

    segments
        .map(|segment| {
            let index = segment
                .strip_suffix('\'')
                .or_else(|| segment.strip_suffix('h'))
                .ok_or_else(|| {
                    AppError::DerivationFailure(format!(
                        "ed25519 requires hardened segments, got '{}'",
                        segment
                    ))
                })?;
            let index: u32 = index.parse().map_err(|_| {
                AppError::DerivationFailure(format!("bad path segment '{}'", segment))
            })?;
            if index >= HARDENED_OFFSET {
                return Err(AppError::DerivationFailure(format!(
                    "path index out of range: {}",
                    index
                )));
            }
            Ok(index)
        })
        .collect()
}

/// Walk `path` from the master node of `seed` and return the child key.
pub fn derive_path(seed: &[u8], path: &str) -> AppResult<Zeroizing<[u8; 32]>> {
    let mut node = ExtendedKey::master(seed)?;
    for index in parse_path(path)? {
        node = node.derive_hardened(index)?;
    }
    Ok(Zeroizing::new(*node.key()))
}

/// Child key on [`SOLANA_DERIVATION_PATH`].
pub fn derive_solana_seed(seed: &[u8]) -> AppResult<Zeroizing<[u8; 32]>> {
    derive_path(seed, SOLANA_DERIVATION_PATH)
}
