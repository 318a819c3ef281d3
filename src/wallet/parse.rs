//! Ordered-fallback private key parser.
//!
//! Wallet apps export the same 64-byte secret in different shapes. Input is
//! tried against each [`KeyEncoding`] in [`KeyEncoding::PRECEDENCE`] order and
//! the first interpretation that decodes to a valid keypair wins. Text that
//! happens to be valid under an earlier encoding never reaches a later one.

use super::{KeyPair, SECRET_KEY_LEN};
use crate::error::{AppError, AppResult};
use tracing::debug;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEncoding {
    /// Base58 of the raw secret key bytes (Phantom, Solflare export)
    Base58,
    /// `[12,34,...]`, the solana-keygen JSON file format
    JsonArray,
    /// `12,34,...` without brackets
    CommaSeparated,
}

impl KeyEncoding {
    /// Attempt order. Changing it changes how ambiguous input is read.
    pub const PRECEDENCE: [KeyEncoding; 3] = [
        KeyEncoding::Base58,
        KeyEncoding::JsonArray,
        KeyEncoding::CommaSeparated,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Base58 => "base58",
            Self::JsonArray => "json array",
            Self::CommaSeparated => "comma-separated",
        }
    }

    /// Decode `input` under this encoding. Errors describe shape only.
    fn decode(&self, input: &str) -> Result<Zeroizing<Vec<u8>>, String> {
        let bytes = match self {
            Self::Base58 => bs58::decode(input)
                .into_vec()
                .map_err(|_| "not valid base58".to_string())?,
            Self::JsonArray => {
                if !input.starts_with('[') {
                    return Err("not a JSON array".to_string());
                }
                serde_json::from_str::<Vec<u8>>(input)
                    .map_err(|_| "not a JSON array of bytes".to_string())?
            }
            Self::CommaSeparated => input
                .split(',')
                .map(|v| v.trim().parse::<u8>())
                .collect::<Result<Vec<u8>, _>>()
                .map_err(|_| "not comma-separated bytes".to_string())?,
        };
        let bytes = Zeroizing::new(bytes);

        if bytes.len() != SECRET_KEY_LEN {
            return Err(format!(
                "decoded {} bytes, expected {}",
                bytes.len(),
                SECRET_KEY_LEN
            ));
        }
        Ok(bytes)
    }
}

impl std::fmt::Display for KeyEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse a private key from untyped text.
///
/// Returns the keypair and the encoding that matched, or
/// `UnrecognizedKeyFormat` listing why each encoding was rejected.
pub fn parse_private_key(input: &str) -> AppResult<(KeyPair, KeyEncoding)> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AppError::UnrecognizedKeyFormat("empty input".into()));
    }

    let mut failures = Vec::with_capacity(KeyEncoding::PRECEDENCE.len());
    for encoding in KeyEncoding::PRECEDENCE {
        let attempt = encoding.decode(input).and_then(|bytes| {
            KeyPair::from_secret_bytes(&bytes).map_err(|_| "not a valid ed25519 keypair".to_string())
        });

        match attempt {
            Ok(keypair) => {
                debug!(
                    "Parsed private key as {} for {}",
                    encoding,
                    keypair.public_key_base58()
                );
                return Ok((keypair, encoding));
            }
            Err(reason) => failures.push(format!("{}: {}", encoding, reason)),
        }
    }

    Err(AppError::UnrecognizedKeyFormat(failures.join("; ")))
}
