use super::derivation::derive_solana_seed;
use super::parse::{parse_private_key, KeyEncoding};
use super::KeyPair;
use crate::error::{AppError, AppResult};
use bip39::{Language, Mnemonic};
use rand::RngCore;
use tracing::{debug, error};
use zeroize::{Zeroize, Zeroizing};

/// Mnemonic lengths accepted on import (BIP-39 allows 12..=24 in steps of 3).
const ACCEPTED_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// 128 bits of entropy = 12 words, what mainstream Solana wallets hand out.
const GENERATED_ENTROPY_BYTES: usize = 16;

/// A freshly generated wallet. The phrase is zeroized on drop.
pub struct GeneratedWallet {
    pub keypair: KeyPair,
    pub mnemonic: Zeroizing<String>,
}

impl std::fmt::Debug for GeneratedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedWallet")
            .field("keypair", &self.keypair)
            .finish_non_exhaustive()
    }
}

/// Stateless entry point for all key material operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyMaterial;

impl KeyMaterial {
    pub fn new() -> Self {
        Self
    }

    /// Generate a new 12-word wallet from OS entropy.
    pub fn generate(&self) -> AppResult<GeneratedWallet> {
        let mut entropy = [0u8; GENERATED_ENTROPY_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut entropy);
        let result = self.generate_with_entropy(&entropy);
        entropy.zeroize();
        result
    }

    /// Deterministic core of [`generate`](Self::generate).
    ///
    /// The produced phrase is parsed back before use; a phrase that does not
    /// survive its own validation is never returned.
    pub fn generate_with_entropy(&self, entropy: &[u8]) -> AppResult<GeneratedWallet> {
        let mnemonic = Mnemonic::from_entropy(entropy)
            .map_err(|e| AppError::DerivationFailure(format!("mnemonic from entropy: {}", e)))?;
        let phrase = Zeroizing::new(mnemonic.to_string());

        let validated = Mnemonic::parse_in_normalized(Language::English, &phrase).map_err(|e| {
            error!("Generated mnemonic failed validation: {}", e);
            AppError::DerivationFailure("generated mnemonic failed validation".into())
        })?;

        let keypair = keypair_from_mnemonic(&validated)?;
        debug!("Generated wallet {}", keypair.public_key_base58());

        Ok(GeneratedWallet {
            keypair,
            mnemonic: phrase,
        })
    }

    /// Derive the wallet for an existing phrase.
    ///
    /// Input is normalized first, so case and spacing differences map to the
    /// same keypair.
    pub fn derive_from_mnemonic(&self, phrase: &str) -> AppResult<KeyPair> {
        let normalized = Zeroizing::new(normalize_mnemonic(phrase));

        let word_count = normalized.split(' ').filter(|w| !w.is_empty()).count();
        if !ACCEPTED_WORD_COUNTS.contains(&word_count) {
            return Err(AppError::InvalidMnemonic(format!(
                "expected 12, 15, 18, 21 or 24 words, got {}",
                word_count
            )));
        }

        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalized)
            .map_err(|e| AppError::InvalidMnemonic(describe_bip39_error(&e)))?;

        keypair_from_mnemonic(&mnemonic)
    }

    /// Parse a pasted private key. See [`parse_private_key`] for precedence.
    pub fn parse_private_key(&self, input: &str) -> AppResult<(KeyPair, KeyEncoding)> {
        parse_private_key(input)
    }
}

/// Trim, lowercase, and collapse runs of whitespace to single spaces.
pub fn normalize_mnemonic(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn keypair_from_mnemonic(mnemonic: &Mnemonic) -> AppResult<KeyPair> {
    let seed = Zeroizing::new(mnemonic.to_seed_normalized(""));
    let child = derive_solana_seed(&seed[..])?;
    Ok(KeyPair::from_seed(&child))
}

// bip39 errors carry positions, never the words themselves.
fn describe_bip39_error(err: &bip39::Error) -> String {
    match err {
        bip39::Error::BadWordCount(n) => format!("unsupported word count {}", n),
        bip39::Error::UnknownWord(idx) => {
            format!("word #{} is not in the BIP-39 English list", idx + 1)
        }
        bip39::Error::InvalidChecksum => "checksum mismatch".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_PHRASE: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate_produces_12_words() {
        let wallet = KeyMaterial::new().generate().unwrap();
        assert_eq!(wallet.mnemonic.split(' ').count(), 12);
    }

    #[test]
    fn test_generate_round_trips_through_import() {
        let engine = KeyMaterial::new();
        let wallet = engine.generate().unwrap();
        let derived = engine.derive_from_mnemonic(&wallet.mnemonic).unwrap();
        assert_eq!(derived, wallet.keypair);
    }

    #[test]
    fn test_generate_with_entropy_is_deterministic() {
        let engine = KeyMaterial::new();
        let a = engine.generate_with_entropy(&[0u8; 16]).unwrap();
        let b = engine.generate_with_entropy(&[0u8; 16]).unwrap();
        assert_eq!(a.keypair, b.keypair);
        assert_eq!(a.mnemonic.as_str(), TEST_PHRASE);
    }

    #[test]
    fn test_generate_rejects_bad_entropy_length() {
        let result = KeyMaterial::new().generate_with_entropy(&[0u8; 7]);
        assert!(matches!(result, Err(AppError::DerivationFailure(_))));
    }

    #[test]
    fn test_derive_ignores_case_and_spacing() {
        let engine = KeyMaterial::new();
        let canonical = engine.derive_from_mnemonic(TEST_PHRASE).unwrap();
        let messy = format!("  {}  ", TEST_PHRASE.to_uppercase().replace(' ', " \t\n "));
        assert_eq!(engine.derive_from_mnemonic(&messy).unwrap(), canonical);
    }

    #[test]
    fn test_derive_rejects_short_phrase() {
        let result = KeyMaterial::new().derive_from_mnemonic("abandon abandon about");
        assert!(matches!(result, Err(AppError::InvalidMnemonic(_))));
    }

    #[test]
    fn test_derive_rejects_unknown_word() {
        let phrase = TEST_PHRASE.replace("about", "zzzzzz");
        match KeyMaterial::new().derive_from_mnemonic(&phrase) {
            Err(AppError::InvalidMnemonic(reason)) => assert!(!reason.contains("zzzzzz")),
            other => panic!("expected InvalidMnemonic, got {:?}", other),
        }
    }

    #[test]
    fn test_derive_rejects_bad_checksum() {
        let phrase = TEST_PHRASE.replace("about", "abandon");
        assert!(matches!(
            KeyMaterial::new().derive_from_mnemonic(&phrase),
            Err(AppError::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn test_normalize_mnemonic() {
        assert_eq!(normalize_mnemonic("  Foo \t BAR\nbaz "), "foo bar baz");
        assert_eq!(normalize_mnemonic(""), "");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(s in "[a-zA-Z \t\n]{0,64}") {
            let once = normalize_mnemonic(&s);
            prop_assert_eq!(normalize_mnemonic(&once), once);
        }

        #[test]
        fn prop_derivation_is_idempotent(entropy in proptest::collection::vec(any::<u8>(), 16)) {
            let engine = KeyMaterial::new();
            let wallet = engine.generate_with_entropy(&entropy).unwrap();
            let first = engine.derive_from_mnemonic(&wallet.mnemonic).unwrap();
            let second = engine.derive_from_mnemonic(&wallet.mnemonic).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
