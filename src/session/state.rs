use crate::wallet::{KeyEncoding, KeyPair};
use custodybot_types::UserId;
use std::time::{Duration, Instant};
use zeroize::Zeroizing;

/// Where an import candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSource {
    Mnemonic,
    PrivateKey(KeyEncoding),
    /// Freshly generated by the bot; the phrase was shown to the user once
    Generated,
}

impl ImportSource {
    pub fn has_mnemonic(&self) -> bool {
        matches!(self, Self::Mnemonic | Self::Generated)
    }
}

/// A validated wallet waiting for the user's yes/no.
///
/// Holds the raw input so a mnemonic can be stored alongside the key. All of
/// it is wiped on drop.
#[derive(Clone)]
pub struct PendingImport {
    pub raw_input: Zeroizing<String>,
    pub source: ImportSource,
    pub keypair: KeyPair,
    /// Non-reversible rendering echoed in the confirmation prompt
    pub fragment: String,
}

impl std::fmt::Debug for PendingImport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingImport")
            .field("source", &self.source)
            .field("keypair", &self.keypair)
            .field("fragment", &self.fragment)
            .finish_non_exhaustive()
    }
}

/// Step of a multi-turn conversation. Idle has no variant: it is the absence
/// of a stored state.
#[derive(Debug, Clone)]
pub enum StateKind {
    AwaitingSeedPhrase,
    AwaitingPrivateKey,
    AwaitingSeedConfirmation(PendingImport),
    AwaitingKeyConfirmation(PendingImport),
    AwaitingBuyAmount { token_mint: String },
    AwaitingTokenQuery,
}

impl StateKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingSeedPhrase => "awaiting_seed_phrase",
            Self::AwaitingPrivateKey => "awaiting_private_key",
            Self::AwaitingSeedConfirmation(_) => "awaiting_seed_confirmation",
            Self::AwaitingKeyConfirmation(_) => "awaiting_key_confirmation",
            Self::AwaitingBuyAmount { .. } => "awaiting_buy_amount",
            Self::AwaitingTokenQuery => "awaiting_token_query",
        }
    }

    pub fn is_confirmation(&self) -> bool {
        matches!(
            self,
            Self::AwaitingSeedConfirmation(_) | Self::AwaitingKeyConfirmation(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    pub user_id: UserId,
    pub kind: StateKind,
    pub version: u64,
    pub touched_at: Instant,
}

impl ConversationState {
    pub fn new(user_id: UserId, kind: StateKind, version: u64) -> Self {
        Self {
            user_id,
            kind,
            version,
            touched_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.touched_at.elapsed() > ttl
    }
}

/// Result of reading a user's state.
#[derive(Debug)]
pub enum Lookup {
    Idle,
    Active(ConversationState),
    /// A state existed but outlived its TTL
    Expired,
}

impl Lookup {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active(state) => state.kind.name(),
            Self::Expired => "expired",
        }
    }
}
