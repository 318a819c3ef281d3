//! Pure routing: (current state, inbound event) -> action.
//!
//! Nothing here performs I/O. The handler executes the returned [`Action`]
//! and writes whatever next state it implies.

use super::state::{Lookup, PendingImport, StateKind};
use crate::error::{AppError, AppResult};
use crate::wallet::is_valid_public_key;
use custodybot_types::{EventKind, InboundEvent};
use zeroize::Zeroizing;

/// Button action tags.
pub mod tag {
    pub const IMPORT_SEED: &str = "import_seed";
    pub const ENTER_SEED_PHRASE: &str = "enter_seed_phrase";
    pub const IMPORT_PRIVATE: &str = "import_private";
    pub const ENTER_PRIVATE_KEY: &str = "enter_private_key";
    pub const GENERATE_WALLET: &str = "generate_wallet";
    pub const GENERATE_SEED_PHRASE: &str = "generate_seed_phrase";
    pub const BUY: &str = "buy";
    pub const ANALYZE: &str = "analyze";
    pub const AI_ANALYSIS: &str = "ai_analysis";
    pub const MAIN_MENU: &str = "main_menu";
    pub const WALLET: &str = "wallet";
    pub const SHOW_WALLET: &str = "show_wallet";
    pub const BALANCE: &str = "balance";
    pub const CONNECT_WALLET: &str = "connect_wallet";
    pub const HELP: &str = "help";
    pub const CONFIRM_YES: &str = "confirm_yes";
    pub const CONFIRM_NO: &str = "confirm_no";

    pub const BUY_PREFIX: &str = "buy_";
    pub const QUICK_BUY_PREFIX: &str = "quick_buy_";
    pub const ANALYZE_PREFIX: &str = "analyze_";

    pub fn buy(mint: &str) -> String {
        format!("{}{}", BUY_PREFIX, mint)
    }

    pub fn quick_buy(mint: &str) -> String {
        format!("{}{}", QUICK_BUY_PREFIX, mint)
    }
}

/// Why the bot asks for a token address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenQueryPurpose {
    Buy,
    Analyze,
}

/// What the handler should do next.
pub enum Action {
    // flow entry points
    StartSeedImport,
    StartKeyImport,
    GenerateWallet,
    StartTokenQuery(TokenQueryPurpose),
    PromptBuyAmount { token_mint: String },

    // stateless
    ShowMainMenu,
    ShowWallet,
    ShowBalance,
    ShowConnectOptions,
    ShowHelp,
    AnalyzeToken { token_mint: String },

    // input inside a flow
    ImportMnemonic { input: Zeroizing<String>, version: u64 },
    ImportPrivateKey { input: Zeroizing<String>, version: u64 },
    ConfirmImport(PendingImport),
    /// The pending import is dropped. `then` is a different button pressed
    /// instead of answering, handled after the cancellation notice.
    DeclineImport {
        pending: PendingImport,
        then: Option<Box<Action>>,
    },
    SubmitBuy { token_mint: String, amount_sol: f64 },
    RejectBuyAmount { token_mint: String, reason: String },
    RejectTokenQuery,
    Cancelled,

    // fallbacks
    SessionExpired,
    NothingToConfirm,
    UnknownAction,
    UnknownCommand,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartSeedImport => "start_seed_import",
            Self::StartKeyImport => "start_key_import",
            Self::GenerateWallet => "generate_wallet",
            Self::StartTokenQuery(_) => "start_token_query",
            Self::PromptBuyAmount { .. } => "prompt_buy_amount",
            Self::ShowMainMenu => "show_main_menu",
            Self::ShowWallet => "show_wallet",
            Self::ShowBalance => "show_balance",
            Self::ShowConnectOptions => "show_connect_options",
            Self::ShowHelp => "show_help",
            Self::AnalyzeToken { .. } => "analyze_token",
            Self::ImportMnemonic { .. } => "import_mnemonic",
            Self::ImportPrivateKey { .. } => "import_private_key",
            Self::ConfirmImport(_) => "confirm_import",
            Self::DeclineImport { .. } => "decline_import",
            Self::SubmitBuy { .. } => "submit_buy",
            Self::RejectBuyAmount { .. } => "reject_buy_amount",
            Self::RejectTokenQuery => "reject_token_query",
            Self::Cancelled => "cancelled",
            Self::SessionExpired => "session_expired",
            Self::NothingToConfirm => "nothing_to_confirm",
            Self::UnknownAction => "unknown_action",
            Self::UnknownCommand => "unknown_command",
        }
    }
}

// Some variants carry what the user just typed.
impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Decide what an event means given the user's current state.
pub fn route(state: Lookup, event: &InboundEvent) -> Action {
    match state {
        Lookup::Idle => route_idle(event),
        Lookup::Expired => Action::SessionExpired,
        Lookup::Active(current) => route_active(current.kind, current.version, event),
    }
}

fn route_idle(event: &InboundEvent) -> Action {
    match event.kind {
        EventKind::ButtonPress => route_button(&event.payload),
        EventKind::Text => route_command(&event.payload),
    }
}

fn route_active(kind: StateKind, version: u64, event: &InboundEvent) -> Action {
    match (kind, event.kind) {
        (StateKind::AwaitingSeedConfirmation(pending), EventKind::ButtonPress)
        | (StateKind::AwaitingKeyConfirmation(pending), EventKind::ButtonPress) => {
            if event.payload == tag::CONFIRM_YES {
                Action::ConfirmImport(pending)
            } else if event.payload == tag::CONFIRM_NO {
                Action::DeclineImport { pending, then: None }
            } else {
                Action::DeclineImport {
                    pending,
                    then: Some(Box::new(route_button(&event.payload))),
                }
            }
        }
        (StateKind::AwaitingSeedConfirmation(pending), EventKind::Text)
        | (StateKind::AwaitingKeyConfirmation(pending), EventKind::Text) => {
            if is_affirmative(&event.payload) {
                Action::ConfirmImport(pending)
            } else {
                Action::DeclineImport { pending, then: None }
            }
        }

        // Any other button abandons the flow.
        (_, EventKind::ButtonPress) => route_button(&event.payload),

        (_, EventKind::Text) if is_cancel(&event.payload) => Action::Cancelled,

        (StateKind::AwaitingSeedPhrase, EventKind::Text) => Action::ImportMnemonic {
            input: Zeroizing::new(event.payload.clone()),
            version,
        },
        (StateKind::AwaitingPrivateKey, EventKind::Text) => Action::ImportPrivateKey {
            input: Zeroizing::new(event.payload.clone()),
            version,
        },
        (StateKind::AwaitingBuyAmount { token_mint }, EventKind::Text) => {
            match parse_buy_amount(&event.payload) {
                Ok(amount_sol) => Action::SubmitBuy {
                    token_mint,
                    amount_sol,
                },
                Err(e) => Action::RejectBuyAmount {
                    token_mint,
                    reason: e.to_string(),
                },
            }
        }
        (StateKind::AwaitingTokenQuery, EventKind::Text) => {
            let candidate = event.payload.trim();
            if is_valid_public_key(candidate) {
                Action::AnalyzeToken {
                    token_mint: candidate.to_string(),
                }
            } else {
                Action::RejectTokenQuery
            }
        }
    }
}

fn route_button(action: &str) -> Action {
    match action {
        tag::IMPORT_SEED | tag::ENTER_SEED_PHRASE => Action::StartSeedImport,
        tag::IMPORT_PRIVATE | tag::ENTER_PRIVATE_KEY => Action::StartKeyImport,
        tag::GENERATE_WALLET | tag::GENERATE_SEED_PHRASE => Action::GenerateWallet,
        tag::BUY => Action::StartTokenQuery(TokenQueryPurpose::Buy),
        tag::ANALYZE | tag::AI_ANALYSIS => Action::StartTokenQuery(TokenQueryPurpose::Analyze),
        tag::MAIN_MENU => Action::ShowMainMenu,
        tag::WALLET | tag::SHOW_WALLET => Action::ShowWallet,
        tag::BALANCE => Action::ShowBalance,
        tag::CONNECT_WALLET => Action::ShowConnectOptions,
        tag::HELP => Action::ShowHelp,
        tag::CONFIRM_YES | tag::CONFIRM_NO => Action::NothingToConfirm,
        other => route_prefixed_button(other),
    }
}

fn route_prefixed_button(action: &str) -> Action {
    let buy_mint = action
        .strip_prefix(tag::QUICK_BUY_PREFIX)
        .or_else(|| action.strip_prefix(tag::BUY_PREFIX));
    if let Some(mint) = buy_mint {
        return if is_valid_public_key(mint) {
            Action::PromptBuyAmount {
                token_mint: mint.to_string(),
            }
        } else {
            Action::UnknownAction
        };
    }

    match action.strip_prefix(tag::ANALYZE_PREFIX) {
        Some(mint) if is_valid_public_key(mint) => Action::AnalyzeToken {
            token_mint: mint.to_string(),
        },
        _ => Action::UnknownAction,
    }
}

fn route_command(text: &str) -> Action {
    let text = text.trim();
    match command_name(text) {
        Some("start") => Action::ShowMainMenu,
        Some("wallet") => Action::ShowWallet,
        Some("balance") => Action::ShowBalance,
        Some("help") => Action::ShowHelp,
        Some(_) => Action::UnknownCommand,
        None if is_valid_public_key(text) => Action::AnalyzeToken {
            token_mint: text.to_string(),
        },
        None => Action::UnknownCommand,
    }
}

/// `/start@my_bot payload` -> `start`
fn command_name(text: &str) -> Option<&str> {
    let head = text.strip_prefix('/')?.split_whitespace().next()?;
    Some(head.split('@').next().unwrap_or(head))
}

fn is_cancel(text: &str) -> bool {
    command_name(text.trim()) == Some("cancel")
}

/// Trimmed, case-insensitive "yes".
pub fn is_affirmative(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("yes")
}

/// A finite SOL amount strictly greater than zero.
pub fn parse_buy_amount(text: &str) -> AppResult<f64> {
    let trimmed = text.trim();
    let amount: f64 = trimmed
        .parse()
        .map_err(|_| AppError::InvalidNumericInput("not a number".into()))?;
    if !amount.is_finite() {
        return Err(AppError::InvalidNumericInput("amount must be finite".into()));
    }
    if amount <= 0.0 {
        return Err(AppError::InvalidNumericInput(
            "amount must be greater than 0".into(),
        ));
    }
    Ok(amount)
}
