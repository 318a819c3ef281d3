//! Reply texts. All output is Telegram HTML; anything that did not come from
//! this file goes through [`escape`].

use crate::session::TokenQueryPurpose;
use crate::wallet::KeyEncoding;

/// Escape `<`, `>` and `&` for Telegram's HTML parse mode.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            other => out.push(other),
        }
    }
    out
}

pub fn welcome(wallet: Option<&str>) -> String {
    let mut message = String::from("👋 <b>Welcome!</b>\n\n");
    match wallet {
        Some(address) => {
            message.push_str("🔐 <b>Your wallet:</b>\n");
            message.push_str(&format!("<code>{}</code>\n\n", escape(address)));
        }
        None => {
            message.push_str("🔐 <b>Wallet:</b> not connected\n");
            message.push_str("Connect an existing wallet or generate a new one to get started.\n\n");
        }
    }
    message.push_str("Choose an option below, or paste a token address to look it up.");
    message
}

pub fn help() -> String {
    let mut message = String::from("❓ <b>Help</b>\n\n<b>Commands:</b>\n");
    message.push_str("/start - Main menu\n");
    message.push_str("/wallet - View or connect your wallet\n");
    message.push_str("/balance - Show your SOL balance\n");
    message.push_str("/cancel - Abandon the current step\n");
    message.push_str("/help - This message\n\n");
    message.push_str("You can also paste a token address at any time to look it up.");
    message
}

pub fn seed_prompt() -> String {
    "🔑 <b>Enter Your Seed Phrase</b>\n\n\
     Send your 12 or 24 word recovery phrase, words separated by spaces.\n\n\
     ⚠️ Only do this in a private chat. Delete the message afterwards.\n\
     Send /cancel to abort."
        .to_string()
}

pub fn key_prompt() -> String {
    "🔑 <b>Enter Your Private Key</b>\n\n\
     Accepted formats:\n\
     • Base58 string (Phantom, Solflare export)\n\
     • JSON array, e.g. <code>[12,34,...]</code> (solana-keygen file)\n\
     • Comma-separated numbers\n\n\
     ⚠️ Only do this in a private chat. Delete the message afterwards.\n\
     Send /cancel to abort."
        .to_string()
}

pub fn connect_options() -> String {
    "🔗 <b>Connect Wallet</b>\n\nImport with your seed phrase or private key.\n\n\
     ⚠️ Never share either with anyone else. Secrets are encrypted before they are stored."
        .to_string()
}

pub fn token_query_prompt(purpose: TokenQueryPurpose) -> String {
    match purpose {
        TokenQueryPurpose::Buy => "💰 Send the address of the token you want to buy:".to_string(),
        TokenQueryPurpose::Analyze => "🔍 Send the token address to look up:".to_string(),
    }
}

pub fn buy_amount_prompt(token_mint: &str) -> String {
    format!(
        "💰 How much SOL do you want to spend on <code>{}</code>?",
        escape(token_mint)
    )
}

pub fn seed_confirmation(fragment: &str, public_key: &str) -> String {
    format!(
        "🔎 <b>Confirm Import</b>\n\n\
         Phrase: <code>{}</code>\n\
         Wallet: <code>{}</code>\n\n\
         Reply <b>yes</b> to save this wallet. Anything else discards it.",
        escape(fragment),
        escape(public_key)
    )
}

pub fn key_confirmation(fragment: &str, encoding: KeyEncoding, public_key: &str) -> String {
    format!(
        "🔎 <b>Confirm Import</b>\n\n\
         Key ({}): <code>{}</code>\n\
         Wallet: <code>{}</code>\n\n\
         Reply <b>yes</b> to save this wallet. Anything else discards it.",
        encoding.label(),
        escape(fragment),
        escape(public_key)
    )
}

/// Shown exactly once; the phrase is not repeated anywhere else.
pub fn generated_wallet(mnemonic: &str, public_key: &str) -> String {
    format!(
        "✨ <b>New Wallet Generated</b>\n\n\
         Wallet: <code>{}</code>\n\n\
         🔑 <b>Recovery phrase</b> (write it down now, it will not be shown again):\n\
         <tg-spoiler>{}</tg-spoiler>\n\n\
         Reply <b>yes</b> once you have saved it. Anything else discards this wallet.",
        escape(public_key),
        escape(mnemonic)
    )
}

pub fn import_complete(public_key: &str) -> String {
    format!(
        "✅ <b>Wallet Imported</b>\n\n🔐 <b>Wallet Address:</b>\n<code>{}</code>",
        escape(public_key)
    )
}

pub fn balance(sol: f64) -> String {
    format!("💰 <b>Current Balance:</b> {:.4} SOL", sol)
}

pub fn balance_unavailable() -> String {
    "⚠️ Balance currently unavailable. Try /balance again in a moment.".to_string()
}

pub fn import_not_completed() -> String {
    "❌ <b>Import did NOT complete.</b>\n\nThe wallet could not be saved. Nothing was stored; please retry."
        .to_string()
}

pub fn import_cancelled() -> String {
    "🚫 Import cancelled. Nothing was saved.".to_string()
}

pub fn invalid_mnemonic(reason: &str) -> String {
    format!(
        "❌ That is not a valid recovery phrase ({}).\n\nPlease send it again, or /cancel.",
        escape(reason)
    )
}

pub fn invalid_private_key() -> String {
    "❌ Could not read that private key. Use Base58, a JSON array, or comma-separated numbers.\n\n\
     Please send it again, or /cancel."
        .to_string()
}

pub fn derivation_failed() -> String {
    "❌ Something went wrong while preparing the wallet. Please start over.".to_string()
}

pub fn wallet_summary(public_key: &str, balance: Option<f64>) -> String {
    let balance_line = match balance {
        Some(sol) => format!("💰 <b>Live Balance:</b> {:.4} SOL", sol),
        None => "💰 <b>Live Balance:</b> unavailable".to_string(),
    };
    format!(
        "🔐 <b>Your Wallet:</b>\n<code>{}</code>\n\n{}",
        escape(public_key),
        balance_line
    )
}

pub fn no_wallet() -> String {
    "🔐 <b>Wallet:</b> Not connected\n\n💡 Connect or generate a wallet to start trading!".to_string()
}

pub fn token_summary(token_mint: &str) -> String {
    format!(
        "🔍 <b>Token</b>\n<code>{}</code>\n\nUse Quick Buy to choose an amount.",
        escape(token_mint)
    )
}

pub fn invalid_token() -> String {
    "❌ That is not a valid token address. Send a Base58 mint address, or /cancel.".to_string()
}

pub fn invalid_amount(reason: &str) -> String {
    format!(
        "❌ Invalid amount ({}). Send a number greater than 0, or /cancel.",
        escape(reason)
    )
}

pub fn buy_submitted(token_mint: &str, amount_sol: f64) -> String {
    format!(
        "💰 Buy order for <code>{}</code> with {} SOL submitted.",
        escape(token_mint),
        amount_sol
    )
}

pub fn trading_unavailable() -> String {
    "⚠️ Trading is currently unavailable. Your order was not placed.".to_string()
}

pub fn session_expired() -> String {
    "⌛ That step timed out. Please start again from the menu.".to_string()
}

pub fn cancelled() -> String {
    "🚫 Cancelled.".to_string()
}

pub fn nothing_to_confirm() -> String {
    "ℹ️ There is nothing waiting for confirmation.".to_string()
}

pub fn unknown_action() -> String {
    "❓ Unknown action. Please try again.".to_string()
}

pub fn unknown_command() -> String {
    "❓ Unknown command. Send /help to see what I can do.".to_string()
}

pub fn generic_error() -> String {
    "❌ An error occurred. Please try again.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_confirmation_shows_fragment_not_secret() {
        let text = key_confirmation("4uQe…iofM", KeyEncoding::JsonArray, "Pub111");
        assert!(text.contains("json array"));
        assert!(text.contains("4uQe…iofM"));
        assert!(text.contains("yes"));
    }

    #[test]
    fn test_balance_format() {
        assert_eq!(balance(1.23456), "💰 <b>Current Balance:</b> 1.2346 SOL");
        assert!(wallet_summary("Pub", None).contains("unavailable"));
    }

    #[test]
    fn test_store_failure_is_explicit() {
        assert!(import_not_completed().contains("did NOT complete"));
    }
}
