use crate::session::machine::tag;
use custodybot_types::{Button, Keyboard};

pub fn main_menu() -> Keyboard {
    Keyboard::new()
        .row(vec![
            Button::new("💰 Buy", tag::BUY),
            Button::new("🔍 Analyze", tag::ANALYZE),
        ])
        .row(vec![
            Button::new("🔐 Wallet", tag::WALLET),
            Button::new("💰 Balance", tag::BALANCE),
        ])
        .button("❓ Help", tag::HELP)
}

pub fn wallet_menu(has_wallet: bool) -> Keyboard {
    let kb = if has_wallet {
        Keyboard::new().button("💰 Refresh Balance", tag::BALANCE)
    } else {
        Keyboard::new()
    };
    kb.button("🔗 Connect Existing Wallet", tag::CONNECT_WALLET)
        .button("✨ Generate New Wallet", tag::GENERATE_WALLET)
        .button("🔙 Back to Main", tag::MAIN_MENU)
}

pub fn connect_options() -> Keyboard {
    Keyboard::new()
        .button("🔑 Use Seed Phrase", tag::ENTER_SEED_PHRASE)
        .button("🔑 Use Private Key", tag::ENTER_PRIVATE_KEY)
        .button("🔙 Back to Wallet", tag::WALLET)
}

pub fn confirm_import() -> Keyboard {
    Keyboard::new().row(vec![
        Button::new("✅ Yes, save it", tag::CONFIRM_YES),
        Button::new("❌ No, discard", tag::CONFIRM_NO),
    ])
}

pub fn after_import() -> Keyboard {
    Keyboard::new()
        .button("✅ Continue to Main Menu", tag::MAIN_MENU)
        .button("🔐 View Wallet Details", tag::SHOW_WALLET)
}

pub fn token_actions(token_mint: &str) -> Keyboard {
    Keyboard::new()
        .button("💰 Quick Buy", tag::quick_buy(token_mint))
        .button("🔙 Back to Main", tag::MAIN_MENU)
}

pub fn back_to_main() -> Keyboard {
    Keyboard::new().button("🔙 Back to Main", tag::MAIN_MENU)
}
