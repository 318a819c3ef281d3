//! Wire types shared between the custodybot core and its collaborators.
//!
//! These sit on the two boundaries the core does not own: the messaging
//! transport (inbound events, outbound messages with inline keyboards) and
//! the secret store (`WalletRecord`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Stable user identifier from the messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat the reply should go to. For private chats this equals the user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Free text typed by the user
    Text,
    /// Inline keyboard button press; payload is the action tag
    ButtonPress,
}

/// Inbound event from the messaging transport.
#[derive(Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub kind: EventKind,
    pub payload: String,
    /// Transport handle for acknowledging a button press
    #[serde(default)]
    pub callback_id: Option<String>,
}

impl InboundEvent {
    pub fn text(user_id: i64, payload: impl Into<String>) -> Self {
        Self {
            user_id: UserId(user_id),
            chat_id: ChatId(user_id),
            kind: EventKind::Text,
            payload: payload.into(),
            callback_id: None,
        }
    }

    pub fn button(user_id: i64, action: impl Into<String>) -> Self {
        Self {
            user_id: UserId(user_id),
            chat_id: ChatId(user_id),
            kind: EventKind::ButtonPress,
            payload: action.into(),
            callback_id: None,
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == EventKind::Text
    }
}

// Payload may be a secret the user just typed.
impl fmt::Debug for InboundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboundEvent")
            .field("user_id", &self.user_id)
            .field("chat_id", &self.chat_id)
            .field("kind", &self.kind)
            .field("payload_len", &self.payload.len())
            .finish_non_exhaustive()
    }
}

impl Drop for InboundEvent {
    fn drop(&mut self) {
        self.payload.zeroize();
    }
}

/// Inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub action: String,
}

impl Button {
    pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

/// Ordered rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row holding a single button
    pub fn button(mut self, label: impl Into<String>, action: impl Into<String>) -> Self {
        self.rows.push(vec![Button::new(label, action)]);
        self
    }

    /// Append a row of buttons
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(|b| b.action.as_str())
    }
}

/// Outbound message to the messaging transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Persisted wallet for a user. One active record per user; a new import
/// replaces the old one.
#[derive(Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    pub user_id: UserId,
    /// Base58 public key
    pub public_key: String,
    /// Base58 of the 64-byte secret key
    pub secret_key_encoded: String,
    #[serde(default)]
    pub mnemonic_phrase: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRecord")
            .field("user_id", &self.user_id)
            .field("public_key", &self.public_key)
            .field("has_mnemonic", &self.mnemonic_phrase.is_some())
            .field("created_at", &self.created_at)
            .field("last_used_at", &self.last_used_at)
            .finish_non_exhaustive()
    }
}

impl Drop for WalletRecord {
    fn drop(&mut self) {
        self.secret_key_encoded.zeroize();
        if let Some(ref mut phrase) = self.mnemonic_phrase {
            phrase.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_preserves_row_order() {
        let kb = Keyboard::new()
            .button("First", "first")
            .row(vec![Button::new("A", "a"), Button::new("B", "b")]);
        assert_eq!(kb.rows.len(), 2);
        assert_eq!(kb.actions().collect::<Vec<_>>(), vec!["first", "a", "b"]);
    }

    #[test]
    fn debug_never_prints_payload() {
        let event = InboundEvent::text(7, "abandon ability able");
        let rendered = format!("{:?}", event);
        assert!(!rendered.contains("abandon"));
        assert!(rendered.contains("payload_len"));
    }

    #[test]
    fn wallet_record_debug_hides_secret() {
        let record = WalletRecord {
            user_id: UserId(1),
            public_key: "PubKey111".to_string(),
            secret_key_encoded: "SuperSecret".to_string(),
            mnemonic_phrase: Some("word word".to_string()),
            created_at: Utc::now(),
            last_used_at: Utc::now(),
        };
        let rendered = format!("{:?}", record);
        assert!(rendered.contains("PubKey111"));
        assert!(!rendered.contains("SuperSecret"));
        assert!(!rendered.contains("word word"));
    }

    #[test]
    fn outbound_serializes_without_empty_keyboard() {
        let msg = OutboundMessage::new(ChatId(5), "hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("keyboard"));
    }
}
