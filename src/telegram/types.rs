//! The slice of the Telegram Bot API the bot reads and writes.

use custodybot_types::{ChatId, InboundEvent, Keyboard, OutboundMessage};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Incoming update delivered to the webhook
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

// Text may be a seed phrase or private key.
impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("message_id", &self.message_id)
            .field("from", &self.from)
            .field("chat", &self.chat)
            .field("text_len", &self.text.as_ref().map(|t| t.len()))
            .finish()
    }
}

impl Drop for Message {
    fn drop(&mut self) {
        if let Some(ref mut text) = self.text {
            text.zeroize();
        }
    }
}

/// Only the chat of the message a button was attached to is needed
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackMessage {
    pub chat: Chat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<CallbackMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

impl Update {
    /// Convert to a transport-neutral event. Updates from bots and updates
    /// carrying neither text nor button data are dropped.
    pub fn into_event(mut self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query.take() {
            if query.from.is_bot {
                return None;
            }
            let data = query.data?;
            let chat_id = query
                .message
                .map(|m| m.chat.id)
                .unwrap_or(query.from.id);
            let mut event = InboundEvent::button(query.from.id, data);
            event.chat_id = ChatId(chat_id);
            event.callback_id = Some(query.id);
            return Some(event);
        }

        let mut message = self.message.take()?;
        let from = message.from.clone()?;
        if from.is_bot {
            return None;
        }
        let text = message.text.take()?;
        let mut event = InboundEvent::text(from.id, text);
        event.chat_id = ChatId(message.chat.id);
        Some(event)
    }
}

/// Telegram envelope: `{ ok, result?, description? }`
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl From<&Keyboard> for InlineKeyboardMarkup {
    fn from(keyboard: &Keyboard) -> Self {
        Self {
            inline_keyboard: keyboard
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| InlineKeyboardButton {
                            text: b.label.clone(),
                            callback_data: b.action.clone(),
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

/// `sendMessage` body
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    pub disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl<'a> SendMessage<'a> {
    pub fn from_outbound(message: &'a OutboundMessage) -> Self {
        Self {
            chat_id: message.chat_id.0,
            text: &message.text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
            reply_markup: message.keyboard.as_ref().map(InlineKeyboardMarkup::from),
        }
    }
}

/// `answerCallbackQuery` body
#[derive(Debug, Serialize)]
pub struct AnswerCallbackQuery<'a> {
    pub callback_query_id: &'a str,
}

/// `setWebhook` body
#[derive(Debug, Serialize)]
pub struct SetWebhook<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<&'a str>,
    pub allowed_updates: &'static [&'static str],
}

#[cfg(test)]
mod tests {
    use super::*;
    use custodybot_types::{EventKind, UserId};
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_message_becomes_text_event() {
        let update = parse(json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "from": { "id": 42, "is_bot": false, "username": "alice" },
                "chat": { "id": 42, "type": "private" },
                "text": "/start"
            }
        }));
        let event = update.into_event().unwrap();
        assert_eq!(event.user_id, UserId(42));
        assert_eq!(event.chat_id, ChatId(42));
        assert_eq!(event.kind, EventKind::Text);
        assert_eq!(event.payload, "/start");
        assert!(event.callback_id.is_none());
    }

    #[test]
    fn test_callback_becomes_button_event() {
        let update = parse(json!({
            "update_id": 2,
            "callback_query": {
                "id": "cb-9",
                "from": { "id": 42, "is_bot": false },
                "message": { "message_id": 11, "chat": { "id": -100, "type": "group" } },
                "data": "wallet"
            }
        }));
        let event = update.into_event().unwrap();
        assert_eq!(event.kind, EventKind::ButtonPress);
        assert_eq!(event.payload, "wallet");
        assert_eq!(event.chat_id, ChatId(-100));
        assert_eq!(event.callback_id.as_deref(), Some("cb-9"));
    }

    #[test]
    fn test_bot_and_empty_updates_are_dropped() {
        let from_bot = parse(json!({
            "update_id": 3,
            "message": {
                "message_id": 12,
                "from": { "id": 7, "is_bot": true },
                "chat": { "id": 7, "type": "private" },
                "text": "hi"
            }
        }));
        assert!(from_bot.into_event().is_none());

        let sticker = parse(json!({
            "update_id": 4,
            "message": {
                "message_id": 13,
                "from": { "id": 7, "is_bot": false },
                "chat": { "id": 7, "type": "private" }
            }
        }));
        assert!(sticker.into_event().is_none());

        let bare = parse(json!({ "update_id": 5, "edited_message": {} }));
        assert!(bare.into_event().is_none());
    }

    #[test]
    fn test_message_debug_hides_text() {
        let update = parse(json!({
            "update_id": 6,
            "message": {
                "message_id": 14,
                "from": { "id": 1, "is_bot": false },
                "chat": { "id": 1, "type": "private" },
                "text": "abandon ability able"
            }
        }));
        assert!(!format!("{:?}", update).contains("abandon"));
    }

    #[test]
    fn test_send_message_renders_inline_keyboard() {
        let outbound = OutboundMessage::new(ChatId(5), "<b>hi</b>")
            .with_keyboard(Keyboard::new().button("Wallet", "wallet"));
        let body = serde_json::to_value(SendMessage::from_outbound(&outbound)).unwrap();
        assert_eq!(
            body,
            json!({
                "chat_id": 5,
                "text": "<b>hi</b>",
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
                "reply_markup": {
                    "inline_keyboard": [[{ "text": "Wallet", "callback_data": "wallet" }]]
                }
            })
        );
    }
}
