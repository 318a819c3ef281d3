pub mod routes;
pub mod websocket;

pub use routes::create_router;

use crate::bot::{Dispatcher, IntentBroadcaster};
use std::sync::Arc;

/// Application state for web handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub intents: IntentBroadcaster,
    /// Expected `X-Telegram-Bot-Api-Secret-Token`, if configured
    pub webhook_secret: Option<Arc<str>>,
    /// Bearer token for the intent stream; `None` disables it
    pub intents_token: Option<Arc<str>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("dispatcher", &self.dispatcher)
            .field("intents", &self.intents)
            .finish_non_exhaustive()
    }
}

/// Compare secrets without short-circuiting on the first differing byte.
pub(crate) fn secrets_match(expected: &str, presented: &str) -> bool {
    let (a, b) = (expected.as_bytes(), presented.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
