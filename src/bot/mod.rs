//! Conversation layer: turns inbound events into replies, stored wallets and
//! trade intents.

pub mod dispatcher;
pub mod handler;
pub mod intents;
pub mod keyboards;
pub mod messages;

pub use dispatcher::{Dispatcher, EventHandler};
pub use handler::BotHandler;
pub use intents::{IntentBroadcaster, TradeIntent};

use crate::error::AppResult;
use async_trait::async_trait;
use custodybot_types::OutboundMessage;

/// Outbound side of the messaging transport.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> AppResult<()>;

    /// Clear the loading indicator on a pressed button
    async fn acknowledge(&self, callback_id: &str) -> AppResult<()>;
}
