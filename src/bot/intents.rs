use chrono::{DateTime, Utc};
use custodybot_types::UserId;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

const INTENT_CHANNEL_CAPACITY: usize = 256;

/// A validated request to buy a token, handed to the trade engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeIntent {
    pub id: Uuid,
    pub user_id: UserId,
    /// Base58 wallet address the trade should execute from
    pub wallet: String,
    pub token_mint: String,
    pub amount_sol: f64,
    pub created_at: DateTime<Utc>,
}

impl TradeIntent {
    pub fn buy(user_id: UserId, wallet: &str, token_mint: &str, amount_sol: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            wallet: wallet.to_string(),
            token_mint: token_mint.to_string(),
            amount_sol,
            created_at: Utc::now(),
        }
    }
}

/// Fan-out of trade intents to whatever engines are subscribed.
#[derive(Clone)]
pub struct IntentBroadcaster {
    tx: broadcast::Sender<TradeIntent>,
}

impl std::fmt::Debug for IntentBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentBroadcaster")
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}

impl IntentBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(INTENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TradeIntent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Returns how many subscribers received the intent; zero means nobody
    /// is listening and the trade will not happen.
    pub fn publish(&self, intent: TradeIntent) -> usize {
        let id = intent.id;
        match self.tx.send(intent) {
            Ok(receivers) => {
                info!("Published trade intent {} to {} subscriber(s)", id, receivers);
                receivers
            }
            Err(_) => {
                warn!("Trade intent {} dropped: no trade engine subscribed", id);
                0
            }
        }
    }
}

impl Default for IntentBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
