//! Per-user conversation state.
//!
//! [`store`] keeps at most one [`StateKind`] per user with a TTL and a
//! version token; [`machine::route`] turns the current state and an inbound
//! event into an [`Action`] without side effects.

pub mod machine;
pub mod state;
pub mod store;

pub use machine::{route, Action, TokenQueryPurpose};
pub use state::{ConversationState, ImportSource, Lookup, PendingImport, StateKind};
pub use store::{InMemorySessionStore, SessionStore};

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Periodically drop expired conversation states.
pub fn spawn_sweeper(store: Arc<dyn SessionStore>, interval: Duration) -> JoinHandle<()> {
    info!("Session sweeper running every {:?}", interval);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            store.sweep_expired();
        }
    })
}
