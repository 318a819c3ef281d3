//! Balance oracle over redundant Solana JSON-RPC endpoints.

pub mod client;
pub mod oracle;

pub use client::{BalanceSource, JsonRpcEndpoint};
pub use oracle::BalanceOracle;

use crate::error::AppResult;
use async_trait::async_trait;

/// 1 SOL = 10^9 lamports
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// What the bot needs from the ledger: a SOL balance for an address.
#[async_trait]
pub trait BalanceLookup: Send + Sync {
    async fn get_balance(&self, public_key: &str) -> AppResult<f64>;
}
