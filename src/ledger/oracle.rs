use super::client::{BalanceSource, JsonRpcEndpoint};
use super::{lamports_to_sol, BalanceLookup};
use crate::config::LedgerConfig;
use crate::error::{AppError, AppResult};
use crate::wallet::is_valid_public_key;
use async_trait::async_trait;
use config::ConfigError;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Ordered failover across balance sources.
///
/// Sources are tried strictly in order, one at a time. The first answer wins;
/// there is no retry of a failed source within one lookup.
#[derive(Clone)]
pub struct BalanceOracle {
    sources: Vec<Arc<dyn BalanceSource>>,
    attempt_timeout: Duration,
}

impl std::fmt::Debug for BalanceOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceOracle")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name().to_string()).collect::<Vec<_>>(),
            )
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

impl BalanceOracle {
    pub fn new(sources: Vec<Arc<dyn BalanceSource>>, attempt_timeout: Duration) -> Self {
        Self {
            sources,
            attempt_timeout,
        }
    }

    /// Build one JSON-RPC source per configured endpoint, sharing an HTTP
    /// connection pool.
    pub fn from_config(config: &LedgerConfig) -> AppResult<Self> {
        let endpoints: Vec<&str> = config
            .endpoints
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .collect();
        if endpoints.is_empty() {
            return Err(ConfigError::Message("ledger.endpoints is empty".into()).into());
        }

        let attempt_timeout = Duration::from_secs(config.attempt_timeout_secs);
        let http = Client::builder().timeout(attempt_timeout).build()?;

        let sources = endpoints
            .into_iter()
            .map(|url| {
                Arc::new(JsonRpcEndpoint::with_client(http.clone(), url, &config.commitment))
                    as Arc<dyn BalanceSource>
            })
            .collect::<Vec<_>>();

        info!(
            "Balance oracle configured with {} endpoint(s), {}s per attempt",
            sources.len(),
            config.attempt_timeout_secs
        );
        Ok(Self::new(sources, attempt_timeout))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Raw lamport balance from the first source that answers in time.
    pub async fn get_balance_lamports(&self, public_key: &str) -> AppResult<u64> {
        let public_key = public_key.trim();
        if !is_valid_public_key(public_key) {
            return Err(AppError::InvalidPublicKey);
        }

        for (idx, source) in self.sources.iter().enumerate() {
            match timeout(self.attempt_timeout, source.balance_lamports(public_key)).await {
                Ok(Ok(lamports)) => {
                    debug!(
                        source_idx = idx,
                        source = source.name(),
                        lamports,
                        "Balance lookup succeeded"
                    );
                    return Ok(lamports);
                }
                Ok(Err(e)) => {
                    warn!(source_idx = idx, source = source.name(), error = %e, "Balance source failed, trying next");
                }
                Err(_) => {
                    warn!(
                        source_idx = idx,
                        source = source.name(),
                        timeout_ms = self.attempt_timeout.as_millis() as u64,
                        "Balance source timed out, trying next"
                    );
                }
            }
        }

        Err(AppError::AllEndpointsUnavailable)
    }

    /// Balance in SOL
    pub async fn get_balance(&self, public_key: &str) -> AppResult<f64> {
        self.get_balance_lamports(public_key).await.map(lamports_to_sol)
    }
}

#[async_trait]
impl BalanceLookup for BalanceOracle {
    async fn get_balance(&self, public_key: &str) -> AppResult<f64> {
        BalanceOracle::get_balance(self, public_key).await
    }
}
