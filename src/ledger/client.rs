use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// One place a balance can be read from.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Stable label for logs
    fn name(&self) -> &str;

    async fn balance_lamports(&self, public_key: &str) -> AppResult<u64>;
}

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Serialize)]
struct RpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: Value,
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// `getBalance` returns `{ context, value }`
#[derive(Debug, Deserialize)]
struct BalanceResult {
    value: u64,
}

/// A single Solana JSON-RPC endpoint
pub struct JsonRpcEndpoint {
    http: Client,
    url: String,
    commitment: String,
}

impl std::fmt::Debug for JsonRpcEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcEndpoint")
            .field("url", &self.url)
            .field("commitment", &self.commitment)
            .finish_non_exhaustive()
    }
}

impl JsonRpcEndpoint {
    /// `request_timeout` is a transport ceiling; the oracle applies its own
    /// per-attempt timeout on top.
    pub fn new(url: &str, commitment: &str, request_timeout: Duration) -> AppResult<Self> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self::with_client(http, url, commitment))
    }

    pub fn with_client(http: Client, url: &str, commitment: &str) -> Self {
        Self {
            http,
            url: url.trim().to_string(),
            commitment: commitment.to_string(),
        }
    }

    fn balance_request(&self, public_key: &str) -> RpcRequest {
        RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "getBalance",
            params: json!([public_key, { "commitment": self.commitment }]),
        }
    }
}

#[async_trait]
impl BalanceSource for JsonRpcEndpoint {
    fn name(&self) -> &str {
        &self.url
    }

    async fn balance_lamports(&self, public_key: &str) -> AppResult<u64> {
        debug!("getBalance {} via {}", public_key, self.url);

        let response = self
            .http
            .post(&self.url)
            .json(&self.balance_request(public_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::rpc(format!("endpoint returned {}", response.status())));
        }

        let body: RpcResponse<BalanceResult> = response
            .json()
            .await
            .map_err(|e| AppError::rpc(format!("malformed response: {}", e)))?;

        if let Some(err) = body.error {
            return Err(AppError::rpc(format!("{} (code {})", err.message, err.code)));
        }

        body.result
            .map(|r| r.value)
            .ok_or_else(|| AppError::rpc("response has neither result nor error"))
    }
}
