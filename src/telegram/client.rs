use super::types::{AnswerCallbackQuery, ApiResponse, SendMessage, SetWebhook};
use crate::bot::MessageChannel;
use crate::config::TelegramConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use custodybot_types::OutboundMessage;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Outbound Bot API client.
///
/// Method URLs embed the bot token, so request errors are stripped of their
/// URL before they are logged or returned.
pub struct TelegramClient {
    http: Client,
    config: TelegramConfig,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_url", &self.config.api_url)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.config.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;

        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            AppError::Telegram(format!(
                "{} returned unreadable body ({}): {}",
                method,
                status,
                e.without_url()
            ))
        })?;

        if !envelope.ok {
            let description = envelope.description.unwrap_or_else(|| status.to_string());
            return Err(AppError::Telegram(format!("{} failed: {}", method, description)));
        }

        envelope
            .result
            .ok_or_else(|| AppError::Telegram(format!("{} returned ok without result", method)))
    }

    /// Register the webhook URL Telegram should deliver updates to.
    pub async fn set_webhook(&self, url: &str) -> AppResult<()> {
        let body = SetWebhook {
            url,
            secret_token: self.config.webhook_secret.as_deref(),
            allowed_updates: &["message", "callback_query"],
        };
        let _: bool = self.call("setWebhook", &body).await?;
        info!("Telegram webhook registered at {}", url);
        Ok(())
    }
}

#[async_trait]
impl MessageChannel for TelegramClient {
    async fn send(&self, message: OutboundMessage) -> AppResult<()> {
        let body = SendMessage::from_outbound(&message);
        let _: serde_json::Value = self.call("sendMessage", &body).await?;
        debug!("Sent message to chat {}", message.chat_id);
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> AppResult<()> {
        let body = AnswerCallbackQuery {
            callback_query_id: callback_id,
        };
        let _: bool = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }
}
