use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Telegram Bot API configuration
#[derive(Deserialize, Clone)]
pub struct TelegramConfig {
    /// Bot token from BotFather. Supply via CUSTODYBOT_TELEGRAM__BOT_TOKEN,
    /// never commit it to a config file.
    pub bot_token: String,
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
    /// Shared secret Telegram echoes in X-Telegram-Bot-Api-Secret-Token
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// Public URL of `/telegram/webhook`; registered with Telegram on startup
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_telegram_timeout")]
    pub timeout_secs: u64,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_telegram_timeout() -> u64 {
    10
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<set>"))
            .field("webhook_url", &self.webhook_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// Web server configuration (webhook, health, intent stream)
#[derive(Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Bearer token for `/intents/ws`. The stream is disabled when unset.
    #[serde(default)]
    pub intents_token: Option<String>,
}

impl std::fmt::Debug for WebConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("intents_token", &self.intents_token.as_ref().map(|_| "<set>"))
            .finish()
    }
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            intents_token: None,
        }
    }
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Secret-at-rest configuration
#[derive(Deserialize, Clone)]
pub struct StorageConfig {
    /// Base64 of a 32-byte ChaCha20-Poly1305 key
    pub encryption_key: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("encryption_key", &"<redacted>")
            .finish()
    }
}

/// Solana JSON-RPC endpoints, tried in order
#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    pub endpoints: Vec<String>,
    #[serde(default = "default_commitment")]
    pub commitment: String,
    /// Upper bound for a single endpoint attempt
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_attempt_timeout() -> u64 {
    5
}

/// Conversation state settings
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Inactivity TTL for a pending conversation step
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_session_ttl() -> u64 {
    600
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Per-user event queue settings
#[derive(Debug, Deserialize, Clone)]
pub struct DispatcherConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// A user's worker exits after this long without events
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_queue_capacity() -> usize {
    32
}

fn default_idle_timeout() -> u64 {
    120
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

/// Root application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub web: WebConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default config file
            .add_source(File::with_name("config/default").required(false))
            // Override with local config if present
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (prefix: CUSTODYBOT_)
            // e.g., CUSTODYBOT_TELEGRAM__BOT_TOKEN, CUSTODYBOT_WEB__PORT
            .add_source(
                Environment::with_prefix("CUSTODYBOT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ledger.endpoints")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the bot cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::Message("telegram.bot_token is empty".into()));
        }
        if self.ledger.endpoints.is_empty() {
            return Err(ConfigError::Message(
                "ledger.endpoints must list at least one RPC URL".into(),
            ));
        }
        if self.ledger.attempt_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "ledger.attempt_timeout_secs must be positive".into(),
            ));
        }
        if self.session.ttl_secs == 0 {
            return Err(ConfigError::Message("session.ttl_secs must be positive".into()));
        }
        if self.session.sweep_interval_secs == 0 {
            return Err(ConfigError::Message(
                "session.sweep_interval_secs must be positive".into(),
            ));
        }
        crate::db::sealing::decode_key(&self.storage.encryption_key)
            .map_err(|e| ConfigError::Message(format!("storage.encryption_key: {}", e)))?;
        Ok(())
    }

    /// Initialize the global config singleton
    pub fn init() -> Result<&'static Self, ConfigError> {
        let config = Self::load()?;
        Ok(CONFIG.get_or_init(|| config))
    }
}

impl TelegramConfig {
    /// Bot API method URL, e.g. `sendMessage`
    pub fn method_url(&self, method: &str) -> String {
        let base = self.api_url.trim_end_matches('/');
        let method = method.trim_start_matches('/');
        format!("{}/bot{}/{}", base, self.bot_token, method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

    fn sample() -> AppConfig {
        AppConfig {
            telegram: TelegramConfig {
                bot_token: "123:abc".to_string(),
                api_url: "https://api.telegram.org/".to_string(),
                webhook_secret: None,
                webhook_url: None,
                timeout_secs: 10,
            },
            web: WebConfig::default(),
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            storage: StorageConfig {
                encryption_key: BASE64.encode([7u8; 32]),
            },
            ledger: LedgerConfig {
                endpoints: vec!["https://api.mainnet-beta.solana.com".to_string()],
                commitment: default_commitment(),
                attempt_timeout_secs: 5,
            },
            session: SessionConfig::default(),
            dispatcher: DispatcherConfig::default(),
        }
    }

    #[test]
    fn test_method_url() {
        let config = sample();
        assert_eq!(
            config.telegram.method_url("/sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_validate_accepts_sample() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_endpoints() {
        let mut config = sample();
        config.ledger.endpoints.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_short_key() {
        let mut config = sample();
        config.storage.encryption_key = BASE64.encode([1u8; 16]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_sweep_interval() {
        let mut config = sample();
        config.session.sweep_interval_secs = 0;
        let err = tokio_test::assert_err!(config.validate());
        assert!(err.to_string().contains("sweep_interval_secs"));
    }

    #[test]
    fn test_debug_hides_token() {
        let mut config = sample();
        config.web.intents_token = Some("engine-token".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("123:abc"));
        assert!(!rendered.contains("engine-token"));
    }
}
