use thiserror::Error;

/// Application-wide error types
///
/// None of the messages carry secret material. Variants that wrap user input
/// hold only a reason string built from positions, lengths, or encodings.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Unrecognized private key format: {0}")]
    UnrecognizedKeyFormat(String),

    /// Internal invariant violation while building key material
    #[error("Key derivation failure: {0}")]
    DerivationFailure(String),

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("All ledger endpoints unavailable")]
    AllEndpointsUnavailable,

    #[error("Ledger RPC error: {0}")]
    Rpc(String),

    #[error("Secret store write failed: {0}")]
    SecretStoreWriteFailure(String),

    #[error("Secret sealing error: {0}")]
    Sealing(String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid numeric input: {0}")]
    InvalidNumericInput(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    /// Missing or wrong shared secret on an inbound HTTP call
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    pub fn rpc<S: Into<String>>(msg: S) -> Self {
        Self::Rpc(msg.into())
    }

    /// Errors caused by what the user typed. The conversation stays in its
    /// current state and the user is re-prompted.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidMnemonic(_)
                | Self::UnrecognizedKeyFormat(_)
                | Self::InvalidNumericInput(_)
                | Self::InvalidPublicKey
        )
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convert AppError to HTTP status codes for web responses
impl AppError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidMnemonic(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnrecognizedKeyFormat(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DerivationFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidPublicKey => StatusCode::BAD_REQUEST,
            Self::AllEndpointsUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Rpc(_) => StatusCode::BAD_GATEWAY,
            Self::SecretStoreWriteFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Sealing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SessionExpired => StatusCode::GONE,
            Self::InvalidNumericInput(_) => StatusCode::BAD_REQUEST,
            Self::Telegram(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16()
        });
        (status, axum::Json(body)).into_response()
    }
}
