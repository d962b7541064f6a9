use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use youdu_crypto::CryptoError;

#[derive(Debug, Error)]
pub enum YouduError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid application key: {0}")]
    InvalidAppKey(#[source] CryptoError),

    #[error("token request rejected: {response}")]
    Auth { response: Value },

    #[error("token response is malformed: {0}")]
    MalformedToken(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} {body}")]
    Status { status: StatusCode, body: String },

    #[error("payload decode failed: {0}")]
    Decode(#[from] CryptoError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("media download failed: {response}")]
    Download { response: Value },

    #[error("{0} response carries no encrypt field")]
    MissingEncrypt(&'static str),
}

impl YouduError {
    /// Whether the error was raised before any network traffic, while
    /// validating configuration.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_) | Self::InvalidBaseUrl(_) | Self::InvalidAppKey(_)
        )
    }

    /// Whether the error came from the HTTP layer rather than the vendor API.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { .. })
    }
}
