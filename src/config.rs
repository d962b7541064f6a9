//! Client configuration.

use std::env;
use std::time::Duration;

use crate::error::YouduError;

pub const ENV_API_URL: &str = "YOUDU_API_URL";
pub const ENV_BU_ID: &str = "YOUDU_BU_ID";
pub const ENV_APP_ID: &str = "YOUDU_APP_ID";
pub const ENV_APP_KEY: &str = "YOUDU_APP_KEY";
pub const ENV_TIMEOUT_SECS: &str = "YOUDU_TIMEOUT_SECS";

/// Connection settings for one Youdu application.
#[derive(Clone)]
pub struct YouduConfig {
    /// Server base URL, e.g. `https://im.example.com`. Endpoint paths are
    /// appended verbatim.
    pub api_url: String,
    /// Business unit (tenant) id, sent as `buin`.
    pub buin: i64,
    /// Application id, sent as `appId` and appended to every plaintext frame.
    pub app_id: String,
    /// Base64 `EncodingAESKey`; must decode to 32 bytes.
    pub app_key: String,
    /// Per-request timeout applied to every HTTP call.
    pub timeout: Option<Duration>,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
}

impl std::fmt::Debug for YouduConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouduConfig")
            .field("api_url", &self.api_url)
            .field("buin", &self.buin)
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl YouduConfig {
    pub fn new(
        api_url: impl Into<String>,
        buin: i64,
        app_id: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            buin,
            app_id: app_id.into(),
            app_key: app_key.into(),
            timeout: None,
            user_agent: None,
        }
    }

    /// Read `YOUDU_API_URL`, `YOUDU_BU_ID`, `YOUDU_APP_ID`, `YOUDU_APP_KEY` and
    /// the optional `YOUDU_TIMEOUT_SECS`.
    ///
    /// Missing string values become empty and are rejected later, when the
    /// client is built. A missing or empty bu id means 0.
    pub fn from_env() -> Result<Self, YouduError> {
        let buin = match env_string_opt(ENV_BU_ID) {
            Some(value) => value.parse::<i64>().map_err(|_| {
                YouduError::InvalidConfig(format!("{ENV_BU_ID} must be an integer, got {value:?}"))
            })?,
            None => 0,
        };

        let timeout = env_string_opt(ENV_TIMEOUT_SECS)
            .map(|value| {
                value.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                    YouduError::InvalidConfig(format!(
                        "{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {value:?}"
                    ))
                })
            })
            .transpose()?;

        Ok(Self {
            api_url: env_string(ENV_API_URL),
            buin,
            app_id: env_string(ENV_APP_ID),
            app_key: env_string(ENV_APP_KEY),
            timeout,
            user_agent: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

fn env_string(key: &str) -> String {
    env_string_opt(key).unwrap_or_default()
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}
