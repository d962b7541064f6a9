//! Access token cache with single-flight refresh.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::YouduError;

/// Tokens are treated as expired this long before the server says they are.
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
/// Lifetime assumed when a token response omits `expireIn`.
pub const DEFAULT_EXPIRE_IN_SECS: u64 = 7200;
/// Upper bound on how long a token is cached, whatever `expireIn` says.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Clone)]
pub struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    /// A token issued now and valid for `lifetime` minus [`EXPIRY_MARGIN`].
    pub fn new(value: impl Into<String>, lifetime: Duration) -> Self {
        Self::issued_at(value, lifetime, Instant::now())
    }

    /// Lifetimes beyond [`MAX_TOKEN_LIFETIME`] are capped. If the expiry is
    /// still not representable the token is stale from the start.
    pub fn issued_at(value: impl Into<String>, lifetime: Duration, issued: Instant) -> Self {
        let lifetime = lifetime
            .saturating_sub(EXPIRY_MARGIN)
            .min(MAX_TOKEN_LIFETIME);
        Self {
            value: value.into(),
            expires_at: issued.checked_add(lifetime).unwrap_or(issued),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }

    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Holds at most one access token.
///
/// The lock is held across the whole check-then-refresh sequence, so callers
/// arriving while a refresh is in flight wait for it and reuse its token.
#[derive(Debug, Default)]
pub struct TokenManager {
    cached: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token while fresh, otherwise run `refresh` and cache
    /// its result. A failed refresh leaves the cache untouched.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<String, YouduError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken, YouduError>>,
    {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh()) {
            return Ok(token.value().to_owned());
        }

        debug!("access token missing or expired; refreshing");
        let token = refresh().await?;
        let value = token.value().to_owned();
        *cached = Some(token);
        Ok(value)
    }

    /// Snapshot of the cached token, fresh or not.
    pub async fn cached(&self) -> Option<AccessToken> {
        self.cached.lock().await.clone()
    }

    /// Drop the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }
}
