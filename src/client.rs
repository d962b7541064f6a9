use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::{Client, Method, Response};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use youdu_crypto::Codec;

use crate::config::YouduConfig;
use crate::envelope::{EncryptedEnvelope, ResponseEnvelope, TokenPayload};
use crate::error::YouduError;
use crate::response::{parse_decrypted, raw_fallback};
use crate::token::{AccessToken, TokenManager, DEFAULT_EXPIRE_IN_SECS};
use crate::url::{endpoint_url, normalize_base_url, ACCESS_TOKEN_PARAM, TOKEN_PATH};

/// Client for one Youdu application.
///
/// Safe to share across tasks; the only mutable state is the token cache.
#[derive(Debug)]
pub struct YouduClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) buin: i64,
    pub(crate) codec: Codec,
    tokens: TokenManager,
}

impl YouduClient {
    /// Validate `config` and build the client. Fails before any network use
    /// when the base URL or the application key is unusable.
    pub fn new(config: YouduConfig) -> Result<Self, YouduError> {
        let base_url = normalize_base_url(&config.api_url)?;
        let codec =
            Codec::new(&config.app_id, &config.app_key).map_err(YouduError::InvalidAppKey)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = config
            .user_agent
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            builder = builder.user_agent(user_agent.to_owned());
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url,
            buin: config.buin,
            codec,
            tokens: TokenManager::new(),
        })
    }

    pub fn from_env() -> Result<Self, YouduError> {
        Self::new(YouduConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn buin(&self) -> i64 {
        self.buin
    }

    pub fn app_id(&self) -> &str {
        self.codec.app_id()
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn endpoint(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }

    /// Encrypt `plaintext` into a request envelope for this application.
    pub fn seal(&self, plaintext: &[u8]) -> Result<EncryptedEnvelope, YouduError> {
        Ok(EncryptedEnvelope {
            buin: self.buin,
            app_id: self.codec.app_id().to_owned(),
            encrypt: self.codec.encrypt_bytes(plaintext)?,
        })
    }

    /// Return a valid access token, refreshing it when missing or expired.
    pub async fn get_token(&self) -> Result<String, YouduError> {
        self.tokens.get_or_refresh(|| self.fetch_token()).await
    }

    /// Forget the cached token; the next call fetches a new one.
    pub async fn invalidate_token(&self) {
        self.tokens.invalidate().await;
    }

    async fn fetch_token(&self) -> Result<AccessToken, YouduError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let envelope = self.seal(timestamp.to_string().as_bytes())?;

        debug!(buin = self.buin, app_id = self.app_id(), "requesting access token");
        let response = self
            .http
            .post(self.endpoint(TOKEN_PATH))
            .json(&envelope)
            .send()
            .await?;
        let data = read_json(response).await?;

        let reply = ResponseEnvelope::from_value(&data);
        if !reply.is_success() {
            return Err(YouduError::Auth { response: data });
        }
        let encrypted = reply.encrypt.ok_or(YouduError::MissingEncrypt("token"))?;
        let payload: TokenPayload = serde_json::from_str(&self.codec.decrypt_to_str(&encrypted)?)
            .map_err(|error| YouduError::MalformedToken(error.to_string()))?;

        let value = payload
            .access_token
            .filter(|value| !value.is_empty())
            .ok_or_else(|| YouduError::MalformedToken("accessToken is missing".to_owned()))?;
        let expire_in = payload.expire_in.unwrap_or(DEFAULT_EXPIRE_IN_SECS);
        debug!(expire_in, "access token refreshed");

        Ok(AccessToken::new(value, Duration::from_secs(expire_in)))
    }

    /// Perform one authenticated call.
    ///
    /// The token is added to `params` as `accessToken`. A `body` is encrypted
    /// into an [`EncryptedEnvelope`] and sent as JSON, except on `GET`.
    ///
    /// A non-zero `errcode` is not an error: the server's object is returned
    /// unchanged for the caller to inspect. A successful response with an
    /// `encrypt` field yields the decrypted payload, parsed leniently.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: Option<&Map<String, Value>>,
        body: Option<&Value>,
    ) -> Result<Value, YouduError> {
        let token = self.get_token().await?;
        let query = query_pairs(params, &token);

        let mut builder = self
            .http
            .request(method.clone(), self.endpoint(path))
            .query(&query);
        if method != Method::GET {
            if let Some(body) = body {
                let plaintext = serde_json::to_vec(body)?;
                builder = builder.json(&self.seal(&plaintext)?);
            }
        }

        debug!(%method, path, "sending request");
        let response = builder.send().await?;
        let data = read_json(response).await?;
        Ok(self.open_response(data))
    }

    pub async fn get(
        &self,
        path: &str,
        params: Option<&Map<String, Value>>,
    ) -> Result<Value, YouduError> {
        self.request(Method::GET, path, params, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, YouduError> {
        self.request(Method::POST, path, None, Some(body)).await
    }

    /// Turn a parsed response into the caller-facing value.
    pub fn open_response(&self, data: Value) -> Value {
        let reply = ResponseEnvelope::from_value(&data);
        if !reply.is_success() {
            debug!(errcode = ?reply.errcode, errmsg = ?reply.errmsg, "server returned an error code");
            return data;
        }
        let Some(encrypted) = reply.encrypt else {
            return data;
        };

        match self.codec.decrypt(&encrypted) {
            Ok(plaintext) => parse_decrypted(&String::from_utf8_lossy(&plaintext)),
            Err(error) => {
                warn!(%error, "response payload could not be decrypted; returning it raw");
                raw_fallback(&encrypted)
            }
        }
    }
}

/// Merge caller parameters with the access token. String values are sent
/// verbatim, `null` as an empty value and everything else as JSON text.
fn query_pairs(params: Option<&Map<String, Value>>, token: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = params
        .into_iter()
        .flatten()
        .filter(|(key, _)| key.as_str() != ACCESS_TOKEN_PARAM)
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) => text.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect();
    pairs.push((ACCESS_TOKEN_PARAM.to_owned(), token.to_owned()));
    pairs
}

/// Read a JSON body, surfacing non-2xx statuses as transport errors.
pub(crate) async fn read_json(response: Response) -> Result<Value, YouduError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(YouduError::Status {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(serde_json::from_slice(&body)?)
}
