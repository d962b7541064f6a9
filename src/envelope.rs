//! JSON shapes exchanged with the server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Encrypted request body: tenant, application and the base64 ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub buin: i64,
    #[serde(rename = "appId")]
    pub app_id: String,
    pub encrypt: String,
}

/// The fields of a server response the client acts on.
///
/// Built leniently from an arbitrary JSON value: a missing or non-integer
/// `errcode` counts as a failure, a non-string `encrypt` as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub errcode: Option<i64>,
    pub errmsg: Option<String>,
    pub encrypt: Option<String>,
}

impl ResponseEnvelope {
    pub fn from_value(value: &Value) -> Self {
        Self {
            errcode: value.get("errcode").and_then(Value::as_i64),
            errmsg: value
                .get("errmsg")
                .and_then(Value::as_str)
                .map(str::to_owned),
            encrypt: value
                .get("encrypt")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }

    pub fn is_success(&self) -> bool {
        self.errcode == Some(0)
    }
}

/// Decrypted body of a `/cgi/gettoken` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenPayload {
    pub access_token: Option<String>,
    pub expire_in: Option<u64>,
}

/// Decrypted body of a `/cgi/media/upload` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadPayload {
    #[serde(default)]
    pub media_id: String,
}
