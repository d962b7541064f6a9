//! Media upload and download.
//!
//! Uploads are multipart: the encrypted `{type, name}` metadata travels as the
//! `encrypt` form field and the file part holds the base64 ciphertext of the
//! raw file bytes. Downloads come back either as a JSON envelope or as a bare
//! ciphertext body, depending on the server.

use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{read_json, YouduClient};
use crate::envelope::{ResponseEnvelope, UploadPayload};
use crate::error::YouduError;
use crate::url::{ACCESS_TOKEN_PARAM, MEDIA_GET_PATH, MEDIA_UPLOAD_PATH};

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    File,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::File => "file",
        }
    }

    /// `image` in any case selects [`MediaKind::Image`]; any other label is a file.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("image") {
            Self::Image
        } else {
            Self::File
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize)]
struct UploadMeta<'a> {
    #[serde(rename = "type")]
    kind: MediaKind,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MediaRef<'a> {
    media_id: &'a str,
}

impl YouduClient {
    /// Upload a file or image and return its media id.
    ///
    /// Transport failures are errors. Any rejection or unreadable reply from
    /// the server yields an empty media id instead.
    pub async fn upload_media(
        &self,
        kind: MediaKind,
        name: &str,
        data: &[u8],
    ) -> Result<String, YouduError> {
        let token = self.get_token().await?;

        let meta = serde_json::to_string(&UploadMeta { kind, name })?;
        let file = Part::bytes(self.codec.encrypt_bytes(data)?.into_bytes())
            .file_name(name.to_owned())
            .mime_str(OCTET_STREAM)?;
        let form = Form::new()
            .text("buin", self.buin.to_string())
            .text("appId", self.app_id().to_owned())
            .text("encrypt", self.codec.encrypt(&meta)?)
            .part("file", file);

        debug!(%kind, name, size = data.len(), "uploading media");
        let response = self
            .http
            .post(self.endpoint(MEDIA_UPLOAD_PATH))
            .query(&[(ACCESS_TOKEN_PARAM, token.as_str())])
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(YouduError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(self.media_id_from_reply(&body).unwrap_or_default())
    }

    fn media_id_from_reply(&self, body: &[u8]) -> Option<String> {
        let data: Value = match serde_json::from_slice(body) {
            Ok(data) => data,
            Err(error) => {
                warn!(%error, "media upload reply is not JSON");
                return None;
            }
        };

        let reply = ResponseEnvelope::from_value(&data);
        if !reply.is_success() {
            warn!(errcode = ?reply.errcode, errmsg = ?reply.errmsg, "media upload rejected");
            return None;
        }
        let Some(encrypted) = reply.encrypt else {
            warn!("media upload reply carries no encrypt field");
            return None;
        };

        let payload = self
            .codec
            .decrypt_to_str(&encrypted)
            .map_err(|error| error.to_string())
            .and_then(|text| {
                serde_json::from_str::<UploadPayload>(&text).map_err(|error| error.to_string())
            });
        match payload {
            Ok(payload) => Some(payload.media_id),
            Err(error) => {
                warn!(%error, "media upload reply could not be decoded");
                None
            }
        }
    }

    /// Download a media item and return its bytes.
    ///
    /// A JSON reply with a non-zero `errcode` is an error. Past that point the
    /// result is best effort: if the payload is not base64 after decryption,
    /// the undecoded bytes are returned as they are.
    pub async fn download_media(&self, media_id: &str) -> Result<Vec<u8>, YouduError> {
        let token = self.get_token().await?;
        let envelope = self.seal(&serde_json::to_vec(&MediaRef { media_id })?)?;

        debug!(media_id, "downloading media");
        let response = self
            .http
            .post(self.endpoint(MEDIA_GET_PATH))
            .query(&[(ACCESS_TOKEN_PARAM, token.as_str())])
            .json(&envelope)
            .send()
            .await?;

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim_start().starts_with("application/json"));
        if is_json {
            let data = read_json(response).await?;
            return self.open_download_envelope(data);
        }

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(YouduError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(self.open_download_body(&body))
    }

    fn open_download_envelope(&self, data: Value) -> Result<Vec<u8>, YouduError> {
        let reply = ResponseEnvelope::from_value(&data);
        if !reply.is_success() {
            return Err(YouduError::Download { response: data });
        }
        let encrypted = reply
            .encrypt
            .ok_or(YouduError::MissingEncrypt("media download"))?;

        let decrypted = self.codec.decrypt(&encrypted)?;
        Ok(decode_base64(&decrypted).unwrap_or_else(|| {
            warn!("downloaded media payload is not base64; returning decrypted bytes");
            decrypted
        }))
    }

    fn open_download_body(&self, body: &[u8]) -> Vec<u8> {
        let decrypted = std::str::from_utf8(body)
            .ok()
            .and_then(|text| self.codec.decrypt(text).ok());
        let Some(decrypted) = decrypted else {
            warn!(size = body.len(), "media body is not ciphertext; returning it raw");
            return body.to_vec();
        };
        if decrypted.is_empty() {
            return decrypted;
        }

        decode_base64(&decrypted).unwrap_or_else(|| {
            warn!("decrypted media body is not base64; returning it raw");
            body.to_vec()
        })
    }
}

fn decode_base64(data: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(data).ok()?;
    general_purpose::STANDARD.decode(text.trim()).ok()
}
