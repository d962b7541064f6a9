use url::Url;

use crate::error::YouduError;

/// Token exchange endpoint.
pub const TOKEN_PATH: &str = "/cgi/gettoken";
/// Multipart media upload endpoint.
pub const MEDIA_UPLOAD_PATH: &str = "/cgi/media/upload";
/// Media download endpoint.
pub const MEDIA_GET_PATH: &str = "/cgi/media/get";
/// Application message endpoint.
pub const MSG_SEND_PATH: &str = "/cgi/msg/send";

/// Query parameter carrying the access token on authenticated calls.
pub const ACCESS_TOKEN_PARAM: &str = "accessToken";

/// Validate a server base URL and strip trailing slashes.
pub fn normalize_base_url(input: &str) -> Result<String, YouduError> {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(YouduError::InvalidBaseUrl("base URL is empty".to_owned()));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|error| YouduError::InvalidBaseUrl(format!("{trimmed}: {error}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(YouduError::InvalidBaseUrl(format!(
            "{trimmed}: unsupported scheme {}",
            parsed.scheme()
        )));
    }

    Ok(trimmed.to_owned())
}

/// Join a normalized base URL and an endpoint path such as `/cgi/msg/send`.
pub fn endpoint_url(base: &str, path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
