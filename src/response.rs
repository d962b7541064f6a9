//! Lenient parsing of decrypted response bodies.
//!
//! Some endpoints append extra content after the first JSON object of a
//! decrypted payload. Such payloads are cut back to their leading object;
//! anything else that fails to parse is handed back under `_raw`.

use serde_json::{json, Deserializer, Value};
use tracing::warn;

/// Key holding undecodable response text in a fallback object.
pub const RAW_FIELD: &str = "_raw";

/// Parse decrypted response text into JSON without failing.
///
/// 1. Plain JSON parses as-is.
/// 2. A complete leading object followed by trailing data is truncated at the
///    last `}` and re-parsed; when that still fails the leading object wins.
/// 3. Everything else becomes `{"errcode": 0, "_raw": text}`.
pub fn parse_decrypted(text: &str) -> Value {
    let error = match serde_json::from_str::<Value>(text) {
        Ok(value) => return value,
        Err(error) => error,
    };

    if let Some(value) = recover_leading_object(text) {
        warn!(%error, "decrypted payload carried trailing data; kept the leading object");
        return value;
    }

    warn!(%error, "decrypted payload is not JSON; returning it raw");
    raw_fallback(text)
}

/// Fallback object for a successful response whose payload is not JSON.
pub fn raw_fallback(text: &str) -> Value {
    json!({ "errcode": 0, RAW_FIELD: text })
}

fn recover_leading_object(text: &str) -> Option<Value> {
    let leading = Deserializer::from_str(text)
        .into_iter::<Value>()
        .next()?
        .ok()?;

    let trimmed = text.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    let end = trimmed.rfind('}')?;
    match serde_json::from_str::<Value>(&trimmed[..=end]) {
        Ok(value) => Some(value),
        Err(_) => Some(leading),
    }
}
