//! Async client for the Youdu IM server API.
//!
//! Every call goes through the vendor's encrypted envelope (see
//! [`youdu_crypto`]) and carries a short-lived access token, which the client
//! fetches, caches and refreshes on its own. [`YouduClient::request`] covers
//! the JSON endpoints; [`YouduClient::upload_media`] and
//! [`YouduClient::download_media`] cover the binary media path.
//!
//! Nothing is retried: Youdu write calls are not idempotent.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod media;
pub mod response;
pub mod token;
pub mod url;

pub use client::YouduClient;
pub use config::YouduConfig;
pub use envelope::{EncryptedEnvelope, ResponseEnvelope};
pub use error::YouduError;
pub use media::MediaKind;
pub use reqwest::Method;
pub use token::{AccessToken, TokenManager};
pub use youdu_crypto::{Codec, CryptoError};
