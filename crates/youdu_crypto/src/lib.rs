//! Youdu message encryption primitives.
//!
//! Every request and response body exchanged with a Youdu server is wrapped in
//! the same envelope: a plaintext frame (`random(16) | len(4, BE) | content |
//! app_id`) padded to a 32-byte multiple and encrypted with AES-256-CBC, using
//! the first 16 key bytes as the IV. The ciphertext travels as standard base64.
//!
//! This crate is pure: no I/O, no async, no shared mutable state.

pub mod codec;
pub mod error;
pub mod frame;
pub mod padding;

pub use codec::{Codec, KEY_LEN};
pub use error::CryptoError;
pub use frame::{HEADER_LEN, PREFIX_LEN};
pub use padding::BLOCK_ALIGN;
