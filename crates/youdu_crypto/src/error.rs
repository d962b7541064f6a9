use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("application key is not valid base64: {0}")]
    KeyEncoding(#[source] base64::DecodeError),

    #[error("application key must decode to 32 bytes, got {0}")]
    KeyLength(usize),

    #[error("ciphertext is not valid base64: {0}")]
    Base64(#[source] base64::DecodeError),

    #[error("ciphertext length {0} is not a multiple of the AES block size")]
    BlockSize(usize),

    #[error("content of {0} bytes does not fit the 32-bit length prefix")]
    ContentTooLarge(usize),

    #[error("decrypted frame is too short ({0} bytes)")]
    ContentTooShort(usize),

    #[error("decrypted content is not valid UTF-8: {0}")]
    Utf8(#[source] std::string::FromUtf8Error),
}
