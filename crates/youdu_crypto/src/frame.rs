//! Plaintext frame layout, before padding and encryption.
//!
//! ```text
//! +------------+-----------------+----------+--------------+
//! | random(16) | content len(4)  | content  | app id bytes |
//! +------------+-----------------+----------+--------------+
//! ```

use crate::error::CryptoError;

/// Length of the random header.
pub const HEADER_LEN: usize = 16;
/// Length of the random header plus the big-endian content length.
pub const PREFIX_LEN: usize = HEADER_LEN + 4;

/// Assemble an unpadded frame.
pub fn pack(
    header: [u8; HEADER_LEN],
    content: &[u8],
    app_id: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let declared =
        u32::try_from(content.len()).map_err(|_| CryptoError::ContentTooLarge(content.len()))?;

    let mut frame = Vec::with_capacity(PREFIX_LEN + content.len() + app_id.len());
    frame.extend_from_slice(&header);
    frame.extend_from_slice(&declared.to_be_bytes());
    frame.extend_from_slice(content);
    frame.extend_from_slice(app_id);
    Ok(frame)
}

/// Extract the content from an unpadded frame.
///
/// The trailing app id is discarded without validation. A declared length that
/// runs past the end of the frame yields whatever content bytes are present.
pub fn unpack(frame: &[u8]) -> Result<&[u8], CryptoError> {
    if frame.len() < PREFIX_LEN {
        return Err(CryptoError::ContentTooShort(frame.len()));
    }

    let mut declared = [0_u8; 4];
    declared.copy_from_slice(&frame[HEADER_LEN..PREFIX_LEN]);
    let declared = u32::from_be_bytes(declared) as usize;

    let body = &frame[PREFIX_LEN..];
    Ok(&body[..declared.min(body.len())])
}
