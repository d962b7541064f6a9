/// Alignment of the padded plaintext. Larger than the AES block on purpose:
/// the vendor pads to 32 bytes, not 16.
pub const BLOCK_ALIGN: usize = 32;

/// Append PKCS#7-style padding up to the next multiple of [`BLOCK_ALIGN`].
///
/// Padding is never empty: an already aligned input gains a full 32 bytes.
pub fn pad(mut data: Vec<u8>) -> Vec<u8> {
    let amount = BLOCK_ALIGN - (data.len() % BLOCK_ALIGN);
    data.resize(data.len() + amount, amount as u8);
    data
}

/// Strip trailing padding, or return `None` when the padding is malformed.
///
/// The trailing byte is the pad count; it must lie in `1..=32`, fit inside
/// `data`, and every one of the last `count` bytes must equal it.
pub fn unpad(data: &[u8]) -> Option<&[u8]> {
    let &last = data.last()?;
    let count = usize::from(last);
    if count == 0 || count > BLOCK_ALIGN || count > data.len() {
        return None;
    }

    let (content, padding) = data.split_at(data.len() - count);
    if padding.iter().all(|byte| *byte == last) {
        Some(content)
    } else {
        None
    }
}
