//! PKCS#7-style padding over 32-byte blocks.
//!
//! The platform pads to 32 bytes rather than the 16-byte AES block. Changing
//! the block size breaks interoperability.

/// Padding block size in bytes.
pub const BLOCK_SIZE: usize = 32;

/// Pad `buf` to a multiple of [`BLOCK_SIZE`].
///
/// Always appends between 1 and 32 bytes, each holding the pad length; an
/// already aligned buffer gains a full block.
#[must_use]
pub fn pad(mut buf: Vec<u8>) -> Vec<u8> {
    let amount = BLOCK_SIZE - buf.len() % BLOCK_SIZE;
    buf.resize(buf.len() + amount, amount as u8);
    buf
}

/// Strip padding added by [`pad`].
///
/// A final byte outside `1..=32` means no padding is present and the buffer is
/// returned unchanged.
#[must_use]
pub fn unpad(buf: &[u8]) -> &[u8] {
    match buf.last() {
        Some(&amount) if (1..=BLOCK_SIZE).contains(&usize::from(amount)) => {
            &buf[..buf.len().saturating_sub(usize::from(amount))]
        }
        _ => buf,
    }
}
