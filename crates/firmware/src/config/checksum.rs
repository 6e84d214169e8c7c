//! Sum-to-minus-one record envelope.
//!
//! A record is valid when the wrapping sum of all its little-endian `i32`
//! words, checksum word included, is exactly `-1`. An erased page reads as
//! all-ones words, which never sums to `-1` for a record of more than one
//! word.

/// Sum every valid record adds up to.
pub const VALID_SUM: i32 = -1;

/// Wrapping sum of the little-endian `i32` words in `bytes`.
///
/// A trailing partial word is ignored; records are whole words.
pub fn checksum(bytes: &[u8]) -> i32 {
    bytes
        .chunks_exact(4)
        .filter_map(|word| <[u8; 4]>::try_from(word).ok())
        .fold(0i32, |sum, word| sum.wrapping_add(i32::from_le_bytes(word)))
}

/// Whether `bytes` carry a valid envelope.
pub fn is_valid(bytes: &[u8]) -> bool {
    checksum(bytes) == VALID_SUM
}

/// Whether every word is in the erased (all-ones) state.
pub fn is_erased(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| *b == 0xFF)
}

/// Rewrite the checksum word at `offset` so the whole record sums to `-1`.
pub fn seal(bytes: &mut [u8], offset: usize) {
    let Some(end) = offset.checked_add(4) else {
        return;
    };
    if let Some(word) = bytes.get_mut(offset..end) {
        word.copy_from_slice(&[0; 4]);
    }
    let fixup = VALID_SUM.wrapping_sub(checksum(bytes));
    if let Some(word) = bytes.get_mut(offset..end) {
        word.copy_from_slice(&fixup.to_le_bytes());
    }
}
