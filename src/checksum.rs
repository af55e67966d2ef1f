//! One's-complement byte-sum checksum of the VHD footer.

use crate::endian::ByteOrder;
use std::ops::Range;

/// Bytes of the footer that carry meaning; the rest of the sector is padding.
pub const FOOTER_DATA_LEN: usize = 85;
/// Location of the checksum field inside the footer.
pub const CHECKSUM_FIELD: Range<usize> = 64..68;

/// Sums the meaningful footer bytes with the checksum field read as zero and
/// returns the complement. The caller's buffer is left untouched.
pub fn compute(footer: &[u8]) -> u32 {
    let sum = footer
        .iter()
        .take(FOOTER_DATA_LEN)
        .enumerate()
        .filter(|(i, _)| !CHECKSUM_FIELD.contains(i))
        .fold(0_u32, |acc, (_, b)| acc.wrapping_add(*b as u32));

    !sum
}

/// Big-endian value held in the checksum field, if the buffer reaches it.
pub fn stored(footer: &[u8]) -> Option<u32> {
    let field = footer.get(CHECKSUM_FIELD)?;
    let mut bytes = [0_u8; 4];
    bytes.copy_from_slice(field);

    Some(u32::from_big_endian(bytes))
}

pub fn verify(footer: &[u8]) -> bool {
    match stored(footer) {
        Some(checksum) => checksum == compute(footer),
        None => false,
    }
}

/// Computes the checksum and writes it big-endian into the checksum field.
pub(crate) fn fill_in(footer: &mut [u8]) -> u32 {
    let checksum = compute(footer);
    footer[CHECKSUM_FIELD].copy_from_slice(&checksum.to_big_endian());

    checksum
}
