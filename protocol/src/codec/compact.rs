//! Compact (variable-length) unsigned integers.
//!
//! The two low bits of the first byte select the mode:
//!
//! ```text
//! 0b00  single byte    value = byte >> 2                     0 ..= 2^6 - 1
//! 0b01  two bytes      value = u16_le >> 2                2^6 ..= 2^14 - 1
//! 0b10  four bytes     value = u32_le >> 2               2^14 ..= 2^30 - 1
//! 0b11  big integer    (byte >> 2) + 4 LE bytes follow   2^30 ..
//! ```
//!
//! Only the shortest form of each value is accepted. A node never writes a
//! padded encoding, so one in a reply means corruption.

/// Largest value of the single-byte mode.
pub const SINGLE_BYTE_MAX: u128 = (1 << 6) - 1;

/// Largest value of the two-byte mode.
pub const TWO_BYTE_MAX: u128 = (1 << 14) - 1;

/// Largest value of the four-byte mode.
pub const FOUR_BYTE_MAX: u128 = (1 << 30) - 1;

/// Why a compact integer could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompactFault {
    /// The buffer ended; `needed` bytes were required in total.
    Short { needed: usize },
    /// Not the shortest form of the value.
    NonCanonical,
    /// The big-integer form declares more than 16 bytes.
    Overflow { byte_len: usize },
}

/// Reads a compact integer from the start of `input`.
///
/// Returns the value and the number of bytes consumed.
pub(crate) fn read_compact(input: &[u8]) -> Result<(u128, usize), CompactFault> {
    let first = *input.first().ok_or(CompactFault::Short { needed: 1 })?;

    match first & 0b11 {
        0b00 => Ok((u128::from(first >> 2), 1)),
        0b01 => {
            let raw = input.get(..2).ok_or(CompactFault::Short { needed: 2 })?;
            let value = u128::from(u16::from_le_bytes([raw[0], raw[1]]) >> 2);
            if value <= SINGLE_BYTE_MAX {
                return Err(CompactFault::NonCanonical);
            }
            Ok((value, 2))
        }
        0b10 => {
            let raw = input.get(..4).ok_or(CompactFault::Short { needed: 4 })?;
            let value = u128::from(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) >> 2);
            if value <= TWO_BYTE_MAX {
                return Err(CompactFault::NonCanonical);
            }
            Ok((value, 4))
        }
        _ => {
            let byte_len = usize::from(first >> 2) + 4;
            if byte_len > 16 {
                return Err(CompactFault::Overflow { byte_len });
            }
            let raw = input
                .get(1..1 + byte_len)
                .ok_or(CompactFault::Short { needed: 1 + byte_len })?;
            // The most significant byte must carry bits, otherwise a shorter
            // big-integer form existed.
            if raw[byte_len - 1] == 0 {
                return Err(CompactFault::NonCanonical);
            }
            let mut le = [0u8; 16];
            le[..byte_len].copy_from_slice(raw);
            let value = u128::from_le_bytes(le);
            if value <= FOUR_BYTE_MAX {
                return Err(CompactFault::NonCanonical);
            }
            Ok((value, 1 + byte_len))
        }
    }
}

/// Appends the shortest compact encoding of `value` to `out`.
pub fn write_compact(value: u128, out: &mut Vec<u8>) {
    if value <= SINGLE_BYTE_MAX {
        out.push((value as u8) << 2);
    } else if value <= TWO_BYTE_MAX {
        out.extend_from_slice(&(((value as u16) << 2) | 0b01).to_le_bytes());
    } else if value <= FOUR_BYTE_MAX {
        out.extend_from_slice(&(((value as u32) << 2) | 0b10).to_le_bytes());
    } else {
        let byte_len = 16 - (value.leading_zeros() as usize / 8);
        out.push((((byte_len - 4) as u8) << 2) | 0b11);
        out.extend_from_slice(&value.to_le_bytes()[..byte_len]);
    }
}

/// Number of bytes [`write_compact`] produces for `value`.
pub fn compact_len(value: u128) -> usize {
    if value <= SINGLE_BYTE_MAX {
        1
    } else if value <= TWO_BYTE_MAX {
        2
    } else if value <= FOUR_BYTE_MAX {
        4
    } else {
        1 + 16 - (value.leading_zeros() as usize / 8)
    }
}
