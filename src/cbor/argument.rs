//! Argument reader
//!
//! Every item starts with a lead byte:
//! ```text
//! ┌────────────┬─────────────────┐
//! │ major type │ argument code   │
//! │ bits 7..5  │ bits 4..0       │
//! └────────────┴─────────────────┘
//! ```
//! Codes 0..=23 are the argument itself. Codes 24..=27 are followed by
//! 1, 2, 4 or 8 big-endian bytes holding the argument. Codes 28..=31 are
//! reserved or indefinite-length markers and are rejected.

use std::fmt;

use crate::error::{DecodeError, DecodeResult};

/// Largest argument carried directly in the lead byte.
pub const MAX_INLINE_ARGUMENT: u8 = 23;

const CODE_ONE_BYTE: u8 = 24;
const CODE_TWO_BYTES: u8 = 25;
const CODE_FOUR_BYTES: u8 = 26;
const CODE_EIGHT_BYTES: u8 = 27;

const ARGUMENT_CODE_MASK: u8 = 0b0001_1111;
const MAJOR_TYPE_SHIFT: u8 = 5;

/// Coarse type discriminator from the top 3 bits of the lead byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MajorType {
    /// 0: unsigned integer, argument is the value
    Unsigned,
    /// 1: negative integer, value is -1 - argument
    Negative,
    /// 2: byte string, argument is the length
    Bytes,
    /// 3: UTF-8 text, argument is the length
    Text,
    /// 4: array, argument is the element count
    Array,
    /// 5: map, argument is the pair count
    Map,
    /// 6: tag, argument is the tag number
    Tag,
    /// 7: simple value
    Simple,
}

impl MajorType {
    /// Map the 3-bit type field to a major type
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Unsigned),
            1 => Some(Self::Negative),
            2 => Some(Self::Bytes),
            3 => Some(Self::Text),
            4 => Some(Self::Array),
            5 => Some(Self::Map),
            6 => Some(Self::Tag),
            7 => Some(Self::Simple),
            _ => None,
        }
    }

    /// The 3-bit type field for this major type
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Human-readable name used in error messages
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unsigned => "unsigned integer",
            Self::Negative => "negative integer",
            Self::Bytes => "byte string",
            Self::Text => "text",
            Self::Array => "array",
            Self::Map => "map",
            Self::Tag => "tag",
            Self::Simple => "simple value",
        }
    }
}

impl fmt::Display for MajorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded lead byte plus its argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argument {
    /// Major type of the item
    pub major: MajorType,
    /// Numeric argument (value, length, count or tag number)
    pub value: u64,
    /// Raw argument code from the low 5 bits
    pub code: u8,
}

impl Argument {
    /// Number of bytes following the lead byte that hold the argument
    pub const fn extra_bytes(&self) -> usize {
        match self.code {
            CODE_ONE_BYTE => 1,
            CODE_TWO_BYTES => 2,
            CODE_FOUR_BYTES => 4,
            CODE_EIGHT_BYTES => 8,
            _ => 0,
        }
    }
}

/// Read the lead byte and argument of the item at `cursor`.
///
/// Returns the argument and the cursor just past the argument bytes. Bounds
/// are checked before every read.
pub fn read_argument(buf: &[u8], cursor: usize) -> DecodeResult<(Argument, usize)> {
    let major = peek_major(buf, cursor)?;
    let lead = take(buf, cursor, 1)?[0];

    let code = lead & ARGUMENT_CODE_MASK;
    let body = cursor + 1;

    let width: usize = match code {
        0..=MAX_INLINE_ARGUMENT => {
            let argument = Argument {
                major,
                value: u64::from(code),
                code,
            };
            return Ok((argument, body));
        }
        CODE_ONE_BYTE => 1,
        CODE_TWO_BYTES => 2,
        CODE_FOUR_BYTES => 4,
        CODE_EIGHT_BYTES => 8,
        _ => {
            return Err(DecodeError::InvalidArgumentCode {
                code,
                offset: cursor,
            })
        }
    };

    // Network byte order: most significant byte first
    let value = take(buf, body, width as u64)?
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));

    Ok((Argument { major, value, code }, body + width))
}

/// Classify the item at `cursor` from its lead byte alone.
///
/// Only the lead byte is bounds-checked; the argument that follows is not
/// read, so structural checks can run before a malformed argument is seen.
pub fn peek_major(buf: &[u8], cursor: usize) -> DecodeResult<MajorType> {
    let bits = take(buf, cursor, 1)?[0] >> MAJOR_TYPE_SHIFT;
    MajorType::from_bits(bits).ok_or(DecodeError::UnsupportedMajorType {
        major: bits,
        offset: cursor,
    })
}

/// Borrow exactly `len` bytes starting at `offset`, or fail with
/// [`DecodeError::BufferUnderrun`].
pub(crate) fn take(buf: &[u8], offset: usize, len: u64) -> DecodeResult<&[u8]> {
    let available = buf.len().saturating_sub(offset);
    let underrun = DecodeError::BufferUnderrun {
        offset,
        needed: len,
        available,
    };

    match usize::try_from(len) {
        Ok(len) if len <= available => buf.get(offset..offset + len).ok_or(underrun),
        _ => Err(underrun),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_major_ignores_malformed_argument() {
        // Reserved code 28 and a truncated two-byte width
        assert_eq!(peek_major(&[0x3C], 0).unwrap(), MajorType::Negative);
        assert_eq!(peek_major(&[0x19, 0x01], 0).unwrap(), MajorType::Unsigned);
        assert!(read_argument(&[0x3C], 0).is_err());

        assert!(matches!(
            peek_major(&[0xA0], 1),
            Err(DecodeError::BufferUnderrun { offset: 1, .. })
        ));
    }

    #[test]
    fn test_inline_codes_are_the_value() {
        for code in 0..=MAX_INLINE_ARGUMENT {
            let (arg, next) = read_argument(&[code], 0).unwrap();
            assert_eq!(arg.major, MajorType::Unsigned);
            assert_eq!(arg.value, u64::from(code));
            assert_eq!(next, 1);
            assert_eq!(arg.extra_bytes(), 0);
        }
    }

    #[test]
    fn test_explicit_widths_big_endian() {
        let (arg, next) = read_argument(&[0x18, 0xFF], 0).unwrap();
        assert_eq!((arg.value, next), (255, 2));

        let (arg, next) = read_argument(&[0x19, 0x01, 0x00], 0).unwrap();
        assert_eq!((arg.value, next), (256, 3));

        let (arg, next) = read_argument(&[0x1A, 0x01, 0x02, 0x03, 0x04], 0).unwrap();
        assert_eq!((arg.value, next), (0x0102_0304, 5));

        let bytes = [0x1B, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let (arg, next) = read_argument(&bytes, 0).unwrap();
        assert_eq!((arg.value, next), (0x0102_0304_0506_0708, 9));
        assert_eq!(arg.extra_bytes(), 8);
    }

    #[test]
    fn test_major_type_from_lead_byte() {
        let cases = [
            (0x00, MajorType::Unsigned),
            (0x20, MajorType::Negative),
            (0x40, MajorType::Bytes),
            (0x60, MajorType::Text),
            (0x80, MajorType::Array),
            (0xA0, MajorType::Map),
            (0xC0, MajorType::Tag),
            (0xE0, MajorType::Simple),
        ];
        for (lead, major) in cases {
            let (arg, _) = read_argument(&[lead], 0).unwrap();
            assert_eq!(arg.major, major);
            assert_eq!(arg.major.bits(), lead >> 5);
        }
    }

    #[test]
    fn test_reserved_codes_rejected() {
        for code in 28..=31u8 {
            let err = read_argument(&[0x40 | code], 0).unwrap_err();
            assert_eq!(err, DecodeError::InvalidArgumentCode { code, offset: 0 });
        }
    }

    #[test]
    fn test_truncated_argument_is_underrun() {
        // Code 26 needs four bytes, only two present
        let err = read_argument(&[0x1A, 0x00, 0x01], 0).unwrap_err();
        assert_eq!(
            err,
            DecodeError::BufferUnderrun {
                offset: 1,
                needed: 4,
                available: 2,
            }
        );
    }

    #[test]
    fn test_empty_buffer_is_underrun() {
        let err = read_argument(&[], 0).unwrap_err();
        assert!(matches!(err, DecodeError::BufferUnderrun { offset: 0, .. }));

        let err = read_argument(&[0x01], 5).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::BufferUnderrun {
                offset: 5,
                available: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_reads_at_cursor() {
        let buf = [0xFF, 0xFF, 0x38, 0x09, 0x01];
        let (arg, next) = read_argument(&buf, 2).unwrap();
        assert_eq!(arg.major, MajorType::Negative);
        assert_eq!(arg.value, 9);
        assert_eq!(next, 4);
    }

    #[test]
    fn test_take_rejects_oversized_length() {
        assert!(take(&[1, 2, 3], 1, 2).is_ok());
        assert!(take(&[1, 2, 3], 1, 3).is_err());
        assert!(take(&[1, 2, 3], 0, u64::MAX).is_err());
    }
}
