//! Recursive-descent value decoder
//!
//! Walks a borrowed buffer and builds an owned [`DecodedValue`] tree. All
//! byte and text payloads are copied out, so the buffer may be reused as
//! soon as decoding returns.
//!
//! # Security
//!
//! Every length-bearing read is bounds-checked before use, nesting is capped
//! by [`DecodeOptions::max_depth`], and declared element counts never drive
//! allocations larger than the bytes actually left in the buffer.

use std::str;

use super::argument::{peek_major, read_argument, take, MajorType};
use super::value::{ContentId, DecodedValue, Mapping};
use crate::error::{DecodeError, DecodeResult};

/// Default maximum nesting depth for arrays and maps
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Hard ceiling on the nesting depth, whatever the options ask for.
///
/// Recursion stays well inside a 2 MiB worker-thread stack at this depth.
pub const MAX_DEPTH_LIMIT: usize = 512;

/// The only tag number allowed in the profile (content identifier link)
pub const TAG_CID: u64 = 42;

const SIMPLE_FALSE: u64 = 20;
const SIMPLE_TRUE: u64 = 21;
const SIMPLE_NULL: u64 = 22;

/// Tunables for a single decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum number of nested arrays/maps
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Decode the item at `cursor` with default options.
///
/// Returns the value and the cursor just past it.
pub fn decode_value(buf: &[u8], cursor: usize) -> DecodeResult<(DecodedValue, usize)> {
    decode_value_with(buf, cursor, &DecodeOptions::default())
}

/// Decode the item at `cursor` with explicit options.
pub fn decode_value_with(
    buf: &[u8],
    cursor: usize,
    options: &DecodeOptions,
) -> DecodeResult<(DecodedValue, usize)> {
    let mut decoder = Decoder::new(buf, cursor, options);
    let value = decoder.decode_next()?;
    Ok((value, decoder.position()))
}

/// Cursor over a message buffer that decodes consecutive top-level items
#[derive(Debug)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    /// Create a decoder positioned at `cursor`
    ///
    /// A `max_depth` above [`MAX_DEPTH_LIMIT`] is clamped to it.
    pub const fn new(buf: &'a [u8], cursor: usize, options: &DecodeOptions) -> Self {
        let max_depth = if options.max_depth > MAX_DEPTH_LIMIT {
            MAX_DEPTH_LIMIT
        } else {
            options.max_depth
        };
        Self {
            buf,
            pos: cursor,
            max_depth,
        }
    }

    /// Current cursor position
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor
    pub const fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Major type of the next item without consuming it
    pub fn peek_major(&self) -> DecodeResult<MajorType> {
        peek_major(self.buf, self.pos)
    }

    /// Decode the next top-level item and advance past it
    pub fn decode_next(&mut self) -> DecodeResult<DecodedValue> {
        self.value(0)
    }

    fn value(&mut self, depth: usize) -> DecodeResult<DecodedValue> {
        let start = self.pos;
        let (arg, next) = read_argument(self.buf, start)?;
        self.pos = next;

        match arg.major {
            MajorType::Unsigned => Ok(DecodedValue::Integer(truncate_magnitude(arg.value))),
            // -1 - n, wrapping for magnitudes past i64::MAX
            MajorType::Negative => Ok(DecodedValue::Integer(
                (-1_i64).wrapping_sub(truncate_magnitude(arg.value)),
            )),
            MajorType::Bytes => Ok(DecodedValue::Bytes(self.take(arg.value)?.to_vec())),
            MajorType::Text => self.text(arg.value, start).map(DecodedValue::Text),
            MajorType::Array => {
                self.enter(depth, start)?;
                let mut items = Vec::with_capacity(self.capacity_hint(arg.value));
                for _ in 0..arg.value {
                    items.push(self.value(depth + 1)?);
                }
                Ok(DecodedValue::Array(items))
            }
            MajorType::Map => {
                self.enter(depth, start)?;
                let mut map = Mapping::new();
                for _ in 0..arg.value {
                    let key = self.key()?;
                    let value = self.value(depth + 1)?;
                    // Later duplicates overwrite earlier ones
                    let _ = map.insert(key, value);
                }
                Ok(DecodedValue::Map(map))
            }
            MajorType::Tag => self.content_id(arg.value, start).map(DecodedValue::ContentId),
            MajorType::Simple => match arg.value {
                SIMPLE_FALSE => Ok(DecodedValue::Bool(false)),
                SIMPLE_TRUE => Ok(DecodedValue::Bool(true)),
                SIMPLE_NULL => Ok(DecodedValue::Null),
                value => Err(DecodeError::InvalidSimpleValue {
                    value,
                    offset: start,
                }),
            },
        }
    }

    fn key(&mut self) -> DecodeResult<String> {
        let start = self.pos;
        let found = peek_major(self.buf, start)?;
        if found != MajorType::Text {
            return Err(DecodeError::InvalidMapKey {
                found,
                offset: start,
            });
        }
        let (arg, next) = read_argument(self.buf, start)?;
        self.pos = next;
        self.text(arg.value, start)
    }

    fn text(&mut self, len: u64, start: usize) -> DecodeResult<String> {
        let bytes = self.take(len)?;
        str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8 { offset: start })
    }

    fn content_id(&mut self, tag: u64, start: usize) -> DecodeResult<ContentId> {
        if tag != TAG_CID {
            return Err(DecodeError::InvalidTagValue { tag, offset: start });
        }

        let inner_start = self.pos;
        let found = peek_major(self.buf, inner_start)?;
        if found != MajorType::Bytes {
            return Err(DecodeError::InvalidTagPayload {
                found,
                offset: inner_start,
            });
        }
        let (inner, next) = read_argument(self.buf, inner_start)?;
        self.pos = next;

        Ok(ContentId::new(self.take(inner.value)?.to_vec()))
    }

    fn take(&mut self, len: u64) -> DecodeResult<&'a [u8]> {
        let bytes = take(self.buf, self.pos, len)?;
        self.pos += bytes.len();
        Ok(bytes)
    }

    const fn enter(&self, depth: usize, offset: usize) -> DecodeResult<()> {
        if depth >= self.max_depth {
            return Err(DecodeError::DepthLimitExceeded {
                limit: self.max_depth,
                offset,
            });
        }
        Ok(())
    }

    // Every element takes at least one byte, so the remainder bounds the count
    fn capacity_hint(&self, count: u64) -> usize {
        usize::try_from(count)
            .unwrap_or(usize::MAX)
            .min(self.remaining())
    }
}

/// Reinterpret an unsigned magnitude as i64.
///
/// Magnitudes above `i64::MAX` wrap. The firehose keeps integers within 53
/// significant bits, so this only affects values no conforming producer
/// emits.
#[allow(clippy::cast_possible_wrap)]
const fn truncate_magnitude(magnitude: u64) -> i64 {
    magnitude as i64
}
