//! Flat item listing for diagnosing malformed frames
//!
//! Unlike the value decoder this never builds a tree: it yields one entry per
//! item header, in wire order, with the nesting depth tracked by an explicit
//! stack of outstanding child counts. Semantic rules (tag numbers, key types,
//! simple values) are not checked here; only the framing is.

use super::argument::{read_argument, take, Argument, MajorType};
use crate::error::DecodeResult;

/// One item header found in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    /// Offset of the lead byte
    pub offset: usize,
    /// Nesting depth (0 for top-level items)
    pub depth: usize,
    /// Decoded lead byte and argument
    pub argument: Argument,
}

/// Iterator over the item headers in a buffer
///
/// Stops after the last byte or after yielding the first error.
#[derive(Debug)]
pub struct Walk<'a> {
    buf: &'a [u8],
    pos: usize,
    pending: Vec<u64>,
    failed: bool,
}

/// Walk every item in `buf` from the start
pub fn walk(buf: &[u8]) -> Walk<'_> {
    Walk {
        buf,
        pos: 0,
        pending: Vec::new(),
        failed: false,
    }
}

impl Walk<'_> {
    /// Cursor position after the last yielded item
    pub const fn position(&self) -> usize {
        self.pos
    }

    fn step(&mut self) -> DecodeResult<Item> {
        let offset = self.pos;
        let depth = self.pending.len();
        let (argument, next) = read_argument(self.buf, offset)?;
        self.pos = next;

        if matches!(argument.major, MajorType::Bytes | MajorType::Text) {
            self.pos += take(self.buf, self.pos, argument.value)?.len();
        }

        if let Some(parent) = self.pending.last_mut() {
            *parent -= 1;
        }

        let children = match argument.major {
            MajorType::Array => argument.value,
            MajorType::Map => argument.value.saturating_mul(2),
            MajorType::Tag => 1,
            _ => 0,
        };
        if children > 0 {
            self.pending.push(children);
        }
        while self.pending.last() == Some(&0) {
            let _ = self.pending.pop();
        }

        Ok(Item {
            offset,
            depth,
            argument,
        })
    }
}

impl Iterator for Walk<'_> {
    type Item = DecodeResult<Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.buf.len() {
            return None;
        }
        let result = self.step();
        self.failed = result.is_err();
        Some(result)
    }
}
