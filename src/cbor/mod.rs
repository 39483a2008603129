//! Restricted DAG-CBOR decoding
//!
//! The profile accepted here is the subset of CBOR used by the firehose:
//! definite-length items only, integers, byte and text strings, arrays,
//! text-keyed maps, tag 42 content identifiers, and the simple values
//! `false`, `true` and `null`. Everything else is rejected.
//!
//! - [`argument`]: lead byte and argument reader
//! - [`decoder`]: recursive value decoder
//! - [`value`]: decoded value tree
//! - [`walk`]: flat item listing for diagnostics

pub mod argument;
pub mod decoder;
pub mod value;
pub mod walk;

pub use argument::{peek_major, read_argument, Argument, MajorType};
pub use decoder::{
    decode_value, decode_value_with, DecodeOptions, Decoder, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT,
    TAG_CID,
};
pub use value::{ContentId, DecodedValue, Mapping};
pub use walk::{walk, Item, Walk};
