#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

//! # firehose-cbor
//!
//! Strict decoder for the AT Protocol repository-sync event stream.
//!
//! ## Architecture
//!
//! - **[`cbor`]** - Restricted DAG-CBOR argument reader, value decoder and item walker
//! - **[`frame`]** - Header/payload frame assembly
//! - **[`error`]** - Decode errors and front-end error types
//! - **[`render`]** - JSON rendering of decoded values
//! - **[`config`]** - Configuration loading and validation
//! - **[`batch`]** - Reading and decoding message files in parallel
//! - **[`cli`]** - Command-line argument parsing
//!
//! ## Quick Start
//!
//! ```
//! use firehose_cbor::decode_frame;
//!
//! // {"op": 1, "t": "#info"} {}
//! let bytes = [0xA2, 0x62, b'o', b'p', 0x01, 0x61, b't', 0x65, b'#', b'i', b'n', b'f', b'o', 0xA0];
//! let frame = decode_frame(&bytes).unwrap();
//! assert_eq!(frame.kind(), Some("#info"));
//! assert!(frame.payload().is_empty());
//! ```

pub mod batch;
pub mod cbor;
pub mod cli;
pub mod config;
pub mod error;
pub mod frame;
pub mod render;

/// Error type aliases for convenience
pub use error::{DecodeError, DecodeResult, FirehoseError, Result};

/// Core decoding entry points
pub use cbor::{decode_value, ContentId, DecodedValue, Mapping};
pub use frame::{decode_frame, decode_frame_with, Frame, FrameOptions, TrailingBytes};

/// Configuration type alias for convenience
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
