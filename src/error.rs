//! Error types and handling for the firehose decoder
//!
//! Two layers: [`DecodeError`] is the strict, typed failure of the core
//! decoder, and [`FirehoseError`] wraps it together with the I/O,
//! configuration and output failures of the command-line front-end.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::cbor::MajorType;

/// Result type alias for core decoding operations
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Result type alias for application-level operations
pub type Result<T> = std::result::Result<T, FirehoseError>;

/// Which half of a frame was being decoded when a structural error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePart {
    /// The first top-level value
    Header,
    /// The second top-level value
    Payload,
}

impl fmt::Display for FramePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
            Self::Payload => f.write_str("payload"),
        }
    }
}

/// Every way a buffer can violate the restricted DAG-CBOR profile
///
/// Offsets are byte positions into the message buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Argument code 28..=31 (reserved or indefinite length)
    #[error("invalid argument code {code} at offset {offset}")]
    InvalidArgumentCode { code: u8, offset: usize },

    /// Not enough bytes left to read what the item declares
    #[error("buffer underrun at offset {offset}: needed {needed} bytes, {available} available")]
    BufferUnderrun {
        offset: usize,
        needed: u64,
        available: usize,
    },

    /// Text item whose bytes are not valid UTF-8
    #[error("invalid UTF-8 in text item at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// Map key that is not a text item
    #[error("map key at offset {offset} is {found}, expected text")]
    InvalidMapKey { found: MajorType, offset: usize },

    /// Tag number other than 42
    #[error("unsupported tag {tag} at offset {offset}, only tag 42 is allowed")]
    InvalidTagValue { tag: u64, offset: usize },

    /// Tag 42 wrapping something other than a byte string
    #[error("tag 42 at offset {offset} wraps {found}, expected a byte string")]
    InvalidTagPayload { found: MajorType, offset: usize },

    /// Simple value other than false, true or null
    #[error("invalid simple value {value} at offset {offset}")]
    InvalidSimpleValue { value: u64, offset: usize },

    /// Major type the profile has no decoding rule for
    #[error("unsupported major type {major} at offset {offset}")]
    UnsupportedMajorType { major: u8, offset: usize },

    /// Top-level value of the frame is not a map
    #[error("invalid frame structure: {part} is {found}, expected a map")]
    InvalidFrameStructure { part: FramePart, found: MajorType },

    /// Nesting deeper than the configured limit
    #[error("nesting depth exceeds limit of {limit} at offset {offset}")]
    DepthLimitExceeded { limit: usize, offset: usize },

    /// Bytes left over after the payload when trailing bytes are rejected
    #[error("{remaining} trailing bytes after frame payload")]
    TrailingBytes { remaining: usize },
}

impl DecodeError {
    /// Offset into the buffer where the violation was detected, if known
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::InvalidArgumentCode { offset, .. }
            | Self::BufferUnderrun { offset, .. }
            | Self::InvalidUtf8 { offset }
            | Self::InvalidMapKey { offset, .. }
            | Self::InvalidTagValue { offset, .. }
            | Self::InvalidTagPayload { offset, .. }
            | Self::InvalidSimpleValue { offset, .. }
            | Self::UnsupportedMajorType { offset, .. }
            | Self::DepthLimitExceeded { offset, .. } => Some(*offset),
            Self::InvalidFrameStructure { .. } | Self::TrailingBytes { .. } => None,
        }
    }
}

/// Error types for firehose front-end operations
#[derive(Error, Debug)]
pub enum FirehoseError {
    // ═══════════════════════════════════════════════════════════════
    // Decoding
    // ═══════════════════════════════════════════════════════════════
    /// Frame could not be decoded
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// Frame from a named input could not be decoded
    #[error("Decode failed for {input}: {source}")]
    DecodeInput {
        input: String,
        #[source]
        source: DecodeError,
    },

    // ═══════════════════════════════════════════════════════════════
    // Input
    // ═══════════════════════════════════════════════════════════════
    /// Input file could not be read
    #[error("Failed to read input {path}: {reason}")]
    InputRead { path: PathBuf, reason: String },

    /// Input exceeds the configured message size limit
    #[error("Input {input} is {size} bytes, exceeding the {limit} byte message limit")]
    MessageTooLarge {
        input: String,
        size: usize,
        limit: usize,
    },

    /// Input declared as hex is not valid hex
    #[error("Invalid hex input {input}: {reason}")]
    InvalidHex { input: String, reason: String },

    // ═══════════════════════════════════════════════════════════════
    // Configuration
    // ═══════════════════════════════════════════════════════════════
    /// Failed to read configuration file
    #[error("Failed to read config from {path}: {reason}")]
    ConfigRead { path: PathBuf, reason: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ═══════════════════════════════════════════════════════════════
    // Output
    // ═══════════════════════════════════════════════════════════════
    /// Failed to serialize output
    #[error("Serialization failed: {0}")]
    SerializationError(String),

    /// Writing to stdout failed
    #[error("Output failed: {0}")]
    Output(String),

    // ═══════════════════════════════════════════════════════════════
    // Other Errors
    // ═══════════════════════════════════════════════════════════════
    /// Invalid input argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FirehoseError {
    /// Get the exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) => 2,
            Self::InputRead { .. } | Self::MessageTooLarge { .. } | Self::InvalidHex { .. } => 3,
            Self::Decode(_) | Self::DecodeInput { .. } => 4,
            Self::ConfigRead { .. } | Self::InvalidConfig(_) => 5,
            Self::SerializationError(_) | Self::Output(_) => 6,
            Self::Internal(_) => 1,
        }
    }

    /// The underlying decode error, if this failure came from the decoder
    pub const fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            Self::Decode(err) | Self::DecodeInput { source: err, .. } => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FirehoseError {
    fn from(err: std::io::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl From<serde_json::Error> for FirehoseError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Self::Output(err.to_string())
        } else {
            Self::SerializationError(format!("JSON error: {err}"))
        }
    }
}
