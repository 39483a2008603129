//! Batch decoding: read complete messages from files or stdin and decode
//! them in parallel.
//!
//! Each input holds exactly one complete message. Frames own all their
//! data, so every buffer is dropped as soon as its frame is built.

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{FirehoseError, Result};
use crate::frame::{decode_frame_with, Frame, FrameOptions};

/// Command-line spelling of standard input
pub const STDIN_ARG: &str = "-";

/// Where a message buffer comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Standard input
    Stdin,
    /// A file on disk
    File(PathBuf),
}

impl Input {
    /// Interpret a command-line argument (`-` means stdin)
    pub fn parse(arg: &str) -> Self {
        if arg == STDIN_ARG {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    /// Read the full message, enforcing the size limit.
    ///
    /// With `hex` set the input is hex text (whitespace ignored) and the
    /// limit applies to the decoded bytes.
    pub fn read(&self, hex: bool, limit: usize) -> Result<Vec<u8>> {
        let raw = match self {
            Self::Stdin => read_limited(io::stdin().lock(), self, read_limit(hex, limit))?,
            Self::File(path) => {
                let file = fs::File::open(path).map_err(|e| self.read_error(&e))?;
                read_limited(file, self, read_limit(hex, limit))?
            }
        };

        let bytes = if hex { self.decode_hex(&raw)? } else { raw };
        if bytes.len() > limit {
            return Err(self.too_large(bytes.len(), limit));
        }
        Ok(bytes)
    }

    fn decode_hex(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let digits: Vec<u8> = raw
            .iter()
            .copied()
            .filter(|byte| !byte.is_ascii_whitespace())
            .collect();
        hex::decode(digits).map_err(|e| FirehoseError::InvalidHex {
            input: self.to_string(),
            reason: e.to_string(),
        })
    }

    fn read_error(&self, err: &io::Error) -> FirehoseError {
        FirehoseError::InputRead {
            path: match self {
                Self::Stdin => PathBuf::from(STDIN_ARG),
                Self::File(path) => path.clone(),
            },
            reason: err.to_string(),
        }
    }

    fn too_large(&self, size: usize, limit: usize) -> FirehoseError {
        FirehoseError::MessageTooLarge {
            input: self.to_string(),
            size,
            limit,
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

// Hex text is two digits per byte plus arbitrary whitespace
const fn read_limit(hex: bool, limit: usize) -> usize {
    if hex {
        limit.saturating_mul(4)
    } else {
        limit
    }
}

fn read_limited(reader: impl Read, input: &Input, limit: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let _ = reader
        .take(cap)
        .read_to_end(&mut buf)
        .map_err(|e| input.read_error(&e))?;
    if buf.len() > limit {
        return Err(input.too_large(buf.len(), limit));
    }
    Ok(buf)
}

/// Settings for a batch decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Frame decoding options
    pub frame: FrameOptions,
    /// Inputs are hex text
    pub hex: bool,
    /// Largest message accepted, in bytes
    pub max_message_bytes: usize,
    /// Maximum inputs decoded concurrently
    pub parallelism: usize,
}

/// Outcome for one input
#[derive(Debug)]
pub struct DecodedInput {
    /// The input that was read
    pub input: Input,
    /// The frame, or why it could not be produced
    pub result: Result<Frame>,
}

/// Read and decode one input
pub fn decode_input(input: &Input, options: &BatchOptions) -> Result<Frame> {
    let buf = input.read(options.hex, options.max_message_bytes)?;
    debug!(input = %input, bytes = buf.len(), "read message");

    let frame = decode_frame_with(&buf, &options.frame).map_err(|source| {
        FirehoseError::DecodeInput {
            input: input.to_string(),
            source,
        }
    })?;

    let remaining = buf.len() - frame.encoded_len();
    if remaining > 0 {
        warn!(input = %input, remaining, "ignoring trailing bytes after frame payload");
    }
    debug!(
        input = %input,
        op = ?frame.op(),
        kind = frame.kind().unwrap_or("-"),
        "decoded frame"
    );
    Ok(frame)
}

/// Decode every input, in parallel, returning results in input order
pub fn decode_inputs(inputs: &[Input], options: &BatchOptions) -> Result<Vec<DecodedInput>> {
    if inputs.iter().filter(|input| **input == Input::Stdin).count() > 1 {
        return Err(FirehoseError::InvalidArgument(
            "standard input ('-') can only be given once".to_string(),
        ));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.parallelism.max(1))
        .build()
        .map_err(|e| FirehoseError::Internal(format!("Failed to start decode pool: {e}")))?;

    debug!(inputs = inputs.len(), parallelism = options.parallelism, "decoding batch");

    Ok(pool.install(|| {
        inputs
            .par_iter()
            .map(|input| DecodedInput {
                input: input.clone(),
                result: decode_input(input, options),
            })
            .collect()
    }))
}
