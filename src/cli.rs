//! Command-line interface argument parsing
//!
//! Defines all CLI commands and their arguments using Clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::render::BytesRendering;

/// firehose - Strict DAG-CBOR decoder for AT Protocol firehose frames
#[derive(Parser, Debug)]
#[command(name = "firehose")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Decode AT Protocol repository-sync firehose frames (DAG-CBOR)")]
#[command(long_about = concat!(
    "firehose (v", env!("CARGO_PKG_VERSION"), ")\n",
    "Decodes binary firehose messages (a DAG-CBOR header map followed by a payload map)\n",
    "into JSON. Each input holds exactly one complete message.\n\n",
    "Use 'decode' to render frames as JSON Lines and 'inspect' to list the raw items\n",
    "of a malformed message."
))]
pub struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ~/.config/firehose-cbor/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode frames and print them as JSON Lines
    ///
    /// Inputs are decoded in parallel; output keeps input order.
    ///
    /// Examples:
    ///   firehose decode frame.bin
    ///   firehose decode --bytes hex a.bin b.bin
    ///   xxd -p frame.bin | firehose decode --hex -
    #[command(display_order = 1)]
    Decode {
        /// Message files, or '-' for stdin
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Inputs are hex text instead of raw bytes
        #[arg(long)]
        hex: bool,

        /// How to render byte strings
        #[arg(long, value_enum)]
        bytes: Option<BytesRendering>,

        /// Pretty-print each frame
        #[arg(long)]
        pretty: bool,

        /// Fail when bytes follow the payload map
        #[arg(long)]
        reject_trailing: bool,

        /// Maximum nesting depth
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// List the raw items of a message
    ///
    /// Walks the buffer item by item and prints offset, depth, major type and
    /// argument, stopping at the first framing error.
    ///
    /// Examples:
    ///   firehose inspect frame.bin
    #[command(display_order = 2)]
    Inspect {
        /// Message file, or '-' for stdin
        input: String,

        /// Input is hex text instead of raw bytes
        #[arg(long)]
        hex: bool,
    },

    /// Print the effective configuration as TOML
    #[command(display_order = 3)]
    Config,

    /// Check CLI version
    #[command(display_order = 4)]
    Version,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }
}
