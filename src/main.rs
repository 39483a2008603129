//! firehose - Strict DAG-CBOR decoder for AT Protocol firehose frames
//!
//! Reads complete messages from files or stdin and prints them as JSON.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::{self, Write};

use console::style;
use firehose_cbor::batch::{decode_inputs, BatchOptions, Input};
use firehose_cbor::cbor::{walk, Item, MajorType};
use firehose_cbor::cli::{Cli, Commands};
use firehose_cbor::config::Config;
use firehose_cbor::render::frame_to_json;
use firehose_cbor::{Result, TrailingBytes};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

/// Main application entry point
fn run() -> i32 {
    let cli = Cli::parse_args();

    let result = load_config(&cli).and_then(|config| {
        init_logging(config.verbose);
        debug!(?config, "loaded configuration");
        execute(cli, config)
    });

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{} {err}", style("Error:").red().bold());
            err.exit_code()
        }
    }
}

/// Config from `--config` or the default location; `--verbose` forces verbose
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if cli.verbose {
        config.verbose = true;
    }
    Ok(config)
}

const fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Log to stderr; verbose lowers the default filter, `RUST_LOG` wins
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute the requested command
fn execute(cli: Cli, mut config: Config) -> Result<()> {
    match cli.command {
        Commands::Decode {
            inputs,
            hex,
            bytes,
            pretty,
            reject_trailing,
            max_depth,
        } => {
            if let Some(bytes) = bytes {
                config.bytes = bytes;
            }
            if pretty {
                config.pretty = true;
            }
            if reject_trailing {
                config.trailing_bytes = TrailingBytes::Reject;
            }
            if let Some(depth) = max_depth {
                config.max_depth = depth;
            }
            config.validate()?;
            handle_decode(&inputs, hex, &config)
        }
        Commands::Inspect { input, hex } => handle_inspect(&input, hex, &config),
        Commands::Config => handle_config(&config),
        Commands::Version => handle_version(),
    }
}

/// Handle decode command
fn handle_decode(inputs: &[String], hex: bool, config: &Config) -> Result<()> {
    let inputs: Vec<Input> = inputs.iter().map(|arg| Input::parse(arg)).collect();
    let options = BatchOptions {
        frame: config.frame_options(),
        hex,
        max_message_bytes: config.max_message_bytes,
        parallelism: config.parallelism,
    };

    let results = decode_inputs(&inputs, &options)?;
    let total = results.len();

    let mut out = io::stdout().lock();
    let mut first_error = None;
    let mut decoded = 0usize;
    for outcome in results {
        match outcome.result {
            Ok(frame) => {
                write_json(&mut out, &frame_to_json(&frame, config.bytes), config.pretty)?;
                decoded += 1;
            }
            Err(err) => {
                eprintln!("{} {}: {err}", style("✗").red(), outcome.input);
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    out.flush()?;

    info!(decoded, total, "decode complete");
    if config.verbose {
        eprintln!(
            "{} Decoded {decoded}/{total} frame(s)",
            style("✓").green()
        );
    }

    first_error.map_or(Ok(()), Err)
}

fn write_json(out: &mut impl Write, value: &serde_json::Value, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Handle inspect command
fn handle_inspect(input: &str, hex: bool, config: &Config) -> Result<()> {
    let input = Input::parse(input);
    let buf = input.read(hex, config.max_message_bytes)?;

    println!(
        "{}",
        style(format!("=== {input}: {} bytes ===", buf.len())).bold().cyan()
    );
    println!("{:>8}  {:<24} {}", "offset", "item", "argument");

    for item in walk(&buf) {
        let item = match item {
            Ok(item) => item,
            Err(err) => {
                let unread = buf.len().saturating_sub(err.offset().unwrap_or(0));
                println!("{} {unread} byte(s) not walked", style("✗").red());
                return Err(err.into());
            }
        };
        let (label, argument) = describe_item(&item);
        println!("{:>8}  {label:<24} {argument}", item.offset);
    }
    Ok(())
}

// Deeper items share the last indentation level
const MAX_INDENT_DEPTH: usize = 32;

fn describe_item(item: &Item) -> (String, String) {
    let indent = "  ".repeat(item.depth.min(MAX_INDENT_DEPTH));
    let label = format!("{indent}{}", item.argument.major);
    let argument = match item.argument.major {
        MajorType::Bytes | MajorType::Text => format!("len {}", item.argument.value),
        MajorType::Array | MajorType::Map => format!("count {}", item.argument.value),
        MajorType::Negative => format!("-1 - {}", item.argument.value),
        _ => item.argument.value.to_string(),
    };
    (label, argument)
}

/// Handle config command
fn handle_config(config: &Config) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Handle version command
fn handle_version() -> Result<()> {
    println!("firehose v{}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use firehose_cbor::cbor::Argument;
    use firehose_cbor::render::BytesRendering;
    use firehose_cbor::FirehoseError;

    #[test]
    fn test_write_json_lines() {
        let mut out = Vec::new();
        let value = serde_json::json!({ "header": { "op": 1 } });
        write_json(&mut out, &value, false).unwrap();
        write_json(&mut out, &value, false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"header\":{\"op\":1}}\n{\"header\":{\"op\":1}}\n"
        );
    }

    #[test]
    fn test_config_file_enables_verbose_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "verbose = true\n").unwrap();

        let cli = Cli::try_parse_from(["firehose", "--config", path.to_str().unwrap(), "config"])
            .unwrap();
        let config = load_config(&cli).unwrap();
        assert!(config.verbose);
        assert_eq!(default_filter(config.verbose), "debug");
    }

    #[test]
    fn test_verbose_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "verbose = false\n").unwrap();

        let cli = Cli::try_parse_from(["firehose", "-v", "--config", path.to_str().unwrap(), "config"])
            .unwrap();
        assert!(load_config(&cli).unwrap().verbose);

        let quiet = Cli::try_parse_from(["firehose", "--config", path.to_str().unwrap(), "config"])
            .unwrap();
        assert_eq!(default_filter(load_config(&quiet).unwrap().verbose), "warn");
    }

    #[test]
    fn test_max_depth_flag_above_ceiling_rejected() {
        let cli = Cli::try_parse_from(["firehose", "decode", "--max-depth", "10000000", "a.bin"])
            .unwrap();
        let err = execute(cli, Config::default()).unwrap_err();
        assert!(matches!(err, FirehoseError::InvalidConfig(_)));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_indentation_is_capped() {
        let item = |depth| Item {
            offset: 0,
            depth,
            argument: Argument {
                major: MajorType::Array,
                value: 1,
                code: 1,
            },
        };

        let (label, argument) = describe_item(&item(2));
        assert_eq!(label, "    array");
        assert_eq!(argument, "count 1");

        let (deep, _) = describe_item(&item(1_000_000));
        let (capped, _) = describe_item(&item(MAX_INDENT_DEPTH));
        assert_eq!(deep, capped);
        assert_eq!(deep.len(), 2 * MAX_INDENT_DEPTH + "array".len());
    }

    #[test]
    fn test_default_rendering_is_elided() {
        assert_eq!(Config::default().bytes, BytesRendering::Elide);
    }
}
