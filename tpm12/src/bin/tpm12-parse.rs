// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! TPM 1.2 packet stream decoder
//!
//! Usage:
//!   tpm12-parse <HEX stream of packets> [COMMAND]
//!
//! Specify COMMAND (e.g. `TPM_Unseal`) if the first packet is a response to it.

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use tpm12::{CommandRegistry, PacketStream, TpmOrdinal};
use tracing::warn;

/// Decode a captured stream of TPM 1.2 command/response packets
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Hex-encoded packets; whitespace is ignored
    hex: String,

    /// Command the first packet is a response to
    command: Option<String>,

    /// Output format
    #[arg(long, value_enum, env = "TPM12_PARSE_FORMAT", default_value_t = OutputFormat::Debug)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Debug,
    Json,
}

fn main() -> Result<()> {
    {
        use tracing_subscriber::{fmt, EnvFilter};
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            e.print().context("failed to print usage")?;
            std::process::exit(1);
        }
    };

    let previous_command = match args.command.as_deref() {
        None => None,
        Some(name) => match TpmOrdinal::from_name(name) {
            Some(ordinal) => Some(ordinal),
            None => {
                let commands = TpmOrdinal::KNOWN
                    .iter()
                    .map(|ordinal| ordinal.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                eprintln!("{} is not a valid command.", name);
                eprintln!("Valid commands are: {}.", commands);
                eprintln!();
                eprintln!("{}", Args::command().render_usage());
                std::process::exit(1);
            }
        },
    };

    let cleaned: String = args.hex.split_whitespace().collect();
    let data = hex::decode(&cleaned).context("invalid hex stream")?;

    let registry = CommandRegistry::default();
    let decoded = PacketStream::new(&registry).decode(&data, previous_command);
    if let Some(err) = &decoded.stop {
        warn!(
            "ignoring {} trailing bytes at offset {}: {}",
            decoded.trailing(&data).len(),
            decoded.consumed,
            err
        );
    }

    match args.format {
        OutputFormat::Debug => {
            for packet in &decoded.packets {
                println!("{:#?}", packet);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&decoded.packets)
                .context("failed to serialize packets")?;
            println!("{}", json);
        }
    }

    Ok(())
}
