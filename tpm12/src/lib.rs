// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! Pure Rust TPM 1.2 packet decoder
//!
//! This crate decodes captured TPM 1.2 traffic (for example from a bus
//! sniffer) into typed requests and responses.
//!
//! ## Features
//!
//! - **Lossless catalogs**: ordinals and result codes outside the known
//!   catalogs are kept as raw values
//! - **Context-aware responses**: a response's parameters are decoded with
//!   the schema of the request that preceded it
//! - **Best effort**: decoding stops quietly before a truncated or malformed
//!   packet and returns everything decoded so far
//!
//! ## Modeled Commands
//!
//! - `TPM_Unseal` (request and response parameters)
//!
//! Every other ordinal decodes its parameters as opaque bytes. More commands
//! can be added with [`CommandRegistry::register`].
//!
//! ## Example
//!
//! ```
//! use tpm12::{parse_packets, TpmOrdinal};
//!
//! // TPM_GetRandom request for 16 bytes
//! let data = hex::decode("00c10000000e0000004600000010")?;
//! let packets = parse_packets(&data, None);
//! assert_eq!(packets.len(), 1);
//! assert_eq!(packets[0].ordinal(), Some(TpmOrdinal::GetRandom));
//! # Ok::<(), anyhow::Error>(())
//! ```

mod commands;
mod constants;
mod error;
mod marshal;
mod packet;
mod stream;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::{DecodeError, Result};
pub use packet::{Packet, PacketBody, RequestBody, ResponseBody};
pub use stream::{parse_packets, DecodeContext, PacketStream, StreamDecode};
pub use types::*;

pub use marshal::{Marshal, PacketReader, PacketWriter, Unmarshal};
