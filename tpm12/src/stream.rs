// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! Best-effort decoding of captured request/response sequences
//!
//! Packets are expected as RQU, RSP, RQU, RSP... with each response answering
//! the request right before it. Decoding stops silently before the first
//! packet that cannot be decoded.

use tracing::debug;

use crate::commands::CommandRegistry;
use crate::constants::TpmOrdinal;
use crate::error::DecodeError;
use crate::marshal::PacketReader;
use crate::packet::Packet;

/// Ordinal of the most recent request, needed to decode the next response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeContext {
    last_command: Option<TpmOrdinal>,
}

impl DecodeContext {
    /// Start a stream whose first response answers `previous_command`
    pub fn new(previous_command: Option<TpmOrdinal>) -> Self {
        Self {
            last_command: previous_command,
        }
    }

    pub fn last_command(&self) -> Option<TpmOrdinal> {
        self.last_command
    }

    /// Remember a request's ordinal, or forget it once its response is seen
    pub fn observe(&mut self, packet: &Packet) {
        self.last_command = packet.ordinal();
    }
}

/// Outcome of decoding a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDecode {
    pub packets: Vec<Packet>,
    /// Bytes covered by `packets`
    pub consumed: usize,
    /// Why decoding stopped before the end of the buffer
    pub stop: Option<DecodeError>,
}

impl StreamDecode {
    /// Bytes left after the last decoded packet
    pub fn trailing<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.consumed.min(data.len())..]
    }

    pub fn is_complete(&self) -> bool {
        self.stop.is_none()
    }
}

/// Decodes a buffer of back-to-back packets against a command registry
#[derive(Debug, Clone, Copy)]
pub struct PacketStream<'r> {
    registry: &'r CommandRegistry,
}

impl<'r> PacketStream<'r> {
    pub fn new(registry: &'r CommandRegistry) -> Self {
        Self { registry }
    }

    /// Decode as many complete packets as possible
    pub fn decode(&self, data: &[u8], previous_command: Option<TpmOrdinal>) -> StreamDecode {
        let mut buf = PacketReader::new(data);
        let mut context = DecodeContext::new(previous_command);
        let mut packets = Vec::new();
        let mut stop = None;

        while !buf.is_empty() {
            match Packet::decode(&mut buf, self.registry, context.last_command()) {
                Ok(packet) => {
                    context.observe(&packet);
                    packets.push(packet);
                }
                Err(err) => {
                    debug!(
                        "stopping after {} packets at offset {}: {}",
                        packets.len(),
                        buf.position(),
                        err
                    );
                    stop = Some(err);
                    break;
                }
            }
        }

        StreamDecode {
            packets,
            consumed: buf.position(),
            stop,
        }
    }
}

/// Parse as many packets as possible with the default command registry
///
/// Pass `previous_command` when the data starts with a response.
pub fn parse_packets(data: &[u8], previous_command: Option<TpmOrdinal>) -> Vec<Packet> {
    let registry = CommandRegistry::default();
    PacketStream::new(&registry)
        .decode(data, previous_command)
        .packets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{RequestParams, ResponseParams};
    use crate::constants::{TpmResult, TpmTag};
    use crate::marshal::Marshal;

    fn get_random_request() -> Packet {
        Packet::request(
            TpmTag::RquCommand,
            TpmOrdinal::GetRandom,
            RequestParams::Opaque(vec![0, 0, 0, 4]),
        )
    }

    fn get_random_response() -> Packet {
        Packet::response(
            TpmTag::RspCommand,
            TpmResult::Success,
            ResponseParams::Opaque(vec![0, 0, 0, 4, 9, 8, 7, 6]),
        )
    }

    #[test]
    fn test_context_tracks_requests() {
        let mut context = DecodeContext::new(None);
        context.observe(&get_random_request());
        assert_eq!(context.last_command(), Some(TpmOrdinal::GetRandom));
        context.observe(&get_random_response());
        assert_eq!(context.last_command(), None);
    }

    #[test]
    fn test_empty_input() {
        let registry = CommandRegistry::default();
        let decoded = PacketStream::new(&registry).decode(&[], None);
        assert!(decoded.packets.is_empty());
        assert!(decoded.is_complete());
        assert_eq!(decoded.consumed, 0);
    }

    #[test]
    fn test_consecutive_requests() {
        let mut data = get_random_request().to_bytes();
        data.extend(get_random_request().to_bytes());
        data.extend(get_random_response().to_bytes());

        let packets = parse_packets(&data, None);
        assert_eq!(
            packets,
            vec![
                get_random_request(),
                get_random_request(),
                get_random_response()
            ]
        );
    }

    #[test]
    fn test_report_exposes_trailing_bytes() {
        let mut data = get_random_request().to_bytes();
        data.extend([0x00, 0xC4, 0x00]);

        let registry = CommandRegistry::default();
        let decoded = PacketStream::new(&registry).decode(&data, None);
        assert_eq!(decoded.packets.len(), 1);
        assert_eq!(decoded.consumed, 14);
        assert_eq!(decoded.trailing(&data), &[0x00, 0xC4, 0x00]);
        assert!(decoded.stop.as_ref().is_some_and(|e| e.is_truncation()));
    }
}
