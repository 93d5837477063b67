// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! Single TPM 1.2 packet codec
//!
//! Wire layout: tag (2) + paramSize (4) + ordinal or returnCode (4) + parameters.
//! `paramSize` counts the whole packet, header included.

use serde::Serialize;
use tracing::debug;

use crate::commands::*;
use crate::constants::*;
use crate::error::{DecodeError, Result};
use crate::marshal::*;

/// One decoded request or response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Packet {
    pub tag: TpmTag,
    pub param_size: u32,
    pub body: PacketBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketBody {
    Request(RequestBody),
    Response(ResponseBody),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestBody {
    pub ordinal: TpmOrdinal,
    pub params: RequestParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseBody {
    pub return_code: TpmResult,
    pub params: ResponseParams,
}

impl Packet {
    /// Build a request packet, computing `paramSize` from the encoded parameters
    pub fn request(tag: TpmTag, ordinal: TpmOrdinal, params: RequestParams) -> Self {
        debug_assert!(tag.is_request());
        let param_size = (PACKET_HEADER_SIZE + params.to_bytes().len()) as u32;
        Self {
            tag,
            param_size,
            body: PacketBody::Request(RequestBody { ordinal, params }),
        }
    }

    /// Build a response packet, computing `paramSize` from the encoded parameters
    pub fn response(tag: TpmTag, return_code: TpmResult, params: ResponseParams) -> Self {
        debug_assert!(tag.is_response());
        let param_size = (PACKET_HEADER_SIZE + params.to_bytes().len()) as u32;
        Self {
            tag,
            param_size,
            body: PacketBody::Response(ResponseBody {
                return_code,
                params,
            }),
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self.body, PacketBody::Request(_))
    }

    /// Ordinal carried by a request; responses carry none
    pub fn ordinal(&self) -> Option<TpmOrdinal> {
        match &self.body {
            PacketBody::Request(body) => Some(body.ordinal),
            PacketBody::Response(_) => None,
        }
    }

    pub fn return_code(&self) -> Option<TpmResult> {
        match &self.body {
            PacketBody::Request(_) => None,
            PacketBody::Response(body) => Some(body.return_code),
        }
    }

    /// Decode one packet at the reader's position
    ///
    /// `last_command` is the ordinal of the preceding request and selects the
    /// parameter schema of a response. The reader only advances on success.
    pub fn decode(
        buf: &mut PacketReader<'_>,
        registry: &CommandRegistry,
        last_command: Option<TpmOrdinal>,
    ) -> Result<Self> {
        let mut cursor = buf.clone();

        let tag = TpmTag::unmarshal(&mut cursor)?;
        let param_size = cursor.get_u32()?;
        if (param_size as usize) < PACKET_HEADER_SIZE {
            return Err(DecodeError::ParamSizeTooSmall(param_size));
        }
        let mut packet = cursor.sub_reader(param_size as usize - PACKET_PREFIX_SIZE)?;

        let body = if tag.is_request() {
            let ordinal = TpmOrdinal::unmarshal(&mut packet)?;
            debug!("decoding {:?} {} ({} bytes)", tag, ordinal, param_size);
            let params = registry.decode_request(ordinal, &mut packet)?;
            ensure_consumed(&packet, ordinal)?;
            PacketBody::Request(RequestBody { ordinal, params })
        } else {
            let return_code = TpmResult::unmarshal(&mut packet)?;
            debug!(
                "decoding {:?} {} for {:?} ({} bytes)",
                tag, return_code, last_command, param_size
            );
            let params = registry.decode_response(last_command, &mut packet)?;
            if let Some(ordinal) = last_command {
                ensure_consumed(&packet, ordinal)?;
            }
            PacketBody::Response(ResponseBody {
                return_code,
                params,
            })
        };

        *buf = cursor;
        Ok(Self {
            tag,
            param_size,
            body,
        })
    }
}

fn ensure_consumed(params: &PacketReader<'_>, ordinal: TpmOrdinal) -> Result<()> {
    if params.is_empty() {
        Ok(())
    } else {
        Err(DecodeError::TrailingParameters {
            ordinal,
            unread: params.remaining(),
        })
    }
}

impl Marshal for Packet {
    fn marshal(&self, buf: &mut PacketWriter) {
        self.tag.marshal(buf);
        buf.put_u32(self.param_size);
        match &self.body {
            PacketBody::Request(body) => {
                body.ordinal.marshal(buf);
                body.params.marshal(buf);
            }
            PacketBody::Response(body) => {
                body.return_code.marshal(buf);
                body.params.marshal(buf);
            }
        }
    }
}
