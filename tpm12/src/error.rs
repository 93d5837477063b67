// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! Decode errors

use thiserror::Error;

use crate::constants::TpmOrdinal;

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Reasons a single packet (or structure) failed to decode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("buffer underflow: need {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("{field} mismatch: expected {}, found {}", hex::encode(.expected), hex::encode(.found))]
    LiteralMismatch {
        field: &'static str,
        expected: Vec<u8>,
        found: Vec<u8>,
    },

    #[error("unknown packet tag: 0x{0:04x}")]
    UnknownTag(u16),

    #[error("paramSize {0} is smaller than the packet header")]
    ParamSizeTooSmall(u32),

    #[error("{ordinal} parameters left {unread} bytes unread")]
    TrailingParameters { ordinal: TpmOrdinal, unread: usize },
}

impl DecodeError {
    /// Whether more input could have let decoding succeed
    pub fn is_truncation(&self) -> bool {
        matches!(self, DecodeError::Truncated { .. })
    }
}
