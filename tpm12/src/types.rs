// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: BUSL-1.1

//! TPM 1.2 data types

use std::fmt;

use serde::{Serialize, Serializer};
use serde_human_bytes as hex_bytes;

use crate::constants::*;
use crate::error::Result;
use crate::marshal::*;

/// TPM_DIGEST - SHA-1 sized value
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct TpmDigest(pub [u8; DIGEST_SIZE]);

/// TPM_NONCE - same layout as a digest
pub type TpmNonce = TpmDigest;

/// TPM_AUTHDATA - HMAC authorization value
pub type TpmAuthData = TpmDigest;

/// TPM_SECRET - same layout as TPM_AUTHDATA
pub type TpmSecret = TpmDigest;

impl fmt::Debug for TpmDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for TpmDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl Marshal for TpmDigest {
    fn marshal(&self, buf: &mut PacketWriter) {
        self.0.marshal(buf);
    }
}

impl Unmarshal for TpmDigest {
    fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self(buf.get_array()?))
    }
}

/// TPM_PCR_SELECTION - bitmap of selected PCRs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TpmPcrSelection {
    #[serde(with = "hex_bytes")]
    pub pcr_select: Vec<u8>,
}

impl TpmPcrSelection {
    pub fn new(pcrs: &[u32]) -> Self {
        // TPM 1.2 platforms expose at least 24 PCRs
        let max_pcr = pcrs.iter().max().copied().unwrap_or(0);
        let size = ((max_pcr / 8) + 1).max(3) as usize;
        let mut pcr_select = vec![0u8; size];

        for &pcr in pcrs {
            pcr_select[(pcr / 8) as usize] |= 1 << (pcr % 8);
        }

        Self { pcr_select }
    }

    pub fn is_selected(&self, pcr: u32) -> bool {
        self.pcr_select
            .get((pcr / 8) as usize)
            .is_some_and(|byte| byte & (1 << (pcr % 8)) != 0)
    }
}

impl Marshal for TpmPcrSelection {
    fn marshal(&self, buf: &mut PacketWriter) {
        buf.put_u16(self.pcr_select.len() as u16);
        buf.put_bytes(&self.pcr_select);
    }
}

impl Unmarshal for TpmPcrSelection {
    fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
        let size = buf.get_u16()? as usize;
        let pcr_select = buf.get_bytes(size)?;
        Ok(Self { pcr_select })
    }
}

/// TPM_PCR_INFO - PCR state a blob is bound to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TpmPcrInfo {
    pub pcr_selection: TpmPcrSelection,
    pub digest_at_release: TpmDigest,
    pub digest_at_creation: TpmDigest,
}

impl Marshal for TpmPcrInfo {
    fn marshal(&self, buf: &mut PacketWriter) {
        self.pcr_selection.marshal(buf);
        self.digest_at_release.marshal(buf);
        self.digest_at_creation.marshal(buf);
    }
}

impl Unmarshal for TpmPcrInfo {
    fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            pcr_selection: TpmPcrSelection::unmarshal(buf)?,
            digest_at_release: TpmDigest::unmarshal(buf)?,
            digest_at_creation: TpmDigest::unmarshal(buf)?,
        })
    }
}

/// TPM_STORED_DATA - sealed blob envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TpmStoredData {
    /// Declared size of `seal_info`, kept as captured
    pub seal_info_size: u32,
    pub seal_info: TpmPcrInfo,
    #[serde(with = "hex_bytes")]
    pub enc_data: Vec<u8>,
}

impl TpmStoredData {
    /// TPM_STRUCT_VER 1.1.0.0
    pub const VERSION: [u8; 4] = [0x01, 0x01, 0x00, 0x00];

    pub fn new(seal_info: TpmPcrInfo, enc_data: Vec<u8>) -> Self {
        let seal_info_size = seal_info.to_bytes().len() as u32;
        Self {
            seal_info_size,
            seal_info,
            enc_data,
        }
    }
}

impl Marshal for TpmStoredData {
    fn marshal(&self, buf: &mut PacketWriter) {
        buf.put_bytes(&Self::VERSION);
        buf.put_u32(self.seal_info_size);
        self.seal_info.marshal(buf);
        buf.put_sized_u32(&self.enc_data);
    }
}

impl Unmarshal for TpmStoredData {
    fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
        buf.expect_bytes("TPM_STORED_DATA version", &Self::VERSION)?;
        let seal_info_size = buf.get_u32()?;
        let seal_info = TpmPcrInfo::unmarshal(buf)?;
        let enc_data = buf.get_sized_u32()?;
        Ok(Self {
            seal_info_size,
            seal_info,
            enc_data,
        })
    }
}

/// TPM_SEALED_DATA - plaintext layout of a stored blob's encData
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TpmSealedData {
    pub payload: TpmPayloadType,
    pub auth_data: TpmSecret,
    pub tpm_proof: TpmSecret,
    pub stored_digest: TpmDigest,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl Marshal for TpmSealedData {
    fn marshal(&self, buf: &mut PacketWriter) {
        self.payload.marshal(buf);
        self.auth_data.marshal(buf);
        self.tpm_proof.marshal(buf);
        self.stored_digest.marshal(buf);
        buf.put_sized_u32(&self.data);
    }
}

impl Unmarshal for TpmSealedData {
    fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            payload: TpmPayloadType::unmarshal(buf)?,
            auth_data: TpmSecret::unmarshal(buf)?,
            tpm_proof: TpmSecret::unmarshal(buf)?,
            stored_digest: TpmDigest::unmarshal(buf)?,
            data: buf.get_sized_u32()?,
        })
    }
}
