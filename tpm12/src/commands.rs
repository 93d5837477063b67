// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! TPM 1.2 command parameter schemas
//!
//! A request carries its ordinal, a response does not: the registry is
//! asked for a response schema with the ordinal of the request that
//! preceded it. Ordinals without a registered schema decode as opaque bytes.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde_human_bytes as hex_bytes;
use tracing::trace;

use crate::constants::*;
use crate::error::Result;
use crate::marshal::*;
use crate::types::*;

/// Decoded request parameters (everything after the ordinal)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestParams {
    Unseal(UnsealRequest),
    Opaque(#[serde(with = "hex_bytes")] Vec<u8>),
}

/// Decoded response parameters (everything after the return code)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseParams {
    Unseal(UnsealResponse),
    Opaque(#[serde(with = "hex_bytes")] Vec<u8>),
}

impl RequestParams {
    pub fn is_opaque(&self) -> bool {
        matches!(self, RequestParams::Opaque(_))
    }
}

impl ResponseParams {
    pub fn is_opaque(&self) -> bool {
        matches!(self, ResponseParams::Opaque(_))
    }
}

impl Marshal for RequestParams {
    fn marshal(&self, buf: &mut PacketWriter) {
        match self {
            RequestParams::Unseal(params) => params.marshal(buf),
            RequestParams::Opaque(bytes) => buf.put_bytes(bytes),
        }
    }
}

impl Marshal for ResponseParams {
    fn marshal(&self, buf: &mut PacketWriter) {
        match self {
            ResponseParams::Unseal(params) => params.marshal(buf),
            ResponseParams::Opaque(bytes) => buf.put_bytes(bytes),
        }
    }
}

/// TPM_Unseal incoming parameters (two authorization sessions)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsealRequest {
    pub parent_handle: u32,
    pub in_data: TpmStoredData,
    pub auth_handle: u32,
    pub nonce_odd: TpmNonce,
    pub continue_auth_session: u8,
    pub parent_auth: TpmAuthData,
    pub data_auth_handle: u32,
    pub data_nonce_odd: TpmNonce,
    pub continue_data_session: u8,
    pub data_auth: TpmAuthData,
}

impl Marshal for UnsealRequest {
    fn marshal(&self, buf: &mut PacketWriter) {
        buf.put_u32(self.parent_handle);
        self.in_data.marshal(buf);
        buf.put_u32(self.auth_handle);
        self.nonce_odd.marshal(buf);
        buf.put_u8(self.continue_auth_session);
        self.parent_auth.marshal(buf);
        buf.put_u32(self.data_auth_handle);
        self.data_nonce_odd.marshal(buf);
        buf.put_u8(self.continue_data_session);
        self.data_auth.marshal(buf);
    }
}

impl Unmarshal for UnsealRequest {
    fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            parent_handle: buf.get_u32()?,
            in_data: TpmStoredData::unmarshal(buf)?,
            auth_handle: buf.get_u32()?,
            nonce_odd: TpmNonce::unmarshal(buf)?,
            continue_auth_session: buf.get_u8()?,
            parent_auth: TpmAuthData::unmarshal(buf)?,
            data_auth_handle: buf.get_u32()?,
            data_nonce_odd: TpmNonce::unmarshal(buf)?,
            continue_data_session: buf.get_u8()?,
            data_auth: TpmAuthData::unmarshal(buf)?,
        })
    }
}

impl From<UnsealRequest> for RequestParams {
    fn from(params: UnsealRequest) -> Self {
        RequestParams::Unseal(params)
    }
}

/// TPM_Unseal outgoing parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsealResponse {
    /// Unsealed data. The wire `sealedDataSize` prefix is always `secret.len()`:
    /// it is read as the length of this block and written back from it.
    #[serde(with = "hex_bytes")]
    pub secret: Vec<u8>,
    pub nonce_even: TpmNonce,
    pub continue_auth_session: u8,
    pub res_auth: TpmAuthData,
    pub data_nonce_even: TpmNonce,
    pub continue_data_session: u8,
    pub data_auth: TpmAuthData,
}

impl Marshal for UnsealResponse {
    fn marshal(&self, buf: &mut PacketWriter) {
        buf.put_sized_u32(&self.secret);
        self.nonce_even.marshal(buf);
        buf.put_u8(self.continue_auth_session);
        self.res_auth.marshal(buf);
        self.data_nonce_even.marshal(buf);
        buf.put_u8(self.continue_data_session);
        self.data_auth.marshal(buf);
    }
}

impl Unmarshal for UnsealResponse {
    fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            secret: buf.get_sized_u32()?,
            nonce_even: TpmNonce::unmarshal(buf)?,
            continue_auth_session: buf.get_u8()?,
            res_auth: TpmAuthData::unmarshal(buf)?,
            data_nonce_even: TpmNonce::unmarshal(buf)?,
            continue_data_session: buf.get_u8()?,
            data_auth: TpmAuthData::unmarshal(buf)?,
        })
    }
}

impl From<UnsealResponse> for ResponseParams {
    fn from(params: UnsealResponse) -> Self {
        ResponseParams::Unseal(params)
    }
}

/// Parameter decoders for one command
pub trait CommandSchema: Send + Sync {
    fn decode_request(&self, buf: &mut PacketReader<'_>) -> Result<RequestParams>;
    fn decode_response(&self, buf: &mut PacketReader<'_>) -> Result<ResponseParams>;
}

/// Schema backed by a pair of `Unmarshal` parameter types
pub struct TypedSchema<Rq, Rs> {
    _phantom: PhantomData<fn() -> (Rq, Rs)>,
}

impl<Rq, Rs> TypedSchema<Rq, Rs> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<Rq, Rs> Default for TypedSchema<Rq, Rs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Rq, Rs> CommandSchema for TypedSchema<Rq, Rs>
where
    Rq: Unmarshal + Into<RequestParams>,
    Rs: Unmarshal + Into<ResponseParams>,
{
    fn decode_request(&self, buf: &mut PacketReader<'_>) -> Result<RequestParams> {
        Ok(Rq::unmarshal(buf)?.into())
    }

    fn decode_response(&self, buf: &mut PacketReader<'_>) -> Result<ResponseParams> {
        Ok(Rs::unmarshal(buf)?.into())
    }
}

/// Maps ordinals to their parameter schemas
pub struct CommandRegistry {
    schemas: HashMap<TpmOrdinal, Box<dyn CommandSchema>>,
}

impl CommandRegistry {
    /// A registry with no schemas; every packet decodes as opaque
    pub fn empty() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Register the request/response parameter types of a command
    pub fn register<Rq, Rs>(&mut self, ordinal: TpmOrdinal) -> &mut Self
    where
        Rq: Unmarshal + Into<RequestParams> + 'static,
        Rs: Unmarshal + Into<ResponseParams> + 'static,
    {
        self.register_schema(ordinal, Box::new(TypedSchema::<Rq, Rs>::new()))
    }

    pub fn register_schema(
        &mut self,
        ordinal: TpmOrdinal,
        schema: Box<dyn CommandSchema>,
    ) -> &mut Self {
        self.schemas.insert(ordinal, schema);
        self
    }

    pub fn get(&self, ordinal: TpmOrdinal) -> Option<&dyn CommandSchema> {
        self.schemas.get(&ordinal).map(|schema| schema.as_ref())
    }

    pub fn is_modeled(&self, ordinal: TpmOrdinal) -> bool {
        self.schemas.contains_key(&ordinal)
    }

    /// Decode request parameters, falling back to the raw remaining bytes
    pub fn decode_request(
        &self,
        ordinal: TpmOrdinal,
        buf: &mut PacketReader<'_>,
    ) -> Result<RequestParams> {
        match self.get(ordinal) {
            Some(schema) => schema.decode_request(buf),
            None => {
                trace!("no request schema for {}, keeping {} raw bytes", ordinal, buf.remaining());
                Ok(RequestParams::Opaque(buf.get_remaining()))
            }
        }
    }

    /// Decode response parameters for the command that preceded the response
    pub fn decode_response(
        &self,
        ordinal: Option<TpmOrdinal>,
        buf: &mut PacketReader<'_>,
    ) -> Result<ResponseParams> {
        match ordinal.and_then(|ordinal| self.get(ordinal)) {
            Some(schema) => schema.decode_response(buf),
            None => {
                trace!(
                    "no response schema for {:?}, keeping {} raw bytes",
                    ordinal,
                    buf.remaining()
                );
                Ok(ResponseParams::Opaque(buf.get_remaining()))
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register::<UnsealRequest, UnsealResponse>(TpmOrdinal::Unseal);
        registry
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.schemas.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(byte: u8) -> TpmDigest {
        TpmDigest([byte; DIGEST_SIZE])
    }

    fn unseal_response() -> UnsealResponse {
        UnsealResponse {
            secret: b"secret".to_vec(),
            nonce_even: digest(1),
            continue_auth_session: 0,
            res_auth: digest(2),
            data_nonce_even: digest(3),
            continue_data_session: 1,
            data_auth: digest(4),
        }
    }

    #[test]
    fn test_unseal_response_layout() {
        let bytes = unseal_response().to_bytes();
        assert_eq!(bytes.len(), 4 + 6 + 2 * (DIGEST_SIZE + 1 + DIGEST_SIZE));
        assert_eq!(&bytes[..4], &[0, 0, 0, 6]);
        assert_eq!(UnsealResponse::from_bytes(&bytes).unwrap(), unseal_response());
    }

    #[test]
    fn test_unseal_response_size_prefix_is_secret_len() {
        let mut bytes = unseal_response().to_bytes();
        // Declare a 5-byte secret: the sixth byte shifts into nonceEven
        bytes[3] = 5;
        let decoded = UnsealResponse::from_bytes(&bytes[..bytes.len() - 1]).unwrap();
        assert_eq!(decoded.secret, b"secre");
        assert_eq!(decoded.nonce_even.0[0], b't');
        assert_eq!(&decoded.to_bytes()[..4], &[0, 0, 0, 5]);

        bytes[3] = 0xFF;
        let err = UnsealResponse::from_bytes(&bytes).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn test_default_registry() {
        let registry = CommandRegistry::default();
        assert!(registry.is_modeled(TpmOrdinal::Unseal));
        assert!(!registry.is_modeled(TpmOrdinal::LoadKey2));
        assert!(!CommandRegistry::empty().is_modeled(TpmOrdinal::Unseal));
    }

    #[test]
    fn test_response_dispatch_uses_context() {
        let registry = CommandRegistry::default();
        let bytes = unseal_response().to_bytes();

        let params = registry
            .decode_response(Some(TpmOrdinal::Unseal), &mut PacketReader::new(&bytes))
            .unwrap();
        assert_eq!(params, ResponseParams::Unseal(unseal_response()));

        let params = registry
            .decode_response(None, &mut PacketReader::new(&bytes))
            .unwrap();
        assert_eq!(params, ResponseParams::Opaque(bytes.clone()));

        let params = registry
            .decode_response(Some(TpmOrdinal::GetRandom), &mut PacketReader::new(&bytes))
            .unwrap();
        assert!(params.is_opaque());
    }

    #[test]
    fn test_request_fallback_keeps_bytes() {
        let registry = CommandRegistry::default();
        let data = [0xde, 0xad, 0xbe, 0xef];
        let mut buf = PacketReader::new(&data);
        let params = registry
            .decode_request(TpmOrdinal::Unknown(0x1234), &mut buf)
            .unwrap();
        assert_eq!(params, RequestParams::Opaque(data.to_vec()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_register_additional_command() {
        struct GetRandomRequest(u32);
        struct GetRandomResponse(Vec<u8>);

        impl Unmarshal for GetRandomRequest {
            fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
                Ok(Self(buf.get_u32()?))
            }
        }
        impl Unmarshal for GetRandomResponse {
            fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
                Ok(Self(buf.get_sized_u32()?))
            }
        }
        impl From<GetRandomRequest> for RequestParams {
            fn from(req: GetRandomRequest) -> Self {
                RequestParams::Opaque(req.0.to_be_bytes().to_vec())
            }
        }
        impl From<GetRandomResponse> for ResponseParams {
            fn from(rsp: GetRandomResponse) -> Self {
                ResponseParams::Opaque(rsp.0)
            }
        }

        let mut registry = CommandRegistry::default();
        registry.register::<GetRandomRequest, GetRandomResponse>(TpmOrdinal::GetRandom);
        assert!(registry.is_modeled(TpmOrdinal::GetRandom));

        let data = [0, 0, 0, 2, 0xAA, 0xBB, 0xCC];
        let mut buf = PacketReader::new(&data);
        let params = registry
            .decode_response(Some(TpmOrdinal::GetRandom), &mut buf)
            .unwrap();
        assert_eq!(params, ResponseParams::Opaque(vec![0xAA, 0xBB]));
        assert_eq!(buf.remaining(), 1);
    }
}
