// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: BUSL-1.1

//! TPM 1.2 marshalling/unmarshalling utilities
//!
//! All multi-byte integers on the wire are big-endian.

use crate::error::{DecodeError, Result};

/// Buffer for building TPM packets
#[derive(Debug, Default)]
pub struct PacketWriter {
    data: Vec<u8>,
}

impl PacketWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn put_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Put a byte block preceded by its u32 length
    pub fn put_sized_u32(&mut self, data: &[u8]) {
        self.put_u32(data.len() as u32);
        self.put_bytes(data);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

/// Cursor over captured packet bytes
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn take_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(DecodeError::Truncated {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let data: &'a [u8] = self.data;
        let v = &data[self.pos..self.pos + len];
        self.pos += len;
        Ok(v)
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        Ok(self.get_array::<1>()?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.get_array()?))
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.get_array()?))
    }

    pub fn get_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut v = [0u8; N];
        v.copy_from_slice(self.take_slice(N)?);
        Ok(v)
    }

    pub fn get_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        Ok(self.take_slice(len)?.to_vec())
    }

    /// Get a byte block preceded by its u32 length
    pub fn get_sized_u32(&mut self) -> Result<Vec<u8>> {
        let size = self.get_u32()? as usize;
        self.get_bytes(size)
    }

    /// Consume bytes that must equal `expected`
    pub fn expect_bytes(&mut self, field: &'static str, expected: &[u8]) -> Result<()> {
        let found = self.take_slice(expected.len())?;
        if found != expected {
            return Err(DecodeError::LiteralMismatch {
                field,
                expected: expected.to_vec(),
                found: found.to_vec(),
            });
        }
        Ok(())
    }

    /// Split off the next `len` bytes as an independent reader
    pub fn sub_reader(&mut self, len: usize) -> Result<PacketReader<'a>> {
        Ok(PacketReader::new(self.take_slice(len)?))
    }

    /// Get remaining bytes
    pub fn get_remaining(&mut self) -> Vec<u8> {
        let v = self.data[self.pos..].to_vec();
        self.pos = self.data.len();
        v
    }

    /// Peek at bytes without advancing position
    pub fn peek_bytes(&self, len: usize) -> Result<&'a [u8]> {
        self.clone().take_slice(len)
    }
}

/// Trait for types that can be marshalled to TPM format
pub trait Marshal {
    fn marshal(&self, buf: &mut PacketWriter);

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = PacketWriter::new();
        self.marshal(&mut buf);
        buf.into_vec()
    }
}

/// Trait for types that can be unmarshalled from TPM format
pub trait Unmarshal: Sized {
    fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self>;

    fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut buf = PacketReader::new(data);
        Self::unmarshal(&mut buf)
    }
}

impl Marshal for u8 {
    fn marshal(&self, buf: &mut PacketWriter) {
        buf.put_u8(*self);
    }
}

impl Marshal for u16 {
    fn marshal(&self, buf: &mut PacketWriter) {
        buf.put_u16(*self);
    }
}

impl Marshal for u32 {
    fn marshal(&self, buf: &mut PacketWriter) {
        buf.put_u32(*self);
    }
}

impl<const N: usize> Marshal for [u8; N] {
    fn marshal(&self, buf: &mut PacketWriter) {
        buf.put_bytes(self);
    }
}

impl Unmarshal for u8 {
    fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
        buf.get_u8()
    }
}

impl Unmarshal for u16 {
    fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
        buf.get_u16()
    }
}

impl Unmarshal for u32 {
    fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
        buf.get_u32()
    }
}

impl<const N: usize> Unmarshal for [u8; N] {
    fn unmarshal(buf: &mut PacketReader<'_>) -> Result<Self> {
        buf.get_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_integers() {
        let mut w = PacketWriter::new();
        w.put_u16(0x00C1);
        w.put_u32(0x0000_0018);
        w.put_u8(0x7f);
        assert_eq!(w.as_bytes(), &[0x00, 0xC1, 0x00, 0x00, 0x00, 0x18, 0x7f]);

        let bytes = w.into_vec();
        let mut r = PacketReader::new(&bytes);
        assert_eq!(r.get_u16().unwrap(), 0x00C1);
        assert_eq!(r.get_u32().unwrap(), 0x18);
        assert_eq!(r.get_u8().unwrap(), 0x7f);
        assert!(r.is_empty());
    }

    #[test]
    fn test_underflow_does_not_advance() {
        let data = [0x01, 0x02, 0x03];
        let mut r = PacketReader::new(&data);
        let err = r.get_u32().unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                needed: 4,
                remaining: 3
            }
        );
        assert_eq!(r.position(), 0);
        assert_eq!(r.get_bytes(3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_sized_block() {
        let mut w = PacketWriter::new();
        w.put_sized_u32(b"abc");
        let bytes = w.into_vec();
        assert_eq!(bytes.len(), 7);
        assert_eq!(PacketReader::new(&bytes).get_sized_u32().unwrap(), b"abc");
    }

    #[test]
    fn test_expect_bytes() {
        let data = [0x01, 0x01, 0x00, 0x00, 0x01, 0x02, 0x00, 0x00];
        let mut r = PacketReader::new(&data);
        r.expect_bytes("ver", &[0x01, 0x01, 0x00, 0x00]).unwrap();
        let err = r.expect_bytes("ver", &[0x01, 0x01, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, DecodeError::LiteralMismatch { field: "ver", .. }));
    }

    #[test]
    fn test_sub_reader_is_bounded() {
        let data = [0xAA, 0xBB, 0xCC, 0xDD];
        let mut r = PacketReader::new(&data);
        let mut sub = r.sub_reader(2).unwrap();
        assert_eq!(r.remaining(), 2);
        assert_eq!(sub.get_u8().unwrap(), 0xAA);
        assert!(sub.get_u16().unwrap_err().is_truncation());
        assert_eq!(sub.peek_bytes(1).unwrap(), &[0xBB]);
    }
}
