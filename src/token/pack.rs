//! Little-endian packing primitives

use crate::error::{Result, TokenError};

/// Pack a u16 as 2 little-endian bytes
pub fn pack_u16(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

/// Pack a u32 as 4 little-endian bytes
pub fn pack_u32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Pack a string as `[byte_len:u16][utf8 bytes]`
///
/// The prefix counts encoded bytes, not characters.
pub fn pack_string(value: &str) -> Result<Vec<u8>> {
    let mut packer = Packer::with_capacity(2 + value.len());
    packer.put_str(value)?;
    Ok(packer.finish())
}

/// Concatenate buffers in argument order
pub fn concat<B: AsRef<[u8]>>(parts: &[B]) -> Vec<u8> {
    let len = parts.iter().map(|p| p.as_ref().len()).sum();
    let mut out = Vec::with_capacity(len);
    for part in parts {
        out.extend_from_slice(part.as_ref());
    }
    out
}

/// Append-only byte buffer for building packed layouts
#[derive(Debug, Default)]
pub struct Packer {
    buf: Vec<u8>,
}

impl Packer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&pack_u16(value));
        self
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&pack_u32(value));
        self
    }

    /// Write a u16 length that must fit the field, e.g. an element count
    pub fn put_len(&mut self, len: usize, what: &str) -> Result<&mut Self> {
        let len = u16::try_from(len).map_err(|_| {
            TokenError::invalid(format!("{} exceeds {} entries", what, u16::MAX))
        })?;
        Ok(self.put_u16(len))
    }

    /// Length-prefixed bytes
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        let len = u16::try_from(bytes.len()).map_err(|_| {
            TokenError::invalid(format!(
                "field of {} bytes exceeds {} byte limit",
                bytes.len(),
                u16::MAX
            ))
        })?;
        self.put_u16(len);
        self.buf.extend_from_slice(bytes);
        Ok(self)
    }

    /// Length-prefixed UTF-8 string
    pub fn put_str(&mut self, value: &str) -> Result<&mut Self> {
        self.put_bytes(value.as_bytes())
    }

    /// Raw bytes, no prefix
    pub fn put_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
