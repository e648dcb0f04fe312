//! # Byte Codec
//!
//! Primitive read/write of bytes, 32-bit integers, and length-prefixed
//! segments over shared buffers.
//!
//! All multi-byte integers are little-endian. Reads are bounds-checked and
//! fail with [`ChannelError::TruncatedMessage`] instead of panicking, so a
//! malformed inbound buffer can never take down the dispatch loop.

use crate::error::{ChannelError, Result};
use bytes::{BufMut, BytesMut};

/// Checked sequential reader over a borrowed byte buffer.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(ChannelError::TruncatedMessage {
                needed: n - self.remaining(),
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    /// Reads a 4-byte length followed by that many raw bytes.
    pub fn read_segment(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }
}

/// Sequential writer building an outbound buffer.
pub struct ByteWriter {
    buf: BytesMut,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    /// Writes a 4-byte length prefix followed by the raw bytes.
    pub fn write_segment(&mut self, segment: &[u8]) {
        self.write_u32(segment.len() as u32);
        self.buf.put_slice(segment);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}
