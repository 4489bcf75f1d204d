// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Bit-level cursors over byte buffers.
//!
//! [`BitWriter`] packs unsigned integers LSB-first into little-endian bytes
//! and also provides byte-aligned primitives (fixed-width integers, floats,
//! uleb128 varints, zigzag varints). [`BitReader`] is the inverse cursor.

use bytes::Bytes;

use crate::errors::{ColumnFileError, Result};

/// Computes the ceiling of `value` / `divisor`.
#[inline]
pub fn ceil(value: usize, divisor: usize) -> usize {
    (value + divisor - 1) / divisor
}

/// Returns the minimum number of bits needed to represent `x`.
///
/// `num_required_bits(0)` is 0, matching an all-zero sequence packing to
/// zero data bits.
#[inline]
pub fn num_required_bits(x: u64) -> u8 {
    (64 - x.leading_zeros()) as u8
}

/// Maximum bit width supported by [`BitWriter::put_value`]. Dictionary
/// indices and levels are both well below this.
pub const MAX_BIT_WIDTH: usize = 32;

/// Types that can be materialized from a little-endian byte prefix.
pub trait FromBytes: Sized + Default + Copy {
    /// Builds `Self` from up to `size_of::<Self>()` little-endian bytes,
    /// zero-extending shorter slices.
    fn from_le_slice(bs: &[u8]) -> Self;
}

macro_rules! from_le_bytes {
    ($($ty:ty),*) => {$(
        impl FromBytes for $ty {
            fn from_le_slice(bs: &[u8]) -> Self {
                let mut b = [0u8; std::mem::size_of::<$ty>()];
                let n = bs.len().min(b.len());
                b[..n].copy_from_slice(&bs[..n]);
                <$ty>::from_le_bytes(b)
            }
        }
    )*};
}

from_le_bytes! { u8, u16, u32, u64, i16, i32, i64 }

impl FromBytes for bool {
    fn from_le_slice(bs: &[u8]) -> Self {
        bs.first().is_some_and(|b| *b != 0)
    }
}

impl FromBytes for f32 {
    fn from_le_slice(bs: &[u8]) -> Self {
        f32::from_le_bytes([bs[0], bs[1], bs[2], bs[3]])
    }
}

impl FromBytes for f64 {
    fn from_le_slice(bs: &[u8]) -> Self {
        let mut b = [0u8; 8];
        b.copy_from_slice(&bs[..8]);
        f64::from_le_bytes(b)
    }
}

// ----------------------------------------------------------------------
// Writer

/// Sequential bit and byte writer backed by a growable buffer.
pub struct BitWriter {
    buffer: Vec<u8>,
    /// Bits not yet flushed into `buffer`, LSB first.
    buffered_values: u64,
    /// Number of valid bits in `buffered_values`, always < 8 between calls.
    bit_offset: usize,
}

impl BitWriter {
    /// Creates a writer with the given initial capacity in bytes.
    pub fn new(initial_capacity: usize) -> Self {
        Self::new_from_buf(Vec::with_capacity(initial_capacity))
    }

    /// Creates a writer appending to an existing buffer.
    pub fn new_from_buf(buffer: Vec<u8>) -> Self {
        Self {
            buffer,
            buffered_values: 0,
            bit_offset: 0,
        }
    }

    /// Writes the `num_bits` low bits of `v`.
    ///
    /// Fails with [`ColumnFileError::ValueOutOfRange`] when `v` has bits set
    /// above `num_bits`; silently truncating here would corrupt data pages.
    pub fn put_value(&mut self, v: u64, num_bits: usize) -> Result<()> {
        debug_assert!(num_bits <= MAX_BIT_WIDTH);
        if num_bits < 64 && (v >> num_bits) != 0 {
            return Err(ColumnFileError::ValueOutOfRange {
                value: v,
                bit_width: num_bits as u8,
            });
        }
        self.buffered_values |= v << self.bit_offset;
        self.bit_offset += num_bits;
        while self.bit_offset >= 8 {
            self.buffer.push((self.buffered_values & 0xFF) as u8);
            self.buffered_values >>= 8;
            self.bit_offset -= 8;
        }
        Ok(())
    }

    /// Pads the current byte with zero bits, so following writes are
    /// byte-aligned. A no-op when already aligned.
    pub fn flush_to_byte_boundary(&mut self) {
        if self.bit_offset > 0 {
            self.buffer.push((self.buffered_values & 0xFF) as u8);
            self.buffered_values = 0;
            self.bit_offset = 0;
        }
    }

    /// Writes the `num_bytes` low bytes of `v` little-endian, starting at
    /// the next byte boundary.
    pub fn put_aligned(&mut self, v: u64, num_bytes: usize) {
        debug_assert!(num_bytes <= 8);
        self.flush_to_byte_boundary();
        self.buffer.extend_from_slice(&v.to_le_bytes()[..num_bytes]);
    }

    /// Writes raw bytes starting at the next byte boundary.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.flush_to_byte_boundary();
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes `v` as an unsigned LEB128 varint.
    pub fn put_vlq_int(&mut self, mut v: u64) {
        self.flush_to_byte_boundary();
        while v >= 0x80 {
            self.buffer.push(((v & 0x7F) | 0x80) as u8);
            v >>= 7;
        }
        self.buffer.push(v as u8);
    }

    /// Writes `v` zigzag-encoded as an unsigned LEB128 varint.
    pub fn put_zigzag_vlq_int(&mut self, v: i64) {
        let u = ((v << 1) ^ (v >> 63)) as u64;
        self.put_vlq_int(u);
    }

    /// Writes a 4-byte little-endian length prefix followed by the bytes.
    pub fn put_length_prefixed(&mut self, bytes: &[u8]) {
        self.put_aligned(bytes.len() as u64, 4);
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of complete bytes written so far.
    pub fn bytes_written(&self) -> usize {
        self.buffer.len() + ceil(self.bit_offset, 8)
    }

    /// Flushes any partial byte and returns the buffer.
    pub fn consume(mut self) -> Vec<u8> {
        self.flush_to_byte_boundary();
        self.buffer
    }

    /// Flushes any partial byte and exposes the buffer.
    pub fn flush_buffer(&mut self) -> &[u8] {
        self.flush_to_byte_boundary();
        &self.buffer
    }

    /// Resets the writer, keeping the allocation.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.buffered_values = 0;
        self.bit_offset = 0;
    }
}

// ----------------------------------------------------------------------
// Reader

/// Sequential bit and byte reader over an immutable buffer.
///
/// Bit-level reads return `None` once the buffer is exhausted; callers map
/// that to [`ColumnFileError::Eof`] with context about what was being read.
pub struct BitReader {
    buffer: Bytes,
    byte_offset: usize,
    /// Bit position within the current byte, always < 8.
    bit_offset: usize,
}

impl BitReader {
    /// Creates a reader over `buffer`.
    pub fn new(buffer: Bytes) -> Self {
        Self {
            buffer,
            byte_offset: 0,
            bit_offset: 0,
        }
    }

    /// Replaces the underlying buffer and rewinds the cursor.
    pub fn reset(&mut self, buffer: Bytes) {
        self.buffer = buffer;
        self.byte_offset = 0;
        self.bit_offset = 0;
    }

    /// Number of whole bytes remaining from the current (rounded up) position.
    pub fn remaining_bytes(&self) -> usize {
        self.buffer
            .len()
            .saturating_sub(self.byte_offset + usize::from(self.bit_offset > 0))
    }

    /// Current byte position, rounding any partial byte up.
    pub fn position(&self) -> usize {
        self.byte_offset + usize::from(self.bit_offset > 0)
    }

    /// Reads `num_bits` bits as an unsigned integer, LSB first.
    pub fn get_value(&mut self, num_bits: usize) -> Option<u64> {
        debug_assert!(num_bits <= MAX_BIT_WIDTH);
        if num_bits == 0 {
            return Some(0);
        }
        let bits_available = (self.buffer.len() - self.byte_offset)
            .checked_mul(8)?
            .checked_sub(self.bit_offset)?;
        if bits_available < num_bits {
            return None;
        }
        let mut v: u64 = 0;
        let mut bits_read = 0;
        while bits_read < num_bits {
            let byte = self.buffer[self.byte_offset] as u64;
            let avail = 8 - self.bit_offset;
            let take = avail.min(num_bits - bits_read);
            let chunk = (byte >> self.bit_offset) & ((1u64 << take) - 1);
            v |= chunk << bits_read;
            bits_read += take;
            self.bit_offset += take;
            if self.bit_offset == 8 {
                self.bit_offset = 0;
                self.byte_offset += 1;
            }
        }
        Some(v)
    }

    /// Reads up to `batch.len()` values of `num_bits` each, returning how
    /// many were read before the buffer ran out.
    pub fn get_batch(&mut self, batch: &mut [u64], num_bits: usize) -> usize {
        for (i, slot) in batch.iter_mut().enumerate() {
            match self.get_value(num_bits) {
                Some(v) => *slot = v,
                None => return i,
            }
        }
        batch.len()
    }

    /// Skips up to `num_values` values of `num_bits` each, returning how
    /// many were skipped.
    pub fn skip(&mut self, num_values: usize, num_bits: usize) -> usize {
        for i in 0..num_values {
            if self.get_value(num_bits).is_none() {
                return i;
            }
        }
        num_values
    }

    /// Aligns to the next byte boundary, discarding padding bits.
    fn align_to_byte(&mut self) {
        if self.bit_offset > 0 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }
    }

    /// Reads `num_bytes` little-endian bytes into `T`, starting at the next
    /// byte boundary.
    pub fn get_aligned<T: FromBytes>(&mut self, num_bytes: usize) -> Option<T> {
        self.align_to_byte();
        if self.byte_offset + num_bytes > self.buffer.len() {
            return None;
        }
        let v = T::from_le_slice(&self.buffer[self.byte_offset..self.byte_offset + num_bytes]);
        self.byte_offset += num_bytes;
        Some(v)
    }

    /// Reads an unsigned LEB128 varint, starting at the next byte boundary.
    pub fn get_vlq_int(&mut self) -> Option<u64> {
        self.align_to_byte();
        let mut v: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = *self.buffer.get(self.byte_offset)?;
            self.byte_offset += 1;
            v |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Some(v);
            }
            shift += 7;
            if shift >= 64 {
                return None;
            }
        }
    }

    /// Reads a zigzag-encoded LEB128 varint.
    pub fn get_zigzag_vlq_int(&mut self) -> Option<i64> {
        let u = self.get_vlq_int()?;
        Some(((u >> 1) as i64) ^ -((u & 1) as i64))
    }

    /// Reads exactly `len` raw bytes, starting at the next byte boundary.
    pub fn get_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.align_to_byte();
        if self.byte_offset + len > self.buffer.len() {
            return Err(eof_err!(
                "requested {} bytes at offset {} but buffer holds {}",
                len,
                self.byte_offset,
                self.buffer.len()
            ));
        }
        let b = self.buffer.slice(self.byte_offset..self.byte_offset + len);
        self.byte_offset += len;
        Ok(b)
    }

    /// Reads a 4-byte little-endian length prefix followed by that many bytes.
    pub fn get_length_prefixed(&mut self) -> Result<Bytes> {
        let len = self
            .get_aligned::<u32>(4)
            .ok_or_else(|| eof_err!("not enough data for length prefix"))?;
        self.get_bytes(len as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_required_bits() {
        assert_eq!(num_required_bits(0), 0);
        assert_eq!(num_required_bits(1), 1);
        assert_eq!(num_required_bits(2), 2);
        assert_eq!(num_required_bits(7), 3);
        assert_eq!(num_required_bits(8), 4);
        assert_eq!(num_required_bits(u64::MAX), 64);
    }

    #[test]
    fn test_bit_packing_roundtrip() {
        let values: Vec<u64> = vec![0, 1, 2, 3, 4, 5, 6, 7];
        let mut writer = BitWriter::new(16);
        for v in &values {
            writer.put_value(*v, 3).unwrap();
        }
        let buf = writer.consume();
        // 8 values of 3 bits pack into 3 bytes
        assert_eq!(buf.len(), 3);

        let mut reader = BitReader::new(buf.into());
        for v in &values {
            assert_eq!(reader.get_value(3), Some(*v));
        }
        assert_eq!(reader.get_value(3), None);
    }

    #[test]
    fn test_put_value_out_of_range() {
        let mut writer = BitWriter::new(8);
        let err = writer.put_value(9, 3).unwrap_err();
        assert!(matches!(
            err,
            ColumnFileError::ValueOutOfRange {
                value: 9,
                bit_width: 3
            }
        ));
    }

    #[test]
    fn test_final_byte_zero_padded() {
        let mut writer = BitWriter::new(8);
        for v in [1u64, 1, 1] {
            writer.put_value(v, 1).unwrap();
        }
        let buf = writer.consume();
        assert_eq!(buf, vec![0b0000_0111]);
    }

    #[test]
    fn test_vlq_roundtrip() {
        let values = [0u64, 1, 127, 128, 300, 16384, u32::MAX as u64, u64::MAX];
        let mut writer = BitWriter::new(64);
        for v in values {
            writer.put_vlq_int(v);
        }
        let mut reader = BitReader::new(writer.consume().into());
        for v in values {
            assert_eq!(reader.get_vlq_int(), Some(v));
        }
        assert_eq!(reader.get_vlq_int(), None);
    }

    #[test]
    fn test_zigzag_roundtrip() {
        let values = [0i64, -1, 1, -2, 63, -64, i64::MIN, i64::MAX];
        let mut writer = BitWriter::new(64);
        for v in values {
            writer.put_zigzag_vlq_int(v);
        }
        let mut reader = BitReader::new(writer.consume().into());
        for v in values {
            assert_eq!(reader.get_zigzag_vlq_int(), Some(v));
        }
    }

    #[test]
    fn test_aligned_after_bits() {
        let mut writer = BitWriter::new(16);
        writer.put_value(1, 1).unwrap();
        writer.put_aligned(0xABCD, 2);
        let mut reader = BitReader::new(writer.consume().into());
        assert_eq!(reader.get_value(1), Some(1));
        // aligned read skips the padding bits of the partial byte
        assert_eq!(reader.get_aligned::<u16>(2), Some(0xABCD));
    }

    #[test]
    fn test_length_prefixed() {
        let mut writer = BitWriter::new(16);
        writer.put_length_prefixed(b"abc");
        let buf = writer.consume();
        assert_eq!(&buf[..4], &3u32.to_le_bytes());
        let mut reader = BitReader::new(buf.into());
        assert_eq!(reader.get_length_prefixed().unwrap().as_ref(), b"abc");
    }

    #[test]
    fn test_get_bytes_past_end() {
        let mut reader = BitReader::new(Bytes::from_static(b"xy"));
        let err = reader.get_bytes(3).unwrap_err();
        assert!(matches!(err, ColumnFileError::Eof(_)));
    }

    #[test]
    fn test_get_batch_partial() {
        let mut writer = BitWriter::new(4);
        for v in 0..4u64 {
            writer.put_value(v, 2).unwrap();
        }
        let mut reader = BitReader::new(writer.consume().into());
        let mut batch = [0u64; 8];
        // only 4 values were written; one byte holds exactly 4
        assert_eq!(reader.get_batch(&mut batch, 2), 4);
        assert_eq!(&batch[..4], &[0, 1, 2, 3]);
    }
}
