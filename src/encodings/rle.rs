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

//! RLE/Bit-Packing hybrid encoding for levels and dictionary indices.
//!
//! The grammar:
//!
//! rle-bit-packed-hybrid: `<run>`*
//! run := `<bit-packed-run>` | `<rle-run>`
//! bit-packed-run := varint-encode(`<group-count>` << 1 | 1) followed by
//! `group-count * 8` values packed at `bit_width` bits each; the final
//! group is padded with zeros when the input does not divide evenly by 8
//! rle-run := varint-encode(`<repeat-count>` << 1) followed by the repeated
//! value stored in `ceil(bit_width / 8)` little-endian bytes
//!
//! Runs of at least 8 identical values become RLE runs; everything else is
//! emitted as bit-packed groups of 8. The bit width is fixed for the whole
//! sequence and must match between encode and decode; it is never
//! recomputed mid-stream.

use bytes::Bytes;

use crate::errors::{ColumnFileError, Result};
use crate::util::bit_util::{self, BitReader, BitWriter};

/// A RLE/Bit-Packing hybrid encoder.
pub struct RleEncoder {
    /// Number of bits needed per value, in `[0, 32]`. Fixed at creation.
    bit_width: u8,

    bit_writer: BitWriter,

    /// Values awaiting a bit-packed group, at most 8.
    buffered_values: [u64; 8],
    num_buffered_values: usize,

    /// The last value written and how many times it has repeated in a row.
    current_value: u64,
    repeat_count: usize,
}

impl RleEncoder {
    /// Creates an encoder writing values of `bit_width` bits.
    pub fn new(bit_width: u8, buffer_len: usize) -> Self {
        Self::new_from_buf(bit_width, Vec::with_capacity(buffer_len))
    }

    /// Creates an encoder appending to an existing buffer.
    pub fn new_from_buf(bit_width: u8, buffer: Vec<u8>) -> Self {
        Self {
            bit_width,
            bit_writer: BitWriter::new_from_buf(buffer),
            buffered_values: [0; 8],
            num_buffered_values: 0,
            current_value: 0,
            repeat_count: 0,
        }
    }

    /// Returns an upper bound on the encoded size of `num_values` values at
    /// `bit_width`, useful for sizing buffers.
    pub fn max_buffer_size(bit_width: u8, num_values: usize) -> usize {
        // Worst case: every group of 8 is emitted bit-packed with its own
        // one-byte header.
        let num_groups = bit_util::ceil(num_values, 8);
        num_groups * (1 + bit_width as usize)
    }

    /// Encodes one value.
    ///
    /// Fails with [`ColumnFileError::ValueOutOfRange`] when the value does
    /// not fit in the encoder's bit width.
    pub fn put(&mut self, value: u64) -> Result<()> {
        if self.bit_width < 64 && (value >> self.bit_width) != 0 {
            return Err(ColumnFileError::ValueOutOfRange {
                value,
                bit_width: self.bit_width,
            });
        }
        if self.current_value == value {
            self.repeat_count += 1;
            if self.repeat_count > 8 {
                // Continuation of an RLE run, nothing to buffer.
                return Ok(());
            }
        } else {
            if self.repeat_count >= 8 {
                debug_assert_eq!(self.num_buffered_values, 0);
                self.flush_rle_run();
            }
            self.repeat_count = 1;
            self.current_value = value;
        }

        self.buffered_values[self.num_buffered_values] = value;
        self.num_buffered_values += 1;
        if self.num_buffered_values == 8 {
            if self.repeat_count >= 8 {
                // All eight buffered values are identical; keep counting as
                // an RLE run instead of emitting a group.
                self.num_buffered_values = 0;
            } else {
                self.flush_bit_packed_group()?;
            }
        }
        Ok(())
    }

    /// Number of bytes written so far, not counting unflushed state.
    pub fn len(&self) -> usize {
        self.bit_writer.bytes_written()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flushes any pending run. An empty input sequence flushes to zero
    /// bytes.
    pub fn flush(&mut self) -> Result<()> {
        if self.repeat_count >= 8 {
            self.flush_rle_run();
        } else if self.num_buffered_values > 0 {
            while self.num_buffered_values < 8 {
                self.buffered_values[self.num_buffered_values] = 0;
                self.num_buffered_values += 1;
            }
            self.flush_bit_packed_group()?;
        }
        Ok(())
    }

    /// Flushes and returns the encoded buffer.
    pub fn consume(mut self) -> Result<Vec<u8>> {
        self.flush()?;
        Ok(self.bit_writer.consume())
    }

    fn flush_rle_run(&mut self) {
        debug_assert!(self.repeat_count >= 8);
        self.bit_writer.put_vlq_int((self.repeat_count << 1) as u64);
        self.bit_writer.put_aligned(
            self.current_value,
            bit_util::ceil(self.bit_width as usize, 8),
        );
        self.repeat_count = 0;
        self.num_buffered_values = 0;
    }

    fn flush_bit_packed_group(&mut self) -> Result<()> {
        debug_assert_eq!(self.num_buffered_values, 8);
        // One group of 8 per run keeps the writer single-pass; no indicator
        // byte needs revisiting.
        self.bit_writer.put_vlq_int((1 << 1) | 1);
        for v in self.buffered_values {
            self.bit_writer.put_value(v, self.bit_width as usize)?;
        }
        self.bit_writer.flush_to_byte_boundary();
        self.num_buffered_values = 0;
        self.repeat_count = 0;
        Ok(())
    }
}

/// Encodes `values` at `bit_width` bits in one call.
pub fn encode(values: &[u64], bit_width: u8) -> Result<Vec<u8>> {
    let mut encoder = RleEncoder::new(bit_width, RleEncoder::max_buffer_size(bit_width, values.len()));
    for v in values {
        encoder.put(*v)?;
    }
    encoder.consume()
}

/// Encodes `values` and prefixes the result with its 4-byte little-endian
/// byte length, the framing used to embed level streams in a page.
pub fn pack_with_length(values: &[u64], bit_width: u8) -> Result<Vec<u8>> {
    let encoded = encode(values, bit_width)?;
    let mut out = Vec::with_capacity(4 + encoded.len());
    out.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
    out.extend_from_slice(&encoded);
    Ok(out)
}

/// A RLE/Bit-Packing hybrid decoder.
pub struct RleDecoder {
    /// Bit width the stream was encoded with. Must match the encoder.
    bit_width: u8,

    bit_reader: Option<BitReader>,

    /// Remaining values in the current RLE run.
    rle_left: u64,
    /// Remaining values in the current bit-packed run.
    bit_packed_left: u64,
    /// Repeated value of the current RLE run.
    current_value: u64,
}

impl RleDecoder {
    /// Creates a decoder expecting values of `bit_width` bits.
    pub fn new(bit_width: u8) -> Self {
        Self {
            bit_width,
            bit_reader: None,
            rle_left: 0,
            bit_packed_left: 0,
            current_value: 0,
        }
    }

    /// Sets the encoded input and rewinds run state.
    pub fn set_data(&mut self, data: Bytes) {
        match self.bit_reader.as_mut() {
            Some(reader) => reader.reset(data),
            None => self.bit_reader = Some(BitReader::new(data)),
        }
        self.rle_left = 0;
        self.bit_packed_left = 0;
        self.current_value = 0;
    }

    /// Reads up to `buffer.len()` values, returning how many were produced
    /// before the stream ran out.
    pub fn get_batch(&mut self, buffer: &mut [u64]) -> Result<usize> {
        let mut values_read = 0;
        while values_read < buffer.len() {
            if self.rle_left > 0 {
                let num_values = (buffer.len() - values_read).min(self.rle_left as usize);
                buffer[values_read..values_read + num_values].fill(self.current_value);
                self.rle_left -= num_values as u64;
                values_read += num_values;
            } else if self.bit_packed_left > 0 {
                let to_read = (buffer.len() - values_read).min(self.bit_packed_left as usize);
                let reader = self
                    .bit_reader
                    .as_mut()
                    .expect("bit_reader set by set_data");
                let num_values = reader.get_batch(
                    &mut buffer[values_read..values_read + to_read],
                    self.bit_width as usize,
                );
                if num_values == 0 {
                    // Writers may truncate the zero padding of a final group.
                    self.bit_packed_left = 0;
                    continue;
                }
                self.bit_packed_left -= num_values as u64;
                values_read += num_values;
            } else if !self.reload()? {
                break;
            }
        }
        Ok(values_read)
    }

    /// Decodes exactly `count` values.
    ///
    /// Fails with [`ColumnFileError::TruncatedRleStream`] when the run
    /// headers are exhausted first.
    pub fn decode(&mut self, count: usize) -> Result<Vec<u64>> {
        let mut buffer = vec![0u64; count];
        let read = self.get_batch(&mut buffer)?;
        if read < count {
            return Err(ColumnFileError::TruncatedRleStream {
                expected: count,
                actual: read,
            });
        }
        Ok(buffer)
    }

    /// Reads the next run header; `Ok(false)` at a clean end of stream.
    fn reload(&mut self) -> Result<bool> {
        let reader = self
            .bit_reader
            .as_mut()
            .expect("bit_reader set by set_data");
        let indicator = match reader.get_vlq_int() {
            Some(v) => v,
            None => return Ok(false),
        };
        // Some writers pad pages with zero bytes; a zero indicator is a
        // clean stop rather than an empty run.
        if indicator == 0 {
            return Ok(false);
        }
        if indicator & 1 == 1 {
            self.bit_packed_left = (indicator >> 1) * 8;
        } else {
            self.rle_left = indicator >> 1;
            let value_width = bit_util::ceil(self.bit_width as usize, 8);
            self.current_value = reader
                .get_aligned::<u64>(value_width)
                .ok_or_else(|| eof_err!("not enough data for RLE repeated value"))?;
        }
        Ok(true)
    }
}

/// Decodes a 4-byte length-prefixed hybrid stream of exactly `count` values,
/// returning the values and the total number of bytes consumed (prefix
/// included).
pub fn unpack_with_length(buf: &Bytes, bit_width: u8, count: usize) -> Result<(Vec<u64>, usize)> {
    if buf.len() < 4 {
        return Err(eof_err!("not enough data for level stream length"));
    }
    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if buf.len() < 4 + len {
        return Err(eof_err!(
            "level stream claims {} bytes but only {} remain",
            len,
            buf.len() - 4
        ));
    }
    let mut decoder = RleDecoder::new(bit_width);
    decoder.set_data(buf.slice(4..4 + len));
    let values = decoder.decode(count)?;
    Ok((values, 4 + len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(values: &[u64], bit_width: u8) {
        let encoded = encode(values, bit_width).unwrap();
        let mut decoder = RleDecoder::new(bit_width);
        decoder.set_data(encoded.into());
        let decoded = decoder.decode(values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_decode_known_bit_packed() {
        // 0..8 at bit width 3: one group, header 0x03
        let data = vec![0x03, 0x88, 0xC6, 0xFA];
        let mut decoder = RleDecoder::new(3);
        decoder.set_data(data.into());
        assert_eq!(decoder.decode(8).unwrap(), vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_encode_known_bit_packed() {
        let encoded = encode(&[0, 1, 2, 3, 4, 5, 6, 7], 3).unwrap();
        assert_eq!(encoded, vec![0x03, 0x88, 0xC6, 0xFA]);
    }

    #[test]
    fn test_decode_known_rle() {
        // 50 ones then 50 zeros at bit width 1
        let data = vec![0x64, 0x01, 0x64, 0x00];
        let mut decoder = RleDecoder::new(1);
        decoder.set_data(data.into());
        let decoded = decoder.decode(100).unwrap();
        assert!(decoded[..50].iter().all(|v| *v == 1));
        assert!(decoded[50..].iter().all(|v| *v == 0));
    }

    #[test]
    fn test_encode_pure_rle() {
        let mut values = vec![0u64; 50];
        values.resize(100, 1);
        let encoded = encode(&values, 1).unwrap();
        assert_eq!(encoded, vec![50 << 1, 0, 50 << 1, 1]);
        roundtrip(&values, 1);
    }

    #[test]
    fn test_bit_packing_boundary_length() {
        // The documented boundary case: 10 values at bit width 1 encode to
        // two 8-value groups, 4 bytes total, behind a u32 length prefix.
        let values = [0u64, 1, 1, 1, 1, 1, 1, 1, 1, 1];
        let packed = pack_with_length(&values, 1).unwrap();
        assert_eq!(
            u32::from_le_bytes([packed[0], packed[1], packed[2], packed[3]]),
            4
        );
        assert_eq!(packed.len(), 8);

        let (decoded, consumed) = unpack_with_length(&Bytes::from(packed), 1, 10).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_empty_input_encodes_to_zero_bytes() {
        assert_eq!(encode(&[], 0).unwrap(), Vec::<u8>::new());
        assert_eq!(encode(&[], 5).unwrap(), Vec::<u8>::new());

        let mut decoder = RleDecoder::new(0);
        decoder.set_data(Bytes::new());
        assert_eq!(decoder.decode(0).unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn test_truncated_stream() {
        let mut decoder = RleDecoder::new(3);
        decoder.set_data(vec![0x03, 0x88].into());
        let err = decoder.decode(8).unwrap_err();
        assert!(matches!(
            err,
            ColumnFileError::TruncatedRleStream {
                expected: 8,
                actual: _
            }
        ));

        decoder.set_data(Bytes::new());
        assert!(matches!(
            decoder.decode(1).unwrap_err(),
            ColumnFileError::TruncatedRleStream {
                expected: 1,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_value_out_of_range() {
        let mut encoder = RleEncoder::new(2, 16);
        encoder.put(3).unwrap();
        assert!(matches!(
            encoder.put(4).unwrap_err(),
            ColumnFileError::ValueOutOfRange {
                value: 4,
                bit_width: 2
            }
        ));
    }

    #[test]
    fn test_mixed_runs() {
        // RLE run, then high-entropy tail
        let mut values = vec![7u64; 20];
        values.extend([1, 5, 3, 2, 0, 6, 4, 1, 2]);
        roundtrip(&values, 3);

        // alternating, never RLE
        let alternating: Vec<u64> = (0..101).map(|i| i % 2).collect();
        roundtrip(&alternating, 1);

        // single value
        roundtrip(&[3], 2);
    }

    #[test]
    fn test_all_widths() {
        for bit_width in 1..=32u8 {
            let mask = if bit_width == 32 {
                u32::MAX as u64
            } else {
                (1u64 << bit_width) - 1
            };
            let ramp: Vec<u64> = (0..1000u64).map(|v| v & mask).collect();
            roundtrip(&ramp, bit_width);
            let constant = vec![mask; 1000];
            roundtrip(&constant, bit_width);
        }
    }

    #[test]
    fn test_trailing_padding_ignored() {
        let values: Vec<u64> = vec![0, 1, 1, 3, 1, 0];
        let mut encoded = encode(&values, 2).unwrap();
        encoded.push(0);

        let mut decoder = RleDecoder::new(2);
        decoder.set_data(encoded.into());
        // the final group pads to 8 values; a trailing zero byte is not a run
        let mut buffer = vec![0u64; 12];
        let read = decoder.get_batch(&mut buffer).unwrap();
        assert_eq!(read, 8);
        assert_eq!(&buffer[..6], &values[..]);
        assert_eq!(buffer[6], 0);
        assert_eq!(buffer[7], 0);
    }

    #[test]
    fn test_random_roundtrip() {
        use rand::{rngs::StdRng, Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..25 {
            let bit_width = rng.gen_range(1..=16u8);
            let mask = (1u64 << bit_width) - 1;
            let len = rng.gen_range(1..2000usize);
            let mut values = Vec::with_capacity(len);
            while values.len() < len {
                // biased toward runs to exercise both run kinds
                let run = rng.gen_range(1..20usize).min(len - values.len());
                let v = rng.gen::<u64>() & mask;
                values.extend(std::iter::repeat(v).take(run));
            }
            roundtrip(&values, bit_width);
        }
    }
}
