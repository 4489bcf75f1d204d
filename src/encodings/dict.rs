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

//! Dictionary encoding.
//!
//! A column chunk carries at most one dictionary page, always first in the
//! chunk, holding the distinct values PLAIN-encoded in index order. Data
//! pages encoded as `RLE_DICTIONARY` store a one-byte index bit width
//! followed by a RLE/bit-packed hybrid stream of dictionary indices.

use bytes::Bytes;

use crate::basic::PhysicalType;
use crate::data_type::Value;
use crate::encodings::{plain, rle::RleDecoder};
use crate::errors::Result;
use crate::util::bit_util::{self, BitReader};
use crate::util::interner::ValueInterner;

/// Builds the dictionary for one column chunk.
///
/// The dictionary only grows; once a value is assigned an index that index
/// is stable for the lifetime of the chunk, so previously flushed pages
/// remain valid when later pages add entries.
#[derive(Debug, Default)]
pub struct DictEncoder {
    interner: ValueInterner,
}

impl DictEncoder {
    pub fn new() -> Self {
        Self {
            interner: ValueInterner::new(),
        }
    }

    /// Interns `value` and returns its dictionary index.
    pub fn put(&mut self, value: &Value) -> u64 {
        self.interner.intern(value) as u64
    }

    /// Number of distinct entries.
    pub fn num_entries(&self) -> usize {
        self.interner.num_entries()
    }

    /// PLAIN-encoded size of the dictionary page payload.
    pub fn dict_encoded_size(&self) -> usize {
        self.interner.encoded_size()
    }

    /// The distinct values in index order.
    pub fn values(&self) -> &[Value] {
        self.interner.values()
    }

    /// Bits needed to address the current dictionary.
    pub fn bit_width(&self) -> u8 {
        let num_entries = self.num_entries();
        if num_entries <= 1 {
            num_entries as u8
        } else {
            bit_util::num_required_bits(num_entries as u64 - 1)
        }
    }

    /// Serializes the dictionary page payload.
    pub fn write_dict(&self) -> Result<Vec<u8>> {
        plain::encode_to_vec(self.interner.values())
    }
}

/// Serializes a `RLE_DICTIONARY` data page values section: the index bit
/// width as one byte, then the hybrid-encoded indices.
pub fn write_indices(indices: &[u64], bit_width: u8) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(
        1 + crate::encodings::rle::RleEncoder::max_buffer_size(bit_width, indices.len()),
    );
    out.push(bit_width);
    out.extend_from_slice(&crate::encodings::rle::encode(indices, bit_width)?);
    Ok(out)
}

/// Decodes a dictionary page payload into the values it defines.
pub fn decode_dictionary(
    data: Bytes,
    physical: PhysicalType,
    num_values: usize,
) -> Result<Vec<Value>> {
    let mut reader = BitReader::new(data);
    plain::decode(&mut reader, physical, num_values)
}

/// Decodes a `RLE_DICTIONARY` values section against `dictionary`.
pub fn decode_index_page(
    data: Bytes,
    dictionary: &[Value],
    num_values: usize,
) -> Result<Vec<Value>> {
    if num_values == 0 {
        return Ok(Vec::new());
    }
    if data.is_empty() {
        return Err(eof_err!("dictionary-encoded page is missing its bit width"));
    }
    let bit_width = data[0];
    if usize::from(bit_width) > bit_util::MAX_BIT_WIDTH {
        return Err(general_err!(
            "dictionary index bit width {} exceeds the maximum of {}",
            bit_width,
            bit_util::MAX_BIT_WIDTH
        ));
    }

    let mut decoder = RleDecoder::new(bit_width);
    decoder.set_data(data.slice(1..));
    let indices = decoder.decode(num_values)?;

    let mut values = Vec::with_capacity(num_values);
    for index in indices {
        let value = dictionary.get(index as usize).ok_or_else(|| {
            general_err!(
                "dictionary index {} out of bounds for dictionary of {} entries",
                index,
                dictionary.len()
            )
        })?;
        values.push(value.clone());
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_width_growth() {
        let mut encoder = DictEncoder::new();
        assert_eq!(encoder.bit_width(), 0);
        encoder.put(&Value::Int32(10));
        assert_eq!(encoder.bit_width(), 1);
        encoder.put(&Value::Int32(20));
        assert_eq!(encoder.bit_width(), 1);
        encoder.put(&Value::Int32(30));
        assert_eq!(encoder.bit_width(), 2);
        for i in 0..5 {
            encoder.put(&Value::Int32(100 + i));
        }
        assert_eq!(encoder.num_entries(), 8);
        assert_eq!(encoder.bit_width(), 3);
    }

    #[test]
    fn test_indices_stable_across_pages() {
        let mut encoder = DictEncoder::new();
        let a = encoder.put(&Value::Int64(5));
        let b = encoder.put(&Value::Int64(6));
        // a later page adds entries; earlier indices must not move
        let c = encoder.put(&Value::Int64(7));
        assert_eq!(encoder.put(&Value::Int64(5)), a);
        assert_eq!(encoder.put(&Value::Int64(6)), b);
        assert_eq!(encoder.put(&Value::Int64(7)), c);
        assert_eq!((a, b, c), (0, 1, 2));
    }

    #[test]
    fn test_page_roundtrip() {
        let mut encoder = DictEncoder::new();
        let raw = [3i32, 1, 3, 3, 2, 1, 3];
        let indices: Vec<u64> = raw.iter().map(|v| encoder.put(&Value::Int32(*v))).collect();

        let dict_page = encoder.write_dict().unwrap();
        let dictionary =
            decode_dictionary(dict_page.into(), PhysicalType::INT32, encoder.num_entries())
                .unwrap();
        assert_eq!(
            dictionary,
            vec![Value::Int32(3), Value::Int32(1), Value::Int32(2)]
        );

        let page = write_indices(&indices, encoder.bit_width()).unwrap();
        let decoded = decode_index_page(page.into(), &dictionary, raw.len()).unwrap();
        let expected: Vec<Value> = raw.iter().map(|v| Value::Int32(*v)).collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_single_entry_dictionary() {
        let mut encoder = DictEncoder::new();
        let indices: Vec<u64> = (0..10).map(|_| encoder.put(&Value::Bool(true))).collect();
        assert_eq!(encoder.bit_width(), 1);

        let dictionary = decode_dictionary(
            encoder.write_dict().unwrap().into(),
            PhysicalType::BOOLEAN,
            1,
        )
        .unwrap();
        let page = write_indices(&indices, encoder.bit_width()).unwrap();
        let decoded = decode_index_page(page.into(), &dictionary, 10).unwrap();
        assert!(decoded.iter().all(|v| *v == Value::Bool(true)));
    }

    #[test]
    fn test_out_of_bounds_index_rejected() {
        let page = write_indices(&[0, 1, 5], 3).unwrap();
        let dictionary = vec![Value::Int32(1), Value::Int32(2)];
        assert!(decode_index_page(page.into(), &dictionary, 3).is_err());
    }
}
