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

//! PLAIN encoding.
//!
//! Booleans are bit-packed LSB-first with the final byte zero-padded,
//! numerics are fixed-width little-endian, and byte arrays carry a 4-byte
//! little-endian length prefix. Null slots never reach this layer; presence
//! is encoded entirely in the definition levels.

use crate::basic::PhysicalType;
use crate::data_type::Value;
use crate::errors::Result;
use crate::util::bit_util::{BitReader, BitWriter};

/// PLAIN-encodes `values` into `writer`. All values must share the writer's
/// column physical type; the caller guarantees this.
pub fn encode(values: &[Value], writer: &mut BitWriter) -> Result<()> {
    for value in values {
        match value {
            Value::Bool(v) => writer.put_value(u64::from(*v), 1)?,
            Value::Int32(v) => writer.put_aligned(*v as u32 as u64, 4),
            Value::Int64(v) => writer.put_aligned(*v as u64, 8),
            Value::Float(v) => writer.put_aligned(u64::from(v.to_bits()), 4),
            Value::Double(v) => writer.put_aligned(v.to_bits(), 8),
            Value::ByteArray(v) => writer.put_length_prefixed(v),
        }
    }
    writer.flush_to_byte_boundary();
    Ok(())
}

/// PLAIN-encodes `values` into a fresh buffer.
pub fn encode_to_vec(values: &[Value]) -> Result<Vec<u8>> {
    let mut writer = BitWriter::new(64);
    encode(values, &mut writer)?;
    Ok(writer.consume())
}

/// Decodes `num_values` PLAIN values of `physical` type from `reader`.
pub fn decode(
    reader: &mut BitReader,
    physical: PhysicalType,
    num_values: usize,
) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(num_values);
    match physical {
        PhysicalType::BOOLEAN => {
            for _ in 0..num_values {
                let bit = reader
                    .get_value(1)
                    .ok_or_else(|| eof_err!("not enough data for BOOLEAN values"))?;
                values.push(Value::Bool(bit != 0));
            }
        }
        PhysicalType::INT32 => {
            for _ in 0..num_values {
                let v = reader
                    .get_aligned::<i32>(4)
                    .ok_or_else(|| eof_err!("not enough data for INT32 values"))?;
                values.push(Value::Int32(v));
            }
        }
        PhysicalType::INT64 => {
            for _ in 0..num_values {
                let v = reader
                    .get_aligned::<i64>(8)
                    .ok_or_else(|| eof_err!("not enough data for INT64 values"))?;
                values.push(Value::Int64(v));
            }
        }
        PhysicalType::FLOAT => {
            for _ in 0..num_values {
                let v = reader
                    .get_aligned::<u32>(4)
                    .ok_or_else(|| eof_err!("not enough data for FLOAT values"))?;
                values.push(Value::Float(f32::from_bits(v)));
            }
        }
        PhysicalType::DOUBLE => {
            for _ in 0..num_values {
                let v = reader
                    .get_aligned::<u64>(8)
                    .ok_or_else(|| eof_err!("not enough data for DOUBLE values"))?;
                values.push(Value::Double(f64::from_bits(v)));
            }
        }
        PhysicalType::BYTE_ARRAY => {
            for _ in 0..num_values {
                values.push(Value::ByteArray(reader.get_length_prefixed()?));
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn roundtrip(values: Vec<Value>, physical: PhysicalType) {
        let encoded = encode_to_vec(&values).unwrap();
        let mut reader = BitReader::new(encoded.into());
        let decoded = decode(&mut reader, physical, values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_bool_bit_packing() {
        let values: Vec<Value> = [true, false, true, true, false, false, true, true, true]
            .into_iter()
            .map(Value::Bool)
            .collect();
        let encoded = encode_to_vec(&values).unwrap();
        // 9 booleans occupy two bytes, final byte zero-padded
        assert_eq!(encoded, vec![0b1100_1101, 0b0000_0001]);
        roundtrip(values, PhysicalType::BOOLEAN);
    }

    #[test]
    fn test_numeric_little_endian() {
        let encoded = encode_to_vec(&[Value::Int32(-2)]).unwrap();
        assert_eq!(encoded, vec![0xFE, 0xFF, 0xFF, 0xFF]);
        let encoded = encode_to_vec(&[Value::Int64(1)]).unwrap();
        assert_eq!(encoded, vec![1, 0, 0, 0, 0, 0, 0, 0]);

        roundtrip(
            vec![Value::Int32(i32::MIN), Value::Int32(0), Value::Int32(i32::MAX)],
            PhysicalType::INT32,
        );
        roundtrip(
            vec![Value::Int64(i64::MIN), Value::Int64(i64::MAX)],
            PhysicalType::INT64,
        );
        roundtrip(
            vec![Value::Float(1.5), Value::Float(-0.0)],
            PhysicalType::FLOAT,
        );
        roundtrip(
            vec![Value::Double(f64::MIN_POSITIVE), Value::Double(-1e300)],
            PhysicalType::DOUBLE,
        );
    }

    #[test]
    fn test_byte_array_length_prefix() {
        let values = vec![
            Value::ByteArray(Bytes::from_static(b"ab")),
            Value::ByteArray(Bytes::new()),
            Value::ByteArray(Bytes::from_static(b"xyz")),
        ];
        let encoded = encode_to_vec(&values).unwrap();
        assert_eq!(
            encoded,
            vec![2, 0, 0, 0, b'a', b'b', 0, 0, 0, 0, 3, 0, 0, 0, b'x', b'y', b'z']
        );
        roundtrip(values, PhysicalType::BYTE_ARRAY);
    }

    #[test]
    fn test_decode_past_end() {
        let encoded = encode_to_vec(&[Value::Int32(1)]).unwrap();
        let mut reader = BitReader::new(encoded.into());
        assert!(decode(&mut reader, PhysicalType::INT32, 2).is_err());
    }
}
