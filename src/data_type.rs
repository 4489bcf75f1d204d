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

//! Physical leaf values as stored in column chunks.

use std::fmt;

use bytes::Bytes;

use crate::basic::PhysicalType;

/// A single physical scalar belonging to a leaf column.
///
/// Logical types have already been normalized away at this layer: dates are
/// `Int32` epoch days, times and timestamps are `Int64` microseconds,
/// decimals are `Int64` unscaled values and strings are UTF-8 `ByteArray`s.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// A 32-bit signed integer.
    Int32(i32),
    /// A 64-bit signed integer.
    Int64(i64),
    /// A 32-bit float.
    Float(f32),
    /// A 64-bit float.
    Double(f64),
    /// A variable-length byte array.
    ByteArray(Bytes),
}

impl Value {
    /// The physical type of this value.
    pub fn physical_type(&self) -> PhysicalType {
        match self {
            Value::Bool(_) => PhysicalType::BOOLEAN,
            Value::Int32(_) => PhysicalType::INT32,
            Value::Int64(_) => PhysicalType::INT64,
            Value::Float(_) => PhysicalType::FLOAT,
            Value::Double(_) => PhysicalType::DOUBLE,
            Value::ByteArray(_) => PhysicalType::BYTE_ARRAY,
        }
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "BOOLEAN",
            Value::Int32(_) => "INT32",
            Value::Int64(_) => "INT64",
            Value::Float(_) => "FLOAT",
            Value::Double(_) => "DOUBLE",
            Value::ByteArray(_) => "BYTE_ARRAY",
        }
    }

    /// Appends a canonical byte representation of this value, used for
    /// dictionary hashing and distinct counting. Floats are keyed by their
    /// bit pattern so `NaN` payloads stay distinguishable.
    pub(crate) fn write_key(&self, out: &mut Vec<u8>) {
        match self {
            Value::Bool(v) => out.push(u8::from(*v)),
            Value::Int32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Int64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Float(v) => out.extend_from_slice(&v.to_bits().to_le_bytes()),
            Value::Double(v) => out.extend_from_slice(&v.to_bits().to_le_bytes()),
            Value::ByteArray(v) => out.extend_from_slice(v),
        }
    }

    /// Equality used for dictionary dedup; floats compare by bit pattern.
    pub(crate) fn dict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }

    /// In-memory footprint of the encoded form, used for page sizing.
    pub(crate) fn encoded_size(&self) -> usize {
        match self {
            Value::Bool(_) => 1,
            Value::Int32(_) | Value::Float(_) => 4,
            Value::Int64(_) | Value::Double(_) => 8,
            Value::ByteArray(v) => 4 + v.len(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::ByteArray(v) => match std::str::from_utf8(v) {
                Ok(s) => write!(f, "{s:?}"),
                Err(_) => write!(f, "{v:?}"),
            },
        }
    }
}
