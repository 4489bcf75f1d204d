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

//! Contains Rust mappings for the enumerations the file format defines:
//! physical and logical types, encodings, compressions and repetitions,
//! together with their single-byte wire representations.

#![allow(non_camel_case_types)]

use std::fmt;

use crate::errors::{ColumnFileError, Result};

// ----------------------------------------------------------------------
// Mirrors of on-disk enums

/// The physical storage type of a leaf column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    /// A boolean value, bit-packed in PLAIN encoding.
    BOOLEAN,
    /// A 32-bit signed integer.
    INT32,
    /// A 64-bit signed integer.
    INT64,
    /// A 32-bit floating point value.
    FLOAT,
    /// A 64-bit floating point value.
    DOUBLE,
    /// An arbitrary length byte array, length-prefixed in PLAIN encoding.
    BYTE_ARRAY,
}

impl PhysicalType {
    /// Wire tag of this physical type.
    pub fn as_u8(&self) -> u8 {
        match self {
            PhysicalType::BOOLEAN => 0,
            PhysicalType::INT32 => 1,
            PhysicalType::INT64 => 2,
            PhysicalType::FLOAT => 3,
            PhysicalType::DOUBLE => 4,
            PhysicalType::BYTE_ARRAY => 5,
        }
    }
}

impl TryFrom<u8> for PhysicalType {
    type Error = ColumnFileError;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => PhysicalType::BOOLEAN,
            1 => PhysicalType::INT32,
            2 => PhysicalType::INT64,
            3 => PhysicalType::FLOAT,
            4 => PhysicalType::DOUBLE,
            5 => PhysicalType::BYTE_ARRAY,
            other => return Err(general_err!("unexpected physical type {}", other)),
        })
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The logical interpretation layered on top of a [`PhysicalType`].
///
/// Temporal types are normalized to epoch-based integers before they reach
/// the physical layer, so min/max statistics order correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    /// No logical annotation; values are the bare physical type.
    None,
    /// UTF-8 string stored as `BYTE_ARRAY`.
    String,
    /// Days since the Unix epoch stored as `INT32`.
    Date,
    /// Microseconds since midnight stored as `INT64`.
    TimeMicros,
    /// Microseconds since the Unix epoch stored as `INT64`.
    TimestampMicros,
    /// Fixed-point decimal, unscaled value stored as `INT64`.
    Decimal {
        /// Total number of digits (at most 18).
        precision: u8,
        /// Digits to the right of the decimal point.
        scale: u8,
    },
}

impl LogicalType {
    /// Wire tag of this logical type (parameters are serialized separately).
    pub fn as_u8(&self) -> u8 {
        match self {
            LogicalType::None => 0,
            LogicalType::String => 1,
            LogicalType::Date => 2,
            LogicalType::TimeMicros => 3,
            LogicalType::TimestampMicros => 4,
            LogicalType::Decimal { .. } => 5,
        }
    }

    /// The physical type this logical type is stored as, `None` when the
    /// annotation places no constraint.
    pub fn physical_type(&self) -> Option<PhysicalType> {
        match self {
            LogicalType::None => None,
            LogicalType::String => Some(PhysicalType::BYTE_ARRAY),
            LogicalType::Date => Some(PhysicalType::INT32),
            LogicalType::TimeMicros
            | LogicalType::TimestampMicros
            | LogicalType::Decimal { .. } => Some(PhysicalType::INT64),
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LogicalType::Decimal { precision, scale } => {
                write!(f, "DECIMAL({precision},{scale})")
            }
            LogicalType::None => write!(f, "NONE"),
            LogicalType::String => write!(f, "STRING"),
            LogicalType::Date => write!(f, "DATE"),
            LogicalType::TimeMicros => write!(f, "TIME_MICROS"),
            LogicalType::TimestampMicros => write!(f, "TIMESTAMP_MICROS"),
        }
    }
}

/// Representation of field repetition in the schema.
///
/// Lists and maps carry an additional implicit repeated level; elements
/// themselves are again `REQUIRED` or `OPTIONAL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
    /// Field is required (can not be null) and each row has exactly 1 value.
    REQUIRED,
    /// Field is optional (can be null) and each row has 0 or 1 values.
    OPTIONAL,
}

impl Repetition {
    /// Wire tag of this repetition.
    pub fn as_u8(&self) -> u8 {
        match self {
            Repetition::REQUIRED => 0,
            Repetition::OPTIONAL => 1,
        }
    }
}

impl TryFrom<u8> for Repetition {
    type Error = ColumnFileError;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Repetition::REQUIRED,
            1 => Repetition::OPTIONAL,
            other => return Err(general_err!("unexpected repetition {}", other)),
        })
    }
}

impl fmt::Display for Repetition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Encodings supported for data and dictionary pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Encoding {
    /// Default encoding: values serialized back to back in their natural
    /// binary form, byte arrays length-prefixed, booleans bit-packed.
    PLAIN,
    /// Run-length / bit-packed hybrid, used for repetition and definition
    /// levels and for dictionary indices.
    RLE,
    /// Data pages hold RLE encoded indices into a PLAIN dictionary page.
    RLE_DICTIONARY,
}

impl Encoding {
    /// Wire tag of this encoding.
    pub fn as_u8(&self) -> u8 {
        match self {
            Encoding::PLAIN => 0,
            Encoding::RLE => 1,
            Encoding::RLE_DICTIONARY => 2,
        }
    }
}

impl TryFrom<u8> for Encoding {
    type Error = ColumnFileError;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Encoding::PLAIN,
            1 => Encoding::RLE,
            2 => Encoding::RLE_DICTIONARY,
            other => return Err(general_err!("unexpected encoding {}", other)),
        })
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Supported block compression algorithms, applied to the fully encoded
/// page payload as a final step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// No compression.
    UNCOMPRESSED,
    /// [Snappy](https://google.github.io/snappy/) compression.
    SNAPPY,
    /// [Gzip](https://www.ietf.org/rfc/rfc1952.txt) compression.
    GZIP,
    /// [Zstandard](https://facebook.github.io/zstd/) compression.
    ZSTD,
}

impl Compression {
    /// Wire tag of this compression codec.
    pub fn as_u8(&self) -> u8 {
        match self {
            Compression::UNCOMPRESSED => 0,
            Compression::SNAPPY => 1,
            Compression::GZIP => 2,
            Compression::ZSTD => 3,
        }
    }
}

impl TryFrom<u8> for Compression {
    type Error = ColumnFileError;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Compression::UNCOMPRESSED,
            1 => Compression::SNAPPY,
            2 => Compression::GZIP,
            3 => Compression::ZSTD,
            other => return Err(general_err!("unexpected compression codec {}", other)),
        })
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Types of pages stored within a column chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    /// A page of encoded values plus their repetition and definition levels.
    DATA_PAGE,
    /// A PLAIN encoded dictionary, stored before the data pages of a chunk.
    DICTIONARY_PAGE,
}

impl PageType {
    /// Wire tag of this page type.
    pub fn as_u8(&self) -> u8 {
        match self {
            PageType::DATA_PAGE => 0,
            PageType::DICTIONARY_PAGE => 1,
        }
    }
}

impl TryFrom<u8> for PageType {
    type Error = ColumnFileError;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => PageType::DATA_PAGE,
            1 => PageType::DICTIONARY_PAGE,
            other => return Err(general_err!("unexpected page type {}", other)),
        })
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
