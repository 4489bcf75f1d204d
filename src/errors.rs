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

//! Common error types and macros.

use crate::basic::Compression;

/// Errors surfaced while encoding or decoding columnar files.
///
/// Format errors (`CorruptedFooter`, `UnsupportedVersion`, `Eof`,
/// `TruncatedRleStream`) are unrecoverable for the file at hand. Policy and
/// type errors (`ValueOutOfRange`, `IncomparableTypes`, `SchemaMismatch`)
/// indicate a bug in the caller or in this crate and are never silently
/// coerced. Resource errors (`CodecUnavailable`, `Io`) propagate from the
/// environment; no retry is attempted here.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ColumnFileError {
    /// A general error, the message describes the offending component
    #[error("Columnfile error: {0}")]
    General(String),
    /// Ran out of bytes while decoding
    #[error("EOF: {0}")]
    Eof(String),
    /// A value cannot be represented with the chosen bit width
    #[error("Value {value} does not fit in {bit_width} bits")]
    ValueOutOfRange {
        /// Value that was rejected
        value: u64,
        /// Bit width it was packed with
        bit_width: u8,
    },
    /// An RLE/bit-packed stream ended before producing the requested values
    #[error("Truncated RLE stream: expected {expected} values, decoded {actual}")]
    TruncatedRleStream {
        /// Number of values the caller asked for
        expected: usize,
        /// Number of values actually decoded
        actual: usize,
    },
    /// Trailing magic marker missing or footer bytes unparseable
    #[error("Corrupted footer: {0}")]
    CorruptedFooter(String),
    /// The file was written by a newer format version
    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u32),
    /// The compression codec was not compiled into this build
    #[error("Codec {0} is not enabled in this build")]
    CodecUnavailable(Compression),
    /// Statistics comparison across different underlying types
    #[error("Cannot compare {left} with {right}")]
    IncomparableTypes {
        /// Type of the left operand
        left: &'static str,
        /// Type of the right operand
        right: &'static str,
    },
    /// A row value does not match the schema during shredding
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    /// Write operation on a finalized writer
    #[error("Writer is closed")]
    WriterClosed,
    /// Projection change requested after streaming started
    #[error("Projection is locked once streaming has started")]
    ProjectionLocked,
    /// Failure from the underlying byte stream
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` for columnfile errors.
pub type Result<T, E = ColumnFileError> = std::result::Result<T, E>;

macro_rules! general_err {
    ($fmt:expr) => ($crate::errors::ColumnFileError::General($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => ($crate::errors::ColumnFileError::General(format!($fmt, $($args),*)));
}

macro_rules! eof_err {
    ($fmt:expr) => ($crate::errors::ColumnFileError::Eof($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => ($crate::errors::ColumnFileError::Eof(format!($fmt, $($args),*)));
}
