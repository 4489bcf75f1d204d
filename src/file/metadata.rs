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

//! Footer metadata: the self-describing schema, row group and column chunk
//! descriptions, and their wire codec.
//!
//! The footer body is written with the same primitives as page data:
//! uleb128 varints for counts and offsets, 4-byte length-prefixed UTF-8
//! strings, one-byte enum tags, and PLAIN-encoded min/max values. Optional
//! items carry a one-byte presence flag.

use std::sync::Arc;

use bytes::Bytes;

use crate::basic::{Compression, Encoding, LogicalType, PhysicalType, Repetition};
use crate::encodings::plain;
use crate::errors::{ColumnFileError, Result};
use crate::file::statistics::ColumnStatistics;
use crate::file::FORMAT_VERSION;
use crate::schema::types::{Column, ColumnKind, SchemaDescPtr, SchemaDescriptor};
use crate::util::bit_util::{BitReader, BitWriter};

/// An application key/value metadata entry stored in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<String>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

/// Everything the footer records about one column chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChunkMetaData {
    pub(crate) path: String,
    pub(crate) physical: PhysicalType,
    pub(crate) compression: Compression,
    pub(crate) encodings: Vec<Encoding>,
    /// Absolute offset of the chunk's first page header.
    pub(crate) file_offset: u64,
    /// Absolute offset of the dictionary page, when the chunk has one. The
    /// dictionary page is always the chunk's first page.
    pub(crate) dictionary_page_offset: Option<u64>,
    pub(crate) total_compressed_size: u64,
    pub(crate) total_uncompressed_size: u64,
    /// Level slots in the chunk, nulls included.
    pub(crate) num_values: u64,
    pub(crate) num_pages: u64,
    pub(crate) statistics: ColumnStatistics,
}

impl ColumnChunkMetaData {
    /// Dotted leaf path, e.g. `user.tags.element`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.physical
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Encodings used by this chunk's pages, deduplicated.
    pub fn encodings(&self) -> &[Encoding] {
        &self.encodings
    }

    /// Absolute offset of the chunk's first page header.
    pub fn file_offset(&self) -> u64 {
        self.file_offset
    }

    pub fn dictionary_page_offset(&self) -> Option<u64> {
        self.dictionary_page_offset
    }

    /// On-disk byte size of the chunk, page headers included.
    pub fn compressed_size(&self) -> u64 {
        self.total_compressed_size
    }

    /// Byte size of the chunk with all payloads decompressed.
    pub fn uncompressed_size(&self) -> u64 {
        self.total_uncompressed_size
    }

    /// Number of level slots in the chunk, nulls included.
    pub fn num_values(&self) -> u64 {
        self.num_values
    }

    pub fn num_pages(&self) -> u64 {
        self.num_pages
    }

    pub fn statistics(&self) -> &ColumnStatistics {
        &self.statistics
    }
}

/// Footer description of one row group.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroupMetaData {
    pub(crate) num_rows: u64,
    pub(crate) columns: Vec<ColumnChunkMetaData>,
}

impl RowGroupMetaData {
    pub fn num_rows(&self) -> u64 {
        self.num_rows
    }

    /// Column chunks in schema leaf order.
    pub fn columns(&self) -> &[ColumnChunkMetaData] {
        &self.columns
    }

    pub fn column(&self, i: usize) -> &ColumnChunkMetaData {
        &self.columns[i]
    }

    /// Total on-disk size of the row group.
    pub fn total_byte_size(&self) -> u64 {
        self.columns.iter().map(|c| c.total_compressed_size).sum()
    }
}

/// The decoded footer.
#[derive(Debug, Clone)]
pub struct FileMetaData {
    pub(crate) version: u32,
    pub(crate) created_by: Option<String>,
    pub(crate) key_value_metadata: Option<Vec<KeyValue>>,
    pub(crate) schema: SchemaDescPtr,
    pub(crate) num_rows: u64,
    pub(crate) row_groups: Vec<RowGroupMetaData>,
}

impl FileMetaData {
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn key_value_metadata(&self) -> Option<&Vec<KeyValue>> {
        self.key_value_metadata.as_ref()
    }

    pub fn schema(&self) -> &SchemaDescPtr {
        &self.schema
    }

    /// Total row count across all row groups.
    pub fn num_rows(&self) -> u64 {
        self.num_rows
    }

    pub fn row_groups(&self) -> &[RowGroupMetaData] {
        &self.row_groups
    }
}

// ----------------------------------------------------------------------
// Encoding

/// Serializes the footer body. The caller appends the length and magic
/// trailer.
pub fn encode_footer(meta: &FileMetaData) -> Result<Vec<u8>> {
    let mut w = BitWriter::new(1024);
    w.put_vlq_int(u64::from(meta.version));
    encode_opt_string(&mut w, meta.created_by.as_deref());

    let fields = meta.schema.fields();
    w.put_vlq_int(fields.len() as u64);
    for field in fields {
        encode_column(&mut w, field);
    }

    w.put_vlq_int(meta.num_rows);
    w.put_vlq_int(meta.row_groups.len() as u64);
    for rg in &meta.row_groups {
        w.put_vlq_int(rg.num_rows);
        w.put_vlq_int(rg.columns.len() as u64);
        for chunk in &rg.columns {
            encode_chunk(&mut w, chunk)?;
        }
    }

    match &meta.key_value_metadata {
        Some(entries) => {
            w.put_aligned(1, 1);
            w.put_vlq_int(entries.len() as u64);
            for kv in entries {
                encode_string(&mut w, &kv.key);
                encode_opt_string(&mut w, kv.value.as_deref());
            }
        }
        None => w.put_aligned(0, 1),
    }

    Ok(w.consume())
}

fn encode_string(w: &mut BitWriter, s: &str) {
    w.put_length_prefixed(s.as_bytes());
}

fn encode_opt_string(w: &mut BitWriter, s: Option<&str>) {
    match s {
        Some(s) => {
            w.put_aligned(1, 1);
            encode_string(w, s);
        }
        None => w.put_aligned(0, 1),
    }
}

fn encode_column(w: &mut BitWriter, column: &Column) {
    encode_string(w, column.name());
    w.put_aligned(u64::from(column.repetition().as_u8()), 1);
    match column.kind() {
        ColumnKind::Primitive { physical, logical } => {
            w.put_aligned(0, 1);
            w.put_aligned(u64::from(physical.as_u8()), 1);
            w.put_aligned(u64::from(logical.as_u8()), 1);
            if let LogicalType::Decimal { precision, scale } = logical {
                w.put_aligned(u64::from(*precision), 1);
                w.put_aligned(u64::from(*scale), 1);
            }
        }
        ColumnKind::Struct(children) => {
            w.put_aligned(1, 1);
            w.put_vlq_int(children.len() as u64);
            for child in children {
                encode_column(w, child);
            }
        }
        ColumnKind::List(element) => {
            w.put_aligned(2, 1);
            encode_column(w, element);
        }
        ColumnKind::Map(key, value) => {
            w.put_aligned(3, 1);
            encode_column(w, key);
            encode_column(w, value);
        }
    }
}

fn encode_chunk(w: &mut BitWriter, chunk: &ColumnChunkMetaData) -> Result<()> {
    encode_string(w, &chunk.path);
    w.put_aligned(u64::from(chunk.physical.as_u8()), 1);
    w.put_aligned(u64::from(chunk.compression.as_u8()), 1);
    w.put_vlq_int(chunk.encodings.len() as u64);
    for e in &chunk.encodings {
        w.put_aligned(u64::from(e.as_u8()), 1);
    }
    w.put_vlq_int(chunk.file_offset);
    match chunk.dictionary_page_offset {
        Some(offset) => {
            w.put_aligned(1, 1);
            w.put_vlq_int(offset);
        }
        None => w.put_aligned(0, 1),
    }
    w.put_vlq_int(chunk.total_compressed_size);
    w.put_vlq_int(chunk.total_uncompressed_size);
    w.put_vlq_int(chunk.num_values);
    w.put_vlq_int(chunk.num_pages);

    let stats = &chunk.statistics;
    w.put_vlq_int(stats.null_count);
    for bound in [&stats.min, &stats.max] {
        match bound {
            Some(v) => {
                w.put_aligned(1, 1);
                plain::encode(std::slice::from_ref(v), w)?;
            }
            None => w.put_aligned(0, 1),
        }
    }
    match stats.distinct_count {
        Some(n) => {
            w.put_aligned(1, 1);
            w.put_vlq_int(n);
        }
        None => w.put_aligned(0, 1),
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Decoding

/// Parses a footer body produced by [`encode_footer`].
///
/// Fails with [`ColumnFileError::UnsupportedVersion`] when the footer was
/// written by a newer format version.
pub fn decode_footer(buf: Bytes) -> Result<FileMetaData> {
    let mut r = BitReader::new(buf);

    let version = read_vlq(&mut r, "format version")? as u32;
    if version > FORMAT_VERSION {
        return Err(ColumnFileError::UnsupportedVersion(version));
    }
    let created_by = decode_opt_string(&mut r)?;

    let num_fields = read_vlq(&mut r, "schema field count")?;
    let mut fields = Vec::with_capacity(num_fields as usize);
    for _ in 0..num_fields {
        fields.push(decode_column(&mut r)?);
    }
    let schema = Arc::new(SchemaDescriptor::new(fields)?);

    let num_rows = read_vlq(&mut r, "row count")?;
    let num_row_groups = read_vlq(&mut r, "row group count")?;
    let mut row_groups = Vec::with_capacity(num_row_groups as usize);
    for _ in 0..num_row_groups {
        let rg_rows = read_vlq(&mut r, "row group row count")?;
        let num_columns = read_vlq(&mut r, "column chunk count")?;
        if num_columns as usize != schema.num_leaves() {
            return Err(ColumnFileError::CorruptedFooter(format!(
                "row group describes {} column chunks, schema has {} leaves",
                num_columns,
                schema.num_leaves()
            )));
        }
        let mut columns = Vec::with_capacity(num_columns as usize);
        for _ in 0..num_columns {
            columns.push(decode_chunk(&mut r)?);
        }
        row_groups.push(RowGroupMetaData {
            num_rows: rg_rows,
            columns,
        });
    }

    let key_value_metadata = if read_flag(&mut r)? {
        let n = read_vlq(&mut r, "key/value entry count")?;
        let mut entries = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let key = decode_string(&mut r)?;
            let value = decode_opt_string(&mut r)?;
            entries.push(KeyValue { key, value });
        }
        Some(entries)
    } else {
        None
    };

    Ok(FileMetaData {
        version,
        created_by,
        key_value_metadata,
        schema,
        num_rows,
        row_groups,
    })
}

fn read_vlq(r: &mut BitReader, what: &str) -> Result<u64> {
    r.get_vlq_int()
        .ok_or_else(|| ColumnFileError::CorruptedFooter(format!("footer ended within {what}")))
}

fn read_u8(r: &mut BitReader, what: &str) -> Result<u8> {
    r.get_aligned::<u8>(1)
        .ok_or_else(|| ColumnFileError::CorruptedFooter(format!("footer ended within {what}")))
}

fn read_flag(r: &mut BitReader) -> Result<bool> {
    Ok(read_u8(r, "presence flag")? != 0)
}

fn decode_string(r: &mut BitReader) -> Result<String> {
    let bytes = r.get_length_prefixed()?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| ColumnFileError::CorruptedFooter("string is not valid UTF-8".to_string()))
}

fn decode_opt_string(r: &mut BitReader) -> Result<Option<String>> {
    if read_flag(r)? {
        Ok(Some(decode_string(r)?))
    } else {
        Ok(None)
    }
}

fn decode_column(r: &mut BitReader) -> Result<Column> {
    let name = decode_string(r)?;
    let repetition = Repetition::try_from(read_u8(r, "column repetition")?)?;
    let kind = read_u8(r, "column kind")?;
    match kind {
        0 => {
            let physical = PhysicalType::try_from(read_u8(r, "physical type")?)?;
            let logical = match read_u8(r, "logical type")? {
                0 => LogicalType::None,
                1 => LogicalType::String,
                2 => LogicalType::Date,
                3 => LogicalType::TimeMicros,
                4 => LogicalType::TimestampMicros,
                5 => LogicalType::Decimal {
                    precision: read_u8(r, "decimal precision")?,
                    scale: read_u8(r, "decimal scale")?,
                },
                other => {
                    return Err(ColumnFileError::CorruptedFooter(format!(
                        "unknown logical type tag {other}"
                    )))
                }
            };
            Column::primitive(name, repetition, physical, logical)
        }
        1 => {
            let n = read_vlq(r, "struct child count")?;
            let mut children = Vec::with_capacity(n as usize);
            for _ in 0..n {
                children.push(decode_column(r)?);
            }
            Ok(Column::group(name, repetition, children))
        }
        2 => Ok(Column::list(name, repetition, decode_column(r)?)),
        3 => {
            let key = decode_column(r)?;
            let value = decode_column(r)?;
            Column::map(name, repetition, key, value)
        }
        other => Err(ColumnFileError::CorruptedFooter(format!(
            "unknown column kind tag {other}"
        ))),
    }
}

fn decode_chunk(r: &mut BitReader) -> Result<ColumnChunkMetaData> {
    let path = decode_string(r)?;
    let physical = PhysicalType::try_from(read_u8(r, "chunk physical type")?)?;
    let compression = Compression::try_from(read_u8(r, "chunk compression")?)?;
    let num_encodings = read_vlq(r, "chunk encoding count")?;
    let mut encodings = Vec::with_capacity(num_encodings as usize);
    for _ in 0..num_encodings {
        encodings.push(Encoding::try_from(read_u8(r, "chunk encoding")?)?);
    }
    let file_offset = read_vlq(r, "chunk file offset")?;
    let dictionary_page_offset = if read_flag(r)? {
        Some(read_vlq(r, "dictionary page offset")?)
    } else {
        None
    };
    let total_compressed_size = read_vlq(r, "chunk compressed size")?;
    let total_uncompressed_size = read_vlq(r, "chunk uncompressed size")?;
    let num_values = read_vlq(r, "chunk value count")?;
    let num_pages = read_vlq(r, "chunk page count")?;

    let null_count = read_vlq(r, "null count")?;
    let mut bounds = [None, None];
    for bound in &mut bounds {
        if read_flag(r)? {
            *bound = plain::decode(r, physical, 1)?.pop();
        }
    }
    let [min, max] = bounds;
    let distinct_count = if read_flag(r)? {
        Some(read_vlq(r, "distinct count")?)
    } else {
        None
    };

    Ok(ColumnChunkMetaData {
        path,
        physical,
        compression,
        encodings,
        file_offset,
        dictionary_page_offset,
        total_compressed_size,
        total_uncompressed_size,
        num_values,
        num_pages,
        statistics: ColumnStatistics {
            null_count,
            min,
            max,
            distinct_count,
        },
    })
}
