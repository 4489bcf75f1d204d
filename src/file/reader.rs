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

//! The file reader: footer-first open, column and row group projection,
//! and streaming row assembly.
//!
//! Opening reads only the 8-byte trailer and the footer. Chunk bytes are
//! fetched lazily, one row group at a time, and only for selected columns;
//! unselected chunks are never read.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use bytes::Bytes;

use crate::column::reader::{decode_chunk, TripleBuffer};
use crate::errors::{ColumnFileError, Result};
use crate::file::metadata::{decode_footer, FileMetaData};
use crate::file::{FOOTER_TRAILER_SIZE, MAGIC};
use crate::record::assembler::assemble_row;
use crate::record::row::Row;
use crate::schema::types::{SchemaDescPtr, SchemaDescriptor};

/// Sources with a known byte length.
pub trait Length {
    fn len(&self) -> u64;
}

/// Random access byte sources a file can be read from.
pub trait ChunkReader: Length {
    /// Reads exactly `length` bytes starting at `start`.
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes>;
}

impl Length for File {
    fn len(&self) -> u64 {
        self.metadata().map(|m| m.len()).unwrap_or(0)
    }
}

impl ChunkReader for File {
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        let mut reader = self;
        reader.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; length];
        reader.read_exact(&mut buf)?;
        Ok(buf.into())
    }
}

impl Length for Bytes {
    fn len(&self) -> u64 {
        self.as_ref().len() as u64
    }
}

impl ChunkReader for Bytes {
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        let start = start as usize;
        let end = start.checked_add(length).ok_or_else(|| {
            eof_err!("byte range overflow at offset {}", start)
        })?;
        if end > self.as_ref().len() {
            return Err(eof_err!(
                "requested bytes {}..{} but buffer holds {}",
                start,
                end,
                self.as_ref().len()
            ));
        }
        Ok(self.slice(start..end))
    }
}

/// Reads a complete file from any [`ChunkReader`].
#[derive(Debug)]
pub struct SerializedFileReader<R: ChunkReader> {
    reader: R,
    metadata: FileMetaData,
    selected_fields: Vec<usize>,
    selected_row_groups: Vec<usize>,
    projection_locked: bool,
}

impl<R: ChunkReader> SerializedFileReader<R> {
    /// Opens a file: validates both magics and parses the footer. No page
    /// data is read.
    pub fn new(reader: R) -> Result<Self> {
        let file_len = reader.len();
        let min_len = (MAGIC.len() + FOOTER_TRAILER_SIZE) as u64;
        if file_len < min_len {
            return Err(ColumnFileError::CorruptedFooter(format!(
                "file of {file_len} bytes is too small to be valid"
            )));
        }
        let leading = reader.get_bytes(0, MAGIC.len())?;
        if leading.as_ref() != MAGIC {
            return Err(ColumnFileError::CorruptedFooter(
                "leading magic bytes not found".to_string(),
            ));
        }
        let trailer = reader.get_bytes(file_len - FOOTER_TRAILER_SIZE as u64, FOOTER_TRAILER_SIZE)?;
        if &trailer[4..] != MAGIC {
            return Err(ColumnFileError::CorruptedFooter(
                "trailing magic bytes not found".to_string(),
            ));
        }
        let footer_len = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]) as u64;
        if footer_len + min_len > file_len {
            return Err(ColumnFileError::CorruptedFooter(format!(
                "footer length {footer_len} exceeds file size {file_len}"
            )));
        }
        let footer_start = file_len - FOOTER_TRAILER_SIZE as u64 - footer_len;
        let footer = reader.get_bytes(footer_start, footer_len as usize)?;
        let metadata = decode_footer(footer)?;

        let selected_fields = (0..metadata.schema().fields().len()).collect();
        let selected_row_groups = (0..metadata.row_groups().len()).collect();
        Ok(Self {
            reader,
            metadata,
            selected_fields,
            selected_row_groups,
            projection_locked: false,
        })
    }

    /// The decoded footer.
    pub fn metadata(&self) -> &FileMetaData {
        &self.metadata
    }

    /// The file's full schema.
    pub fn schema(&self) -> &SchemaDescPtr {
        self.metadata.schema()
    }

    /// Total rows in the file.
    pub fn num_rows(&self) -> u64 {
        self.metadata.num_rows()
    }

    /// Restricts reading to the named top-level columns. Output rows keep
    /// schema declaration order regardless of the order given here.
    ///
    /// Fails with [`ColumnFileError::ProjectionLocked`] once [`Self::rows`]
    /// has been called.
    pub fn select_columns(&mut self, names: &[&str]) -> Result<()> {
        if self.projection_locked {
            return Err(ColumnFileError::ProjectionLocked);
        }
        let fields = self.metadata.schema().fields();
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let index = fields
                .iter()
                .position(|f| f.name() == *name)
                .ok_or_else(|| general_err!("no column named '{}' in the schema", name))?;
            if !selected.contains(&index) {
                selected.push(index);
            }
        }
        selected.sort_unstable();
        self.selected_fields = selected;
        Ok(())
    }

    /// Restricts reading to the given row groups, in the order given.
    pub fn select_row_groups(&mut self, indices: &[usize]) -> Result<()> {
        if self.projection_locked {
            return Err(ColumnFileError::ProjectionLocked);
        }
        for &i in indices {
            if i >= self.metadata.row_groups().len() {
                return Err(general_err!(
                    "row group index {} out of range, file has {}",
                    i,
                    self.metadata.row_groups().len()
                ));
            }
        }
        self.selected_row_groups = indices.to_vec();
        Ok(())
    }

    /// Returns a streaming row iterator over the current projection and
    /// locks it.
    pub fn rows(&mut self) -> Result<RowIter<'_, R>> {
        self.projection_locked = true;
        let fields = self.metadata.schema().fields();
        let projected = Arc::new(SchemaDescriptor::new(
            self.selected_fields
                .iter()
                .map(|&i| fields[i].clone())
                .collect(),
        )?);
        Ok(RowIter {
            file: self,
            projected,
            group_cursor: 0,
            buffers: Vec::new(),
            rows_left: 0,
        })
    }
}

/// Streaming row iterator. Holds one row group's worth of decoded columns
/// at a time.
pub struct RowIter<'a, R: ChunkReader> {
    file: &'a SerializedFileReader<R>,
    projected: SchemaDescPtr,
    group_cursor: usize,
    buffers: Vec<TripleBuffer>,
    rows_left: u64,
}

impl<R: ChunkReader> RowIter<'_, R> {
    /// Loads the next selected row group with rows, returning `false` when
    /// none remain.
    fn load_next_group(&mut self) -> Result<bool> {
        while self.group_cursor < self.file.selected_row_groups.len() {
            let rg_index = self.file.selected_row_groups[self.group_cursor];
            self.group_cursor += 1;
            let rg = &self.file.metadata.row_groups()[rg_index];

            let schema = self.file.metadata.schema();
            let mut buffers = Vec::new();
            for &field in &self.file.selected_fields {
                let (start, end) = schema.leaf_range(field);
                for leaf_index in start..end {
                    let chunk = rg.column(leaf_index);
                    let data = self
                        .file
                        .reader
                        .get_bytes(chunk.file_offset(), chunk.compressed_size() as usize)?;
                    buffers.push(decode_chunk(data, schema.leaf(leaf_index), chunk)?);
                }
            }
            if rg.num_rows() > 0 {
                self.buffers = buffers;
                self.rows_left = rg.num_rows();
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<R: ChunkReader> Iterator for RowIter<'_, R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rows_left == 0 {
            match self.load_next_group() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
        self.rows_left -= 1;
        Some(assemble_row(&self.projected, &mut self.buffers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{PhysicalType, Repetition};
    use crate::file::properties::WriterProperties;
    use crate::file::writer::SerializedFileWriter;
    use crate::record::row::Field;
    use crate::schema::types::Column;

    fn sample_file() -> Bytes {
        let schema = Arc::new(
            SchemaDescriptor::new(vec![
                Column::plain("id", Repetition::REQUIRED, PhysicalType::INT64),
                Column::string("name", Repetition::OPTIONAL),
            ])
            .unwrap(),
        );
        let mut writer = SerializedFileWriter::new(
            Vec::new(),
            schema,
            Arc::new(WriterProperties::default()),
        )
        .unwrap();
        for i in 0..10i64 {
            writer
                .append_row(&Row::new(vec![
                    ("id".to_string(), Field::Long(i)),
                    ("name".to_string(), Field::Str(format!("row{i}"))),
                ]))
                .unwrap();
        }
        writer.finish().unwrap();
        writer.into_inner().unwrap().into()
    }

    #[test]
    fn test_open_and_read_all() {
        let mut reader = SerializedFileReader::new(sample_file()).unwrap();
        assert_eq!(reader.num_rows(), 10);
        let rows: Result<Vec<Row>> = reader.rows().unwrap().collect();
        let rows = rows.unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[3].get("id"), Some(&Field::Long(3)));
        assert_eq!(rows[3].get("name"), Some(&Field::Str("row3".to_string())));
    }

    #[test]
    fn test_column_projection() {
        let mut reader = SerializedFileReader::new(sample_file()).unwrap();
        reader.select_columns(&["name"]).unwrap();
        let rows: Result<Vec<Row>> = reader.rows().unwrap().collect();
        let rows = rows.unwrap();
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0].get("id"), None);
        assert_eq!(rows[0].get("name"), Some(&Field::Str("row0".to_string())));
    }

    #[test]
    fn test_projection_locked_after_rows() {
        let mut reader = SerializedFileReader::new(sample_file()).unwrap();
        {
            let _iter = reader.rows().unwrap();
        }
        assert!(matches!(
            reader.select_columns(&["id"]).unwrap_err(),
            ColumnFileError::ProjectionLocked
        ));
        assert!(matches!(
            reader.select_row_groups(&[0]).unwrap_err(),
            ColumnFileError::ProjectionLocked
        ));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let mut reader = SerializedFileReader::new(sample_file()).unwrap();
        assert!(reader.select_columns(&["bogus"]).is_err());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = sample_file().to_vec();
        let n = bytes.len();
        bytes[n - 1] = b'X';
        assert!(matches!(
            SerializedFileReader::new(Bytes::from(bytes)).unwrap_err(),
            ColumnFileError::CorruptedFooter(_)
        ));

        let mut bytes = sample_file().to_vec();
        bytes[0] = b'X';
        assert!(matches!(
            SerializedFileReader::new(Bytes::from(bytes)).unwrap_err(),
            ColumnFileError::CorruptedFooter(_)
        ));
    }

    #[test]
    fn test_truncated_file_rejected() {
        let bytes = Bytes::from_static(b"COF1\x00");
        assert!(matches!(
            SerializedFileReader::new(bytes).unwrap_err(),
            ColumnFileError::CorruptedFooter(_)
        ));
    }

    #[test]
    fn test_footer_length_out_of_range() {
        // valid magics, absurd footer length
        let mut bytes = b"COF1".to_vec();
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(b"COF1");
        assert!(matches!(
            SerializedFileReader::new(Bytes::from(bytes)).unwrap_err(),
            ColumnFileError::CorruptedFooter(_)
        ));
    }
}
