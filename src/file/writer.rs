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

//! The file writer: a single forward pass over rows.
//!
//! Rows are shredded into per-leaf column chunk writers; row groups flush
//! when [`close_row_group`](SerializedFileWriter::close_row_group) is
//! called or the configured row limit is reached, and
//! [`finish`](SerializedFileWriter::finish) writes the footer and seals
//! the writer. Nothing is ever seeked back over.

use std::io::Write;

use crate::errors::{ColumnFileError, Result};
use crate::file::metadata::{
    encode_footer, ColumnChunkMetaData, FileMetaData, RowGroupMetaData,
};
use crate::file::properties::WriterPropertiesPtr;
use crate::file::{FORMAT_VERSION, MAGIC};
use crate::column::page::CompressedPage;
use crate::column::writer::ColumnChunkWriter;
use crate::record::row::Row;
use crate::record::shredder::shred_row;
use crate::schema::types::SchemaDescPtr;

/// A [`Write`] wrapper counting bytes written, so page and footer offsets
/// are known without seeking.
pub struct TrackedWrite<W: Write> {
    inner: W,
    bytes_written: u64,
}

impl<W: Write> TrackedWrite<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Bytes written through this wrapper so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Unwraps the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for TrackedWrite<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.bytes_written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// An in-progress row group: one chunk writer per schema leaf.
struct RowGroupState {
    writers: Vec<ColumnChunkWriter>,
    num_rows: u64,
}

/// Writes a complete file to any [`Write`] sink.
pub struct SerializedFileWriter<W: Write> {
    buf: TrackedWrite<W>,
    schema: SchemaDescPtr,
    props: WriterPropertiesPtr,
    current_group: Option<RowGroupState>,
    row_groups: Vec<RowGroupMetaData>,
    total_rows: u64,
    finished: bool,
}

impl<W: Write> SerializedFileWriter<W> {
    /// Creates a writer and emits the leading magic.
    pub fn new(writer: W, schema: SchemaDescPtr, props: WriterPropertiesPtr) -> Result<Self> {
        let mut buf = TrackedWrite::new(writer);
        buf.write_all(&MAGIC)?;
        Ok(Self {
            buf,
            schema,
            props,
            current_group: None,
            row_groups: Vec::new(),
            total_rows: 0,
            finished: false,
        })
    }

    /// The schema rows are validated against.
    pub fn schema(&self) -> &SchemaDescPtr {
        &self.schema
    }

    /// Appends one row, opening a row group if none is open and flushing it
    /// when it reaches the configured row limit.
    pub fn append_row(&mut self, row: &Row) -> Result<()> {
        if self.finished {
            return Err(ColumnFileError::WriterClosed);
        }
        let shredded = shred_row(&self.schema, row)?;

        if self.current_group.is_none() {
            let writers = self
                .schema
                .leaves()
                .iter()
                .map(|leaf| ColumnChunkWriter::new(leaf.clone(), self.props.clone()))
                .collect::<Result<Vec<_>>>()?;
            self.current_group = Some(RowGroupState {
                writers,
                num_rows: 0,
            });
        }
        let group = self.current_group.as_mut().expect("just opened");
        for (writer, triples) in group.writers.iter_mut().zip(shredded) {
            for (value, def, rep) in &triples {
                writer.write(value.as_ref(), *def, *rep)?;
            }
        }
        group.num_rows += 1;
        self.total_rows += 1;

        if group.num_rows as usize >= self.props.max_row_group_size() {
            self.close_row_group()?;
        }
        Ok(())
    }

    /// Flushes the open row group to the sink. A no-op when none is open;
    /// the next appended row starts a new group.
    pub fn close_row_group(&mut self) -> Result<()> {
        if self.finished {
            return Err(ColumnFileError::WriterClosed);
        }
        let Some(group) = self.current_group.take() else {
            return Ok(());
        };

        let mut columns = Vec::with_capacity(group.writers.len());
        let schema = self.schema.clone();
        for (leaf, writer) in schema.leaves().iter().zip(group.writers) {
            let chunk = writer.close()?;
            let file_offset = self.buf.bytes_written();

            let dictionary_page_offset = chunk.dictionary_page.as_ref().map(|_| file_offset);
            if let Some(page) = &chunk.dictionary_page {
                self.write_page(page)?;
            }
            for page in &chunk.data_pages {
                self.write_page(page)?;
            }

            columns.push(ColumnChunkMetaData {
                path: leaf.path().to_string(),
                physical: leaf.physical_type(),
                compression: self.props.compression(),
                encodings: chunk.encodings.clone(),
                file_offset,
                dictionary_page_offset,
                total_compressed_size: chunk.total_compressed_size(),
                total_uncompressed_size: chunk.total_uncompressed_size(),
                num_values: chunk.num_values,
                num_pages: chunk.num_pages(),
                statistics: chunk.statistics,
            });
        }

        log::debug!(
            "flushed row group {} with {} rows",
            self.row_groups.len(),
            group.num_rows
        );
        self.row_groups.push(RowGroupMetaData {
            num_rows: group.num_rows,
            columns,
        });
        Ok(())
    }

    /// Flushes any open row group, writes the footer and trailer, and seals
    /// the writer. A second call fails with
    /// [`ColumnFileError::WriterClosed`].
    pub fn finish(&mut self) -> Result<FileMetaData> {
        if self.finished {
            return Err(ColumnFileError::WriterClosed);
        }
        self.close_row_group()?;
        self.finished = true;

        let meta = FileMetaData {
            version: FORMAT_VERSION,
            created_by: self.props.created_by().map(str::to_string),
            key_value_metadata: self.props.key_value_metadata().cloned(),
            schema: self.schema.clone(),
            num_rows: self.total_rows,
            row_groups: std::mem::take(&mut self.row_groups),
        };

        let footer = encode_footer(&meta)?;
        self.buf.write_all(&footer)?;
        self.buf.write_all(&(footer.len() as u32).to_le_bytes())?;
        self.buf.write_all(&MAGIC)?;
        self.buf.flush()?;
        Ok(meta)
    }

    /// Finishes the file and returns the underlying sink.
    pub fn into_inner(mut self) -> Result<W> {
        if !self.finished {
            self.finish()?;
        }
        Ok(self.buf.into_inner())
    }

    fn write_page(&mut self, page: &CompressedPage) -> Result<()> {
        self.buf.write_all(&page.header.serialize())?;
        self.buf.write_all(&page.buf)?;
        Ok(())
    }
}
