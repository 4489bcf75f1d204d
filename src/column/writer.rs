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

//! The per-leaf column chunk writer.
//!
//! Accepts `(value, def_level, rep_level)` triples, buffers them into data
//! pages, and finalizes into compressed pages plus statistics. Pages are
//! held in memory until the row group closes so the dictionary page can be
//! placed first in the chunk.
//!
//! Dictionary policy: chunks start dictionary encoded when enabled. At the
//! first page flush the distinct-to-total ratio is checked once; above the
//! limit the chunk falls back to PLAIN before anything was emitted. When
//! the dictionary later outgrows its size limit, already flushed pages keep
//! their encoding and later pages switch to PLAIN, so a chunk may mix
//! `RLE_DICTIONARY` and `PLAIN` data pages.

use std::collections::BTreeSet;

use bytes::Bytes;

use crate::basic::Encoding;
use crate::column::page::{compress_page, CompressedPage, Page};
use crate::compression::{create_codec, Codec};
use crate::data_type::Value;
use crate::encodings::{dict, dict::DictEncoder, plain, rle};
use crate::errors::{ColumnFileError, Result};
use crate::file::properties::WriterPropertiesPtr;
use crate::file::statistics::{ColumnStatistics, StatisticsBuilder};
use crate::schema::types::ColumnDescPtr;
use crate::util::bit_util::num_required_bits;

/// The finalized output of one column chunk, ready to be laid out on disk.
#[derive(Debug)]
pub struct FinishedChunk {
    /// The dictionary page, present when any data page is dictionary
    /// encoded. Written first in the chunk.
    pub dictionary_page: Option<CompressedPage>,
    pub data_pages: Vec<CompressedPage>,
    /// Encodings used across all pages, deduplicated and ordered.
    pub encodings: Vec<Encoding>,
    /// Level slots written, nulls included.
    pub num_values: u64,
    pub statistics: ColumnStatistics,
}

impl FinishedChunk {
    /// Chunk size with all page payloads decompressed, headers included.
    pub fn total_uncompressed_size(&self) -> u64 {
        self.all_pages()
            .map(|p| (p.header.serialize().len() as u64) + p.header.uncompressed_size)
            .sum()
    }

    /// On-disk chunk size, headers included.
    pub fn total_compressed_size(&self) -> u64 {
        self.all_pages().map(|p| p.total_size() as u64).sum()
    }

    pub fn num_pages(&self) -> u64 {
        (self.dictionary_page.iter().count() + self.data_pages.len()) as u64
    }

    fn all_pages(&self) -> impl Iterator<Item = &CompressedPage> {
        self.dictionary_page.iter().chain(self.data_pages.iter())
    }
}

/// Writes one leaf column of one row group.
pub struct ColumnChunkWriter {
    descr: ColumnDescPtr,
    props: WriterPropertiesPtr,
    codec: Option<Box<dyn Codec>>,

    dict: Option<DictEncoder>,
    /// The distinct ratio is checked exactly once, at the first page flush.
    dict_ratio_checked: bool,
    /// Set once the dictionary outgrew its size limit; later pages encode
    /// PLAIN while the dictionary itself stays valid for earlier pages.
    dict_frozen: bool,

    rep_levels: Vec<u64>,
    def_levels: Vec<u64>,
    page_values: Vec<Value>,
    page_slots: usize,
    page_value_bytes: usize,

    total_slots: u64,
    total_non_null: u64,
    pages: Vec<CompressedPage>,
    encodings: BTreeSet<Encoding>,
    stats: StatisticsBuilder,
}

impl ColumnChunkWriter {
    pub fn new(descr: ColumnDescPtr, props: WriterPropertiesPtr) -> Result<Self> {
        let codec = create_codec(props.compression())?;
        let dict = props.dictionary_enabled().then(DictEncoder::new);
        let stats = StatisticsBuilder::new(props.statistics_distinct_limit());
        Ok(Self {
            descr,
            props,
            codec,
            dict,
            dict_ratio_checked: false,
            dict_frozen: false,
            rep_levels: Vec::new(),
            def_levels: Vec::new(),
            page_values: Vec::new(),
            page_slots: 0,
            page_value_bytes: 0,
            total_slots: 0,
            total_non_null: 0,
            pages: Vec::new(),
            encodings: BTreeSet::new(),
            stats,
        })
    }

    /// Appends one shredded triple. `value` must be present exactly when
    /// `def_level` reaches the leaf's maximum.
    pub fn write(&mut self, value: Option<&Value>, def_level: i16, rep_level: i16) -> Result<()> {
        let max_def = self.descr.max_def_level();
        let max_rep = self.descr.max_rep_level();
        if def_level < 0 || def_level > max_def {
            return Err(general_err!(
                "definition level {} out of range [0, {}] for column '{}'",
                def_level,
                max_def,
                self.descr.path()
            ));
        }
        if rep_level < 0 || rep_level > max_rep {
            return Err(general_err!(
                "repetition level {} out of range [0, {}] for column '{}'",
                rep_level,
                max_rep,
                self.descr.path()
            ));
        }

        if max_rep > 0 {
            self.rep_levels.push(rep_level as u64);
        }
        if max_def > 0 {
            self.def_levels.push(def_level as u64);
        }

        if def_level == max_def {
            let value = value.ok_or_else(|| {
                ColumnFileError::SchemaMismatch(format!(
                    "column '{}' expects a value at definition level {}",
                    self.descr.path(),
                    def_level
                ))
            })?;
            if value.physical_type() != self.descr.physical_type() {
                return Err(ColumnFileError::SchemaMismatch(format!(
                    "column '{}' stores {} but got {}",
                    self.descr.path(),
                    self.descr.physical_type(),
                    value.type_name()
                )));
            }
            self.stats.update(value)?;
            if let Some(dict) = self.dict.as_mut() {
                if !self.dict_frozen {
                    dict.put(value);
                }
            }
            self.page_value_bytes += value.encoded_size();
            self.page_values.push(value.clone());
            self.total_non_null += 1;
        } else {
            if value.is_some() {
                return Err(ColumnFileError::SchemaMismatch(format!(
                    "column '{}' got a value below definition level {}",
                    self.descr.path(),
                    max_def
                )));
            }
            self.stats.update_null();
        }

        self.page_slots += 1;
        self.total_slots += 1;

        if self.page_slots >= self.props.data_page_value_count_limit()
            || self.page_value_bytes >= self.props.data_page_size_limit()
        {
            self.flush_page()?;
        }
        Ok(())
    }

    /// Flushes any buffered page and returns the chunk's pages and
    /// statistics.
    pub fn close(mut self) -> Result<FinishedChunk> {
        if self.page_slots > 0 {
            self.flush_page()?;
        }

        let dictionary_page = match &self.dict {
            Some(dict) if self.encodings.contains(&Encoding::RLE_DICTIONARY) => {
                let buf = Bytes::from(dict.write_dict()?);
                let page = Page::Dictionary {
                    buf,
                    num_values: dict.num_entries(),
                };
                Some(compress_page(page, &mut self.codec)?)
            }
            _ => None,
        };

        Ok(FinishedChunk {
            dictionary_page,
            data_pages: self.pages,
            encodings: self.encodings.into_iter().collect(),
            num_values: self.total_slots,
            statistics: self.stats.build(),
        })
    }

    fn flush_page(&mut self) -> Result<()> {
        // Ratio check fires exactly once, before anything was emitted, so a
        // fallback never strands an already written dictionary page.
        if !self.dict_ratio_checked {
            self.dict_ratio_checked = true;
            if let Some(dict) = &self.dict {
                if self.total_non_null > 0 {
                    let ratio = dict.num_entries() as f64 / self.total_non_null as f64;
                    if ratio > self.props.dictionary_ratio_limit() {
                        log::debug!(
                            "column '{}': distinct ratio {:.3} above limit {:.3}, falling back to PLAIN",
                            self.descr.path(),
                            ratio,
                            self.props.dictionary_ratio_limit()
                        );
                        self.dict = None;
                    }
                }
            }
        }

        let use_dict = self.dict.is_some() && !self.dict_frozen;
        let (values_buf, encoding) = match (&mut self.dict, use_dict) {
            (Some(dict), true) => {
                // Re-interning flushed values is a lookup; the dictionary
                // already holds them.
                let indices: Vec<u64> = self.page_values.iter().map(|v| dict.put(v)).collect();
                (dict::write_indices(&indices, dict.bit_width())?, Encoding::RLE_DICTIONARY)
            }
            _ => (plain::encode_to_vec(&self.page_values)?, Encoding::PLAIN),
        };

        let mut buf = Vec::new();
        if self.descr.max_rep_level() > 0 {
            let bit_width = num_required_bits(self.descr.max_rep_level() as u64);
            buf.extend_from_slice(&rle::pack_with_length(&self.rep_levels, bit_width)?);
            self.encodings.insert(Encoding::RLE);
        }
        if self.descr.max_def_level() > 0 {
            let bit_width = num_required_bits(self.descr.max_def_level() as u64);
            buf.extend_from_slice(&rle::pack_with_length(&self.def_levels, bit_width)?);
            self.encodings.insert(Encoding::RLE);
        }
        buf.extend_from_slice(&values_buf);

        let page = Page::Data {
            buf: buf.into(),
            num_values: self.page_slots,
            encoding,
        };
        self.pages.push(compress_page(page, &mut self.codec)?);
        self.encodings.insert(encoding);

        if let Some(dict) = &self.dict {
            if !self.dict_frozen
                && dict.dict_encoded_size() > self.props.dictionary_page_size_limit()
            {
                log::debug!(
                    "column '{}': dictionary reached {} bytes, later pages encode PLAIN",
                    self.descr.path(),
                    dict.dict_encoded_size()
                );
                self.dict_frozen = true;
            }
        }

        self.rep_levels.clear();
        self.def_levels.clear();
        self.page_values.clear();
        self.page_slots = 0;
        self.page_value_bytes = 0;
        Ok(())
    }
}
