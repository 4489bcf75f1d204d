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

//! The column chunk decoder: turns a chunk's raw bytes back into the
//! `(value, def_level, rep_level)` triples the assembler consumes.

use bytes::Bytes;

use crate::basic::Encoding;
use crate::column::page::{decompress_page, Page, PageHeader};
use crate::compression::create_codec;
use crate::data_type::Value;
use crate::encodings::{dict, plain, rle};
use crate::errors::Result;
use crate::file::metadata::ColumnChunkMetaData;
use crate::schema::types::ColumnDescPtr;
use crate::util::bit_util::{num_required_bits, BitReader};

/// One leaf column's decoded triples, consumed front to back by the record
/// assembler.
#[derive(Debug)]
pub struct TripleBuffer {
    triples: Vec<(Option<Value>, i16, i16)>,
    pos: usize,
}

impl TripleBuffer {
    pub fn new(triples: Vec<(Option<Value>, i16, i16)>) -> Self {
        Self { triples, pos: 0 }
    }

    /// Slots not yet consumed.
    pub fn remaining(&self) -> usize {
        self.triples.len() - self.pos
    }

    /// Definition level of the next slot without consuming it.
    pub fn peek_def(&self) -> Option<i16> {
        self.triples.get(self.pos).map(|t| t.1)
    }

    /// Repetition level of the next slot without consuming it.
    pub fn peek_rep(&self) -> Option<i16> {
        self.triples.get(self.pos).map(|t| t.2)
    }

    /// Consumes the next slot.
    pub fn next(&mut self) -> Option<(Option<Value>, i16, i16)> {
        let triple = self.triples.get_mut(self.pos)?;
        let out = (triple.0.take(), triple.1, triple.2);
        self.pos += 1;
        Some(out)
    }
}

/// Decodes all pages of one column chunk.
///
/// `chunk_data` holds exactly the chunk's bytes, first page header through
/// last page payload, as recorded in the footer.
pub fn decode_chunk(
    chunk_data: Bytes,
    descr: &ColumnDescPtr,
    meta: &ColumnChunkMetaData,
) -> Result<TripleBuffer> {
    let mut codec = create_codec(meta.compression())?;
    let max_def = descr.max_def_level();
    let max_rep = descr.max_rep_level();

    let mut dictionary: Option<Vec<Value>> = None;
    let mut triples = Vec::with_capacity(meta.num_values() as usize);
    let mut offset = 0usize;

    for page_index in 0..meta.num_pages() {
        let mut header_reader = BitReader::new(chunk_data.slice(offset..));
        let header = PageHeader::parse(&mut header_reader)?;
        let payload_start = offset + header_reader.position();
        let payload_end = payload_start + header.compressed_size as usize;
        if payload_end > chunk_data.len() {
            return Err(eof_err!(
                "page {} of column '{}' extends past the chunk",
                page_index,
                descr.path()
            ));
        }
        let payload = chunk_data.slice(payload_start..payload_end);
        offset = payload_end;

        match decompress_page(header, payload, &mut codec)? {
            Page::Dictionary { buf, num_values } => {
                if page_index != 0 {
                    return Err(general_err!(
                        "column '{}': dictionary page is not first in the chunk",
                        descr.path()
                    ));
                }
                dictionary = Some(dict::decode_dictionary(
                    buf,
                    descr.physical_type(),
                    num_values,
                )?);
            }
            Page::Data {
                buf,
                num_values,
                encoding,
            } => {
                decode_data_page(
                    buf,
                    num_values,
                    encoding,
                    descr,
                    max_def,
                    max_rep,
                    dictionary.as_deref(),
                    &mut triples,
                )?;
            }
        }
    }

    if triples.len() as u64 != meta.num_values() {
        return Err(general_err!(
            "column '{}': decoded {} slots, footer claims {}",
            descr.path(),
            triples.len(),
            meta.num_values()
        ));
    }
    Ok(TripleBuffer::new(triples))
}

#[allow(clippy::too_many_arguments)]
fn decode_data_page(
    buf: Bytes,
    num_values: usize,
    encoding: Encoding,
    descr: &ColumnDescPtr,
    max_def: i16,
    max_rep: i16,
    dictionary: Option<&[Value]>,
    triples: &mut Vec<(Option<Value>, i16, i16)>,
) -> Result<()> {
    let mut offset = 0usize;

    let rep_levels = if max_rep > 0 {
        let bit_width = num_required_bits(max_rep as u64);
        let (levels, consumed) =
            rle::unpack_with_length(&buf.slice(offset..), bit_width, num_values)?;
        offset += consumed;
        Some(levels)
    } else {
        None
    };
    let def_levels = if max_def > 0 {
        let bit_width = num_required_bits(max_def as u64);
        let (levels, consumed) =
            rle::unpack_with_length(&buf.slice(offset..), bit_width, num_values)?;
        offset += consumed;
        Some(levels)
    } else {
        None
    };

    let num_non_null = match &def_levels {
        Some(levels) => levels.iter().filter(|d| **d == max_def as u64).count(),
        None => num_values,
    };

    let values_buf = buf.slice(offset..);
    let mut values = match encoding {
        Encoding::PLAIN => {
            let mut reader = BitReader::new(values_buf);
            plain::decode(&mut reader, descr.physical_type(), num_non_null)?
        }
        Encoding::RLE_DICTIONARY => {
            let dictionary = dictionary.ok_or_else(|| {
                general_err!(
                    "column '{}': dictionary encoded page but no dictionary page",
                    descr.path()
                )
            })?;
            dict::decode_index_page(values_buf, dictionary, num_non_null)?
        }
        Encoding::RLE => {
            return Err(general_err!(
                "column '{}': RLE is a level encoding, not a value encoding",
                descr.path()
            ))
        }
    }
    .into_iter();

    for i in 0..num_values {
        let def = def_levels.as_ref().map_or(max_def, |l| l[i] as i16);
        let rep = rep_levels.as_ref().map_or(0, |l| l[i] as i16);
        if def > max_def || rep > max_rep {
            return Err(general_err!(
                "column '{}': level ({}, {}) out of range",
                descr.path(),
                def,
                rep
            ));
        }
        let value = if def == max_def {
            Some(values.next().ok_or_else(|| {
                general_err!("column '{}': values section ran out", descr.path())
            })?)
        } else {
            None
        };
        triples.push((value, def, rep));
    }
    Ok(())
}
