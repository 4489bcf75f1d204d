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

//! Pages and their headers.
//!
//! A page is the unit of encoding and compression. Its header is stored
//! uncompressed immediately before the (possibly compressed) payload:
//!
//! ```text
//! page_type: u8
//! encoding: u8
//! num_values: uleb128
//! uncompressed_size: uleb128
//! compressed_size: uleb128
//! ```
//!
//! For data pages `num_values` counts level slots, nulls included; for
//! dictionary pages it counts dictionary entries.

use bytes::Bytes;

use crate::basic::{Encoding, PageType};
use crate::compression::Codec;
use crate::errors::Result;
use crate::util::bit_util::{BitReader, BitWriter};

/// An uncompressed page payload and its descriptive fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    /// A run of values for one leaf column, levels included.
    Data {
        buf: Bytes,
        num_values: usize,
        encoding: Encoding,
    },
    /// The chunk dictionary, PLAIN-encoded in index order.
    Dictionary { buf: Bytes, num_values: usize },
}

impl Page {
    pub fn page_type(&self) -> PageType {
        match self {
            Page::Data { .. } => PageType::DATA_PAGE,
            Page::Dictionary { .. } => PageType::DICTIONARY_PAGE,
        }
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            Page::Data { encoding, .. } => *encoding,
            Page::Dictionary { .. } => Encoding::PLAIN,
        }
    }

    pub fn num_values(&self) -> usize {
        match self {
            Page::Data { num_values, .. } | Page::Dictionary { num_values, .. } => *num_values,
        }
    }

    pub fn buffer(&self) -> &Bytes {
        match self {
            Page::Data { buf, .. } | Page::Dictionary { buf, .. } => buf,
        }
    }
}

/// The uncompressed header preceding each page payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub encoding: Encoding,
    pub num_values: u64,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
}

impl PageHeader {
    pub fn serialize(&self) -> Vec<u8> {
        let mut writer = BitWriter::new(16);
        writer.put_aligned(u64::from(self.page_type.as_u8()), 1);
        writer.put_aligned(u64::from(self.encoding.as_u8()), 1);
        writer.put_vlq_int(self.num_values);
        writer.put_vlq_int(self.uncompressed_size);
        writer.put_vlq_int(self.compressed_size);
        writer.consume()
    }

    pub fn parse(reader: &mut BitReader) -> Result<Self> {
        let page_type = reader
            .get_aligned::<u8>(1)
            .ok_or_else(|| eof_err!("not enough data for page type"))?;
        let encoding = reader
            .get_aligned::<u8>(1)
            .ok_or_else(|| eof_err!("not enough data for page encoding"))?;
        let num_values = reader
            .get_vlq_int()
            .ok_or_else(|| eof_err!("not enough data for page value count"))?;
        let uncompressed_size = reader
            .get_vlq_int()
            .ok_or_else(|| eof_err!("not enough data for page uncompressed size"))?;
        let compressed_size = reader
            .get_vlq_int()
            .ok_or_else(|| eof_err!("not enough data for page compressed size"))?;
        Ok(Self {
            page_type: PageType::try_from(page_type)?,
            encoding: Encoding::try_from(encoding)?,
            num_values,
            uncompressed_size,
            compressed_size,
        })
    }
}

/// A page ready to be written: serialized header plus compressed payload.
#[derive(Debug, Clone)]
pub struct CompressedPage {
    pub header: PageHeader,
    pub buf: Bytes,
}

impl CompressedPage {
    /// On-disk size of the page, header included.
    pub fn total_size(&self) -> usize {
        self.header.serialize().len() + self.buf.len()
    }
}

/// Compresses `page` with `codec`, or passes it through when the chunk is
/// uncompressed.
pub fn compress_page(page: Page, codec: &mut Option<Box<dyn Codec>>) -> Result<CompressedPage> {
    let page_type = page.page_type();
    let encoding = page.encoding();
    let num_values = page.num_values() as u64;
    let buf = match page {
        Page::Data { buf, .. } | Page::Dictionary { buf, .. } => buf,
    };
    let uncompressed_size = buf.len() as u64;

    let buf = match codec {
        Some(codec) => {
            let mut out = Vec::with_capacity(buf.len());
            codec.compress(&buf, &mut out)?;
            Bytes::from(out)
        }
        None => buf,
    };

    Ok(CompressedPage {
        header: PageHeader {
            page_type,
            encoding,
            num_values,
            uncompressed_size,
            compressed_size: buf.len() as u64,
        },
        buf,
    })
}

/// Inverse of [`compress_page`]: restores the uncompressed payload described
/// by `header` from the bytes that followed it on disk.
pub fn decompress_page(
    header: PageHeader,
    buf: Bytes,
    codec: &mut Option<Box<dyn Codec>>,
) -> Result<Page> {
    let buf = match codec {
        Some(codec) => {
            let mut out = Vec::with_capacity(header.uncompressed_size as usize);
            let n = codec.decompress(&buf, &mut out, Some(header.uncompressed_size as usize))?;
            if n as u64 != header.uncompressed_size {
                return Err(general_err!(
                    "page decompressed to {} bytes, header claims {}",
                    n,
                    header.uncompressed_size
                ));
            }
            Bytes::from(out)
        }
        None => {
            if buf.len() as u64 != header.uncompressed_size {
                return Err(general_err!(
                    "uncompressed page holds {} bytes, header claims {}",
                    buf.len(),
                    header.uncompressed_size
                ));
            }
            buf
        }
    };

    Ok(match header.page_type {
        PageType::DATA_PAGE => Page::Data {
            buf,
            num_values: header.num_values as usize,
            encoding: header.encoding,
        },
        PageType::DICTIONARY_PAGE => Page::Dictionary {
            buf,
            num_values: header.num_values as usize,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Compression;
    use crate::compression::create_codec;

    #[test]
    fn test_header_roundtrip() {
        let header = PageHeader {
            page_type: PageType::DATA_PAGE,
            encoding: Encoding::RLE_DICTIONARY,
            num_values: 300,
            uncompressed_size: 70_000,
            compressed_size: 1234,
        };
        let bytes = header.serialize();
        let mut reader = BitReader::new(bytes.into());
        assert_eq!(PageHeader::parse(&mut reader).unwrap(), header);
    }

    #[test]
    fn test_header_rejects_unknown_page_type() {
        let mut bytes = PageHeader {
            page_type: PageType::DATA_PAGE,
            encoding: Encoding::PLAIN,
            num_values: 1,
            uncompressed_size: 0,
            compressed_size: 0,
        }
        .serialize();
        bytes[0] = 0xEE;
        let mut reader = BitReader::new(bytes.into());
        assert!(PageHeader::parse(&mut reader).is_err());
    }

    #[test]
    fn test_uncompressed_passthrough() {
        let page = Page::Data {
            buf: Bytes::from_static(b"payload"),
            num_values: 3,
            encoding: Encoding::PLAIN,
        };
        let mut codec = create_codec(Compression::UNCOMPRESSED).unwrap();
        let compressed = compress_page(page.clone(), &mut codec).unwrap();
        assert_eq!(compressed.header.compressed_size, 7);
        assert_eq!(compressed.header.uncompressed_size, 7);
        let restored = decompress_page(compressed.header, compressed.buf, &mut codec).unwrap();
        assert_eq!(restored, page);
    }

    #[test]
    #[cfg(feature = "snap")]
    fn test_compressed_roundtrip() {
        let payload: Vec<u8> = std::iter::repeat(b"abcd".as_slice())
            .take(256)
            .flatten()
            .copied()
            .collect();
        let page = Page::Dictionary {
            buf: payload.clone().into(),
            num_values: 256,
        };
        let mut codec = create_codec(Compression::SNAPPY).unwrap();
        let compressed = compress_page(page.clone(), &mut codec).unwrap();
        assert!(compressed.buf.len() < payload.len());
        assert_eq!(compressed.header.uncompressed_size, payload.len() as u64);
        let restored = decompress_page(compressed.header, compressed.buf, &mut codec).unwrap();
        assert_eq!(restored, page);
    }

    #[test]
    fn test_size_mismatch_detected() {
        let header = PageHeader {
            page_type: PageType::DATA_PAGE,
            encoding: Encoding::PLAIN,
            num_values: 1,
            uncompressed_size: 10,
            compressed_size: 3,
        };
        let mut codec = create_codec(Compression::UNCOMPRESSED).unwrap();
        assert!(decompress_page(header, Bytes::from_static(b"abc"), &mut codec).is_err());
    }
}
