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

//! Page compression codecs.
//!
//! Compression applies to page payloads only; page headers and the footer
//! are always stored uncompressed. Each codec is behind a cargo feature so
//! the crate builds without any of them; a file written with a codec the
//! reader was built without fails with
//! [`ColumnFileError::CodecUnavailable`] at decompression time, not at
//! open time.

use crate::basic::Compression;
use crate::errors::{ColumnFileError, Result};

/// A block compressor/decompressor for page payloads.
pub trait Codec: Send {
    /// Compresses `input` and appends the result to `output`.
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;

    /// Decompresses `input`, appending to `output` and returning the number
    /// of bytes produced. `uncompress_size` is the exact decompressed size
    /// recorded in the page header, used to presize the output where the
    /// codec benefits from it.
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut Vec<u8>,
        uncompress_size: Option<usize>,
    ) -> Result<usize>;
}

/// Returns the codec for `compression`, `None` for `UNCOMPRESSED`, or
/// [`ColumnFileError::CodecUnavailable`] when the matching cargo feature is
/// disabled.
pub fn create_codec(compression: Compression) -> Result<Option<Box<dyn Codec>>> {
    match compression {
        Compression::UNCOMPRESSED => Ok(None),
        #[cfg(feature = "snap")]
        Compression::SNAPPY => Ok(Some(Box::new(SnappyCodec::new()))),
        #[cfg(feature = "flate2")]
        Compression::GZIP => Ok(Some(Box::new(GZipCodec::new()))),
        #[cfg(feature = "zstd")]
        Compression::ZSTD => Ok(Some(Box::new(ZstdCodec::new()))),
        #[allow(unreachable_patterns)]
        _ => Err(ColumnFileError::CodecUnavailable(compression)),
    }
}

#[cfg(feature = "snap")]
mod snappy_codec {
    use snap::raw::{decompress_len, max_compress_len, Decoder, Encoder};

    use super::Codec;
    use crate::errors::Result;

    pub struct SnappyCodec {
        decoder: Decoder,
        encoder: Encoder,
    }

    impl SnappyCodec {
        pub(crate) fn new() -> Self {
            Self {
                decoder: Decoder::new(),
                encoder: Encoder::new(),
            }
        }
    }

    impl Codec for SnappyCodec {
        fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
            let offset = output.len();
            let required = max_compress_len(input.len());
            output.resize(offset + required, 0);
            let n = self
                .encoder
                .compress(input, &mut output[offset..])
                .map_err(|e| general_err!("snappy compression failed: {}", e))?;
            output.truncate(offset + n);
            Ok(())
        }

        fn decompress(
            &mut self,
            input: &[u8],
            output: &mut Vec<u8>,
            uncompress_size: Option<usize>,
        ) -> Result<usize> {
            let len = match uncompress_size {
                Some(size) => size,
                None => decompress_len(input)
                    .map_err(|e| general_err!("corrupt snappy stream: {}", e))?,
            };
            let offset = output.len();
            output.resize(offset + len, 0);
            let n = self
                .decoder
                .decompress(input, &mut output[offset..])
                .map_err(|e| general_err!("snappy decompression failed: {}", e))?;
            output.truncate(offset + n);
            Ok(n)
        }
    }
}
#[cfg(feature = "snap")]
use snappy_codec::SnappyCodec;

#[cfg(feature = "flate2")]
mod gzip_codec {
    use std::io::{Read, Write};

    use flate2::{read, write};

    use super::Codec;
    use crate::errors::Result;

    pub struct GZipCodec {}

    impl GZipCodec {
        pub(crate) fn new() -> Self {
            Self {}
        }
    }

    impl Codec for GZipCodec {
        fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
            let mut encoder = write::GzEncoder::new(output, flate2::Compression::default());
            encoder.write_all(input)?;
            encoder.try_finish()?;
            Ok(())
        }

        fn decompress(
            &mut self,
            input: &[u8],
            output: &mut Vec<u8>,
            _uncompress_size: Option<usize>,
        ) -> Result<usize> {
            let mut decoder = read::GzDecoder::new(input);
            Ok(decoder.read_to_end(output)?)
        }
    }
}
#[cfg(feature = "flate2")]
use gzip_codec::GZipCodec;

#[cfg(feature = "zstd")]
mod zstd_codec {
    use std::io::Write;

    use super::Codec;
    use crate::errors::Result;

    pub struct ZstdCodec {}

    impl ZstdCodec {
        pub(crate) fn new() -> Self {
            Self {}
        }
    }

    impl Codec for ZstdCodec {
        fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
            let mut encoder = zstd::Encoder::new(output, zstd::DEFAULT_COMPRESSION_LEVEL)?;
            encoder.write_all(input)?;
            encoder.finish()?;
            Ok(())
        }

        fn decompress(
            &mut self,
            input: &[u8],
            output: &mut Vec<u8>,
            uncompress_size: Option<usize>,
        ) -> Result<usize> {
            if let Some(size) = uncompress_size {
                output.reserve(size);
            }
            let mut decoder = zstd::Decoder::new(input)?;
            let n = std::io::copy(&mut decoder, output)?;
            Ok(n as usize)
        }
    }
}
#[cfg(feature = "zstd")]
use zstd_codec::ZstdCodec;
