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

//! Writer configuration.
//!
//! # Usage
//!
//! ```
//! use columnfile::basic::Compression;
//! use columnfile::file::properties::WriterProperties;
//!
//! let props = WriterProperties::builder()
//!     .set_compression(Compression::SNAPPY)
//!     .set_data_page_value_count_limit(10_000)
//!     .build();
//! assert_eq!(props.compression(), Compression::SNAPPY);
//! ```

use std::sync::Arc;

use crate::basic::Compression;
use crate::file::metadata::KeyValue;

/// Default data page size threshold in bytes.
pub const DEFAULT_DATA_PAGE_SIZE_LIMIT: usize = 1024 * 1024;
/// Default cap on level slots per data page.
pub const DEFAULT_DATA_PAGE_VALUE_COUNT_LIMIT: usize = 20_000;
/// Default dictionary page size threshold in bytes.
pub const DEFAULT_DICTIONARY_PAGE_SIZE_LIMIT: usize = 1024 * 1024;
/// Default ratio of distinct to total values above which dictionary
/// encoding is abandoned for a chunk.
pub const DEFAULT_DICTIONARY_RATIO_LIMIT: f64 = 0.75;
/// Default number of rows after which a row group is flushed.
pub const DEFAULT_MAX_ROW_GROUP_SIZE: usize = 1024 * 1024;
/// Default cap on exactly tracked distinct values per chunk.
pub const DEFAULT_STATISTICS_DISTINCT_LIMIT: usize = 1024;

/// Reference-counted writer properties, shared across column writers.
pub type WriterPropertiesPtr = Arc<WriterProperties>;

/// Immutable writer settings, created through [`WriterProperties::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct WriterProperties {
    data_page_size_limit: usize,
    data_page_value_count_limit: usize,
    dictionary_enabled: bool,
    dictionary_page_size_limit: usize,
    dictionary_ratio_limit: f64,
    compression: Compression,
    max_row_group_size: usize,
    statistics_distinct_limit: usize,
    created_by: Option<String>,
    key_value_metadata: Option<Vec<KeyValue>>,
}

impl Default for WriterProperties {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WriterProperties {
    /// Returns a builder with all defaults.
    pub fn builder() -> WriterPropertiesBuilder {
        WriterPropertiesBuilder::new()
    }

    /// Byte size at which a buffered data page is flushed.
    pub fn data_page_size_limit(&self) -> usize {
        self.data_page_size_limit
    }

    /// Level slot count at which a buffered data page is flushed.
    pub fn data_page_value_count_limit(&self) -> usize {
        self.data_page_value_count_limit
    }

    /// Whether chunks start out dictionary encoded.
    pub fn dictionary_enabled(&self) -> bool {
        self.dictionary_enabled
    }

    /// Dictionary size in bytes beyond which later pages fall back to PLAIN.
    pub fn dictionary_page_size_limit(&self) -> usize {
        self.dictionary_page_size_limit
    }

    /// Distinct-to-total ratio above which the first page flush abandons
    /// dictionary encoding for the chunk.
    pub fn dictionary_ratio_limit(&self) -> f64 {
        self.dictionary_ratio_limit
    }

    /// Page compression codec.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Rows after which an open row group is flushed automatically.
    pub fn max_row_group_size(&self) -> usize {
        self.max_row_group_size
    }

    /// Cap on exactly tracked distinct values per chunk.
    pub fn statistics_distinct_limit(&self) -> usize {
        self.statistics_distinct_limit
    }

    /// Writer identification string stored in the footer.
    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    /// Application key/value metadata stored in the footer.
    pub fn key_value_metadata(&self) -> Option<&Vec<KeyValue>> {
        self.key_value_metadata.as_ref()
    }
}

/// Builder for [`WriterProperties`].
pub struct WriterPropertiesBuilder {
    props: WriterProperties,
}

impl WriterPropertiesBuilder {
    fn new() -> Self {
        Self {
            props: WriterProperties {
                data_page_size_limit: DEFAULT_DATA_PAGE_SIZE_LIMIT,
                data_page_value_count_limit: DEFAULT_DATA_PAGE_VALUE_COUNT_LIMIT,
                dictionary_enabled: true,
                dictionary_page_size_limit: DEFAULT_DICTIONARY_PAGE_SIZE_LIMIT,
                dictionary_ratio_limit: DEFAULT_DICTIONARY_RATIO_LIMIT,
                compression: Compression::UNCOMPRESSED,
                max_row_group_size: DEFAULT_MAX_ROW_GROUP_SIZE,
                statistics_distinct_limit: DEFAULT_STATISTICS_DISTINCT_LIMIT,
                created_by: None,
                key_value_metadata: None,
            },
        }
    }

    pub fn build(self) -> WriterProperties {
        self.props
    }

    pub fn set_data_page_size_limit(mut self, limit: usize) -> Self {
        self.props.data_page_size_limit = limit;
        self
    }

    pub fn set_data_page_value_count_limit(mut self, limit: usize) -> Self {
        self.props.data_page_value_count_limit = limit;
        self
    }

    pub fn set_dictionary_enabled(mut self, enabled: bool) -> Self {
        self.props.dictionary_enabled = enabled;
        self
    }

    pub fn set_dictionary_page_size_limit(mut self, limit: usize) -> Self {
        self.props.dictionary_page_size_limit = limit;
        self
    }

    /// `ratio` is clamped to `[0.0, 1.0]`.
    pub fn set_dictionary_ratio_limit(mut self, ratio: f64) -> Self {
        self.props.dictionary_ratio_limit = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn set_compression(mut self, compression: Compression) -> Self {
        self.props.compression = compression;
        self
    }

    pub fn set_max_row_group_size(mut self, size: usize) -> Self {
        assert!(size > 0, "row group size must be greater than 0");
        self.props.max_row_group_size = size;
        self
    }

    pub fn set_statistics_distinct_limit(mut self, limit: usize) -> Self {
        self.props.statistics_distinct_limit = limit;
        self
    }

    pub fn set_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.props.created_by = Some(created_by.into());
        self
    }

    pub fn set_key_value_metadata(mut self, metadata: Option<Vec<KeyValue>>) -> Self {
        self.props.key_value_metadata = metadata;
        self
    }
}
