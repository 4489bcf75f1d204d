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

//! File level APIs: writer, reader, footer metadata, statistics and writer
//! properties.
//!
//! The file layout is footer-last:
//!
//! ```text
//! [magic][row group 0][row group 1]...[footer][footer_len: u32 LE][magic]
//! ```
//!
//! so a file can be written in one forward pass and opened by reading the
//! trailing 8 bytes first.

pub mod metadata;
pub mod properties;
pub mod reader;
pub mod statistics;
pub mod writer;

/// Magic bytes at the start and end of every file.
pub const MAGIC: [u8; 4] = *b"COF1";

/// Current format version, stored in the footer.
pub const FORMAT_VERSION: u32 = 1;

/// Size of the trailer: footer length plus closing magic.
pub const FOOTER_TRAILER_SIZE: usize = 8;
