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

//! A self-describing, nested, binary columnar file format.
//!
//! Rows are shredded into flat leaf columns using repetition and definition
//! levels, encoded per column chunk (PLAIN or dictionary plus an
//! RLE/bit-packed hybrid for levels and indices), optionally compressed,
//! and laid out footer-last so a file is written in one forward pass and
//! opened by reading its tail.
//!
//! # Writing
//!
//! ```
//! use std::sync::Arc;
//! use columnfile::basic::{PhysicalType, Repetition};
//! use columnfile::file::properties::WriterProperties;
//! use columnfile::file::writer::SerializedFileWriter;
//! use columnfile::record::{Field, Row};
//! use columnfile::schema::types::{Column, SchemaDescriptor};
//!
//! # fn main() -> columnfile::errors::Result<()> {
//! let schema = Arc::new(SchemaDescriptor::new(vec![
//!     Column::plain("id", Repetition::REQUIRED, PhysicalType::INT64),
//!     Column::string("name", Repetition::OPTIONAL),
//! ])?);
//! let props = Arc::new(WriterProperties::default());
//! let mut writer = SerializedFileWriter::new(Vec::new(), schema, props)?;
//! writer.append_row(&Row::new(vec![
//!     ("id".to_string(), Field::Long(1)),
//!     ("name".to_string(), Field::Str("ada".to_string())),
//! ]))?;
//! writer.finish()?;
//! let file_bytes = writer.into_inner()?;
//! # let _ = file_bytes;
//! # Ok(())
//! # }
//! ```
//!
//! # Reading
//!
//! ```
//! # use std::sync::Arc;
//! # use columnfile::basic::{PhysicalType, Repetition};
//! # use columnfile::file::properties::WriterProperties;
//! # use columnfile::file::writer::SerializedFileWriter;
//! # use columnfile::record::{Field, Row};
//! # use columnfile::schema::types::{Column, SchemaDescriptor};
//! use bytes::Bytes;
//! use columnfile::file::reader::SerializedFileReader;
//!
//! # fn main() -> columnfile::errors::Result<()> {
//! # let schema = Arc::new(SchemaDescriptor::new(vec![
//! #     Column::plain("id", Repetition::REQUIRED, PhysicalType::INT64),
//! #     Column::string("name", Repetition::OPTIONAL),
//! # ])?);
//! # let mut writer = SerializedFileWriter::new(
//! #     Vec::new(), schema, Arc::new(WriterProperties::default()))?;
//! # writer.append_row(&Row::new(vec![
//! #     ("id".to_string(), Field::Long(1)),
//! #     ("name".to_string(), Field::Str("ada".to_string())),
//! # ]))?;
//! # writer.finish()?;
//! # let file_bytes: Bytes = writer.into_inner()?.into();
//! let mut reader = SerializedFileReader::new(file_bytes)?;
//! reader.select_columns(&["name"])?;
//! for row in reader.rows()? {
//!     println!("{:?}", row?.get("name"));
//! }
//! # Ok(())
//! # }
//! ```

#![allow(non_camel_case_types)]

#[macro_use]
pub mod errors;

pub mod basic;
pub mod column;
pub mod compression;
pub mod data_type;
pub mod encodings;
pub mod file;
pub mod record;
pub mod schema;
pub mod util;
