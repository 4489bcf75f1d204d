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

//! End to end write/read tests over the full format.

use std::io::Write;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::NaiveDate;

use columnfile::basic::{Compression, LogicalType, PhysicalType, Repetition};
use columnfile::data_type::Value;
use columnfile::errors::Result;
use columnfile::file::metadata::KeyValue;
use columnfile::file::properties::{WriterProperties, WriterPropertiesPtr};
use columnfile::file::reader::{ChunkReader, Length, SerializedFileReader};
use columnfile::file::writer::SerializedFileWriter;
use columnfile::record::{Field, Row};
use columnfile::schema::types::{Column, SchemaDescPtr, SchemaDescriptor};

fn nested_schema() -> SchemaDescPtr {
    Arc::new(
        SchemaDescriptor::new(vec![
            Column::plain("id", Repetition::REQUIRED, PhysicalType::INT64),
            Column::group(
                "user",
                Repetition::OPTIONAL,
                vec![
                    Column::string("name", Repetition::OPTIONAL),
                    Column::list(
                        "scores",
                        Repetition::OPTIONAL,
                        Column::plain("element", Repetition::REQUIRED, PhysicalType::INT32),
                    ),
                ],
            ),
            Column::map(
                "metrics",
                Repetition::OPTIONAL,
                Column::string("key", Repetition::REQUIRED),
                Column::plain("value", Repetition::OPTIONAL, PhysicalType::DOUBLE),
            )
            .unwrap(),
        ])
        .unwrap(),
    )
}

fn nested_rows(n: i64) -> Vec<Row> {
    (0..n)
        .map(|i| {
            let user = match i % 4 {
                0 => Field::Group(Row::new(vec![
                    ("name".to_string(), Field::Str(format!("user{i}"))),
                    (
                        "scores".to_string(),
                        Field::List(
                            (0..(i % 5)).map(|s| Field::Int(s as i32)).collect(),
                        ),
                    ),
                ])),
                1 => Field::Null,
                2 => Field::Group(Row::new(vec![
                    ("name".to_string(), Field::Null),
                    ("scores".to_string(), Field::List(vec![])),
                ])),
                _ => Field::Group(Row::new(vec![
                    ("name".to_string(), Field::Str(format!("u{i}"))),
                    ("scores".to_string(), Field::Null),
                ])),
            };
            let metrics = match i % 3 {
                0 => Field::Map(vec![
                    (Field::Str("cpu".to_string()), Field::Double(i as f64 / 2.0)),
                    (Field::Str("mem".to_string()), Field::Null),
                ]),
                1 => Field::Null,
                _ => Field::Map(vec![]),
            };
            Row::new(vec![
                ("id".to_string(), Field::Long(i)),
                ("user".to_string(), user),
                ("metrics".to_string(), metrics),
            ])
        })
        .collect()
}

fn write_file(
    schema: SchemaDescPtr,
    props: WriterPropertiesPtr,
    rows: &[Row],
) -> Result<Bytes> {
    let mut writer = SerializedFileWriter::new(Vec::new(), schema, props)?;
    for row in rows {
        writer.append_row(row)?;
    }
    writer.finish()?;
    Ok(writer.into_inner()?.into())
}

fn read_all(bytes: Bytes) -> Result<Vec<Row>> {
    SerializedFileReader::new(bytes)?.rows()?.collect()
}

#[test]
fn nested_roundtrip() {
    let rows = nested_rows(100);
    let bytes = write_file(
        nested_schema(),
        Arc::new(WriterProperties::default()),
        &rows,
    )
    .unwrap();
    assert_eq!(read_all(bytes).unwrap(), rows);
}

#[test]
fn roundtrip_across_row_groups_and_pages() {
    let rows = nested_rows(200);
    let props = WriterProperties::builder()
        .set_max_row_group_size(37)
        .set_data_page_value_count_limit(16)
        .build();
    let bytes = write_file(nested_schema(), Arc::new(props), &rows).unwrap();

    let reader = SerializedFileReader::new(bytes.clone()).unwrap();
    assert_eq!(reader.metadata().row_groups().len(), 6);
    assert_eq!(reader.num_rows(), 200);
    drop(reader);

    assert_eq!(read_all(bytes).unwrap(), rows);
}

#[test]
fn roundtrip_all_compressions() {
    let rows = nested_rows(64);
    for compression in [
        Compression::UNCOMPRESSED,
        Compression::SNAPPY,
        Compression::GZIP,
        Compression::ZSTD,
    ] {
        let props = WriterProperties::builder()
            .set_compression(compression)
            .build();
        let bytes = write_file(nested_schema(), Arc::new(props), &rows).unwrap();
        let reader = SerializedFileReader::new(bytes.clone()).unwrap();
        assert_eq!(
            reader.metadata().row_groups()[0].column(0).compression(),
            compression
        );
        drop(reader);
        assert_eq!(read_all(bytes).unwrap(), rows, "codec {compression}");
    }
}

#[test]
fn roundtrip_without_dictionary() {
    let rows = nested_rows(50);
    let props = WriterProperties::builder()
        .set_dictionary_enabled(false)
        .build();
    let bytes = write_file(nested_schema(), Arc::new(props), &rows).unwrap();
    let reader = SerializedFileReader::new(bytes.clone()).unwrap();
    for chunk in reader.metadata().row_groups()[0].columns() {
        assert_eq!(chunk.dictionary_page_offset(), None);
    }
    drop(reader);
    assert_eq!(read_all(bytes).unwrap(), rows);
}

#[test]
fn logical_types_roundtrip() {
    let schema = Arc::new(
        SchemaDescriptor::new(vec![
            Column::primitive(
                "day",
                Repetition::REQUIRED,
                PhysicalType::INT32,
                LogicalType::Date,
            )
            .unwrap(),
            Column::primitive(
                "at",
                Repetition::OPTIONAL,
                PhysicalType::INT64,
                LogicalType::TimestampMicros,
            )
            .unwrap(),
            Column::primitive(
                "price",
                Repetition::REQUIRED,
                PhysicalType::INT64,
                LogicalType::Decimal {
                    precision: 10,
                    scale: 2,
                },
            )
            .unwrap(),
        ])
        .unwrap(),
    );
    let rows = vec![
        Row::new(vec![
            (
                "day".to_string(),
                Field::from_date(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()),
            ),
            ("at".to_string(), Field::TimestampMicros(1_715_900_000_000_000)),
            (
                "price".to_string(),
                Field::Decimal {
                    unscaled: 123_456,
                    precision: 10,
                    scale: 2,
                },
            ),
        ]),
        Row::new(vec![
            ("day".to_string(), Field::Date(0)),
            ("at".to_string(), Field::Null),
            (
                "price".to_string(),
                Field::Decimal {
                    unscaled: -50,
                    precision: 10,
                    scale: 2,
                },
            ),
        ]),
    ];
    let bytes = write_file(schema, Arc::new(WriterProperties::default()), &rows).unwrap();
    assert_eq!(read_all(bytes).unwrap(), rows);
}

#[test]
fn zero_row_file_roundtrip() {
    let bytes = write_file(
        nested_schema(),
        Arc::new(WriterProperties::default()),
        &[],
    )
    .unwrap();
    let mut reader = SerializedFileReader::new(bytes).unwrap();
    assert_eq!(reader.num_rows(), 0);
    assert_eq!(reader.metadata().row_groups().len(), 0);
    assert_eq!(reader.rows().unwrap().count(), 0);
}

#[test]
fn footer_statistics_reflect_data() {
    let schema = Arc::new(
        SchemaDescriptor::new(vec![
            Column::plain("v", Repetition::OPTIONAL, PhysicalType::INT64),
            Column::string("s", Repetition::OPTIONAL),
        ])
        .unwrap(),
    );
    let rows: Vec<Row> = (0..20i64)
        .map(|i| {
            Row::new(vec![
                (
                    "v".to_string(),
                    if i % 4 == 0 {
                        Field::Null
                    } else {
                        Field::Long(i * 3 - 10)
                    },
                ),
                ("s".to_string(), Field::Str(format!("k{}", i % 5))),
            ])
        })
        .collect();
    let bytes = write_file(schema, Arc::new(WriterProperties::default()), &rows).unwrap();
    let reader = SerializedFileReader::new(bytes).unwrap();
    let rg = &reader.metadata().row_groups()[0];

    let v_stats = rg.column(0).statistics();
    assert_eq!(v_stats.null_count, 5);
    assert_eq!(v_stats.min, Some(Value::Int64(-7)));
    assert_eq!(v_stats.max, Some(Value::Int64(47)));
    assert_eq!(v_stats.distinct_count, Some(15));

    let s_stats = rg.column(1).statistics();
    assert_eq!(s_stats.null_count, 0);
    assert_eq!(s_stats.distinct_count, Some(5));
    assert_eq!(s_stats.min, Some(Value::ByteArray(Bytes::from_static(b"k0"))));
    assert_eq!(s_stats.max, Some(Value::ByteArray(Bytes::from_static(b"k4"))));
}

#[test]
fn key_value_metadata_roundtrip() {
    let props = WriterProperties::builder()
        .set_created_by("roundtrip test suite")
        .set_key_value_metadata(Some(vec![KeyValue::new("source", "unit-test")]))
        .build();
    let bytes = write_file(nested_schema(), Arc::new(props), &nested_rows(3)).unwrap();
    let reader = SerializedFileReader::new(bytes).unwrap();
    assert_eq!(reader.metadata().created_by(), Some("roundtrip test suite"));
    assert_eq!(
        reader.metadata().key_value_metadata(),
        Some(&vec![KeyValue::new("source", "unit-test")])
    );
}

#[test]
fn row_group_selection() {
    let rows = nested_rows(90);
    let props = WriterProperties::builder().set_max_row_group_size(30).build();
    let bytes = write_file(nested_schema(), Arc::new(props), &rows).unwrap();

    let mut reader = SerializedFileReader::new(bytes).unwrap();
    reader.select_row_groups(&[2, 0]).unwrap();
    let read: Vec<Row> = reader.rows().unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(read.len(), 60);
    // groups stream in the order selected
    assert_eq!(read[..30], rows[60..90]);
    assert_eq!(read[30..], rows[0..30]);
}

/// A [`ChunkReader`] that records every byte range fetched, for asserting
/// projection pruning.
struct RangeRecordingReader {
    inner: Bytes,
    reads: Mutex<Vec<(u64, usize)>>,
}

impl RangeRecordingReader {
    fn new(inner: Bytes) -> Self {
        Self {
            inner,
            reads: Mutex::new(Vec::new()),
        }
    }
}

impl Length for RangeRecordingReader {
    fn len(&self) -> u64 {
        Length::len(&self.inner)
    }
}

impl ChunkReader for RangeRecordingReader {
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        self.reads.lock().unwrap().push((start, length));
        self.inner.get_bytes(start, length)
    }
}

#[test]
fn projection_skips_unselected_chunks() {
    let rows = nested_rows(80);
    let bytes = write_file(
        nested_schema(),
        Arc::new(WriterProperties::default()),
        &rows,
    )
    .unwrap();

    let meta_reader = SerializedFileReader::new(bytes.clone()).unwrap();
    let excluded: Vec<(u64, u64)> = {
        let schema = meta_reader.schema().clone();
        let (id_start, id_end) = schema.leaf_range(0);
        meta_reader.metadata().row_groups()[0]
            .columns()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i < id_start || *i >= id_end)
            .map(|(_, c)| (c.file_offset(), c.file_offset() + c.compressed_size()))
            .collect()
    };
    drop(meta_reader);

    let recording = Arc::new(RangeRecordingReader::new(bytes));

    struct SharedReader(Arc<RangeRecordingReader>);
    impl Length for SharedReader {
        fn len(&self) -> u64 {
            Length::len(&*self.0)
        }
    }
    impl ChunkReader for SharedReader {
        fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
            self.0.get_bytes(start, length)
        }
    }

    let mut reader = SerializedFileReader::new(SharedReader(recording.clone())).unwrap();
    reader.select_columns(&["id"]).unwrap();
    let read: Vec<Row> = reader.rows().unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(read.len(), 80);
    assert_eq!(read[5].len(), 1);
    assert_eq!(read[5].get("id"), Some(&Field::Long(5)));
    assert_eq!(read[5].get("user"), None);

    assert!(!excluded.is_empty());
    let reads = recording.reads.lock().unwrap();
    for (start, len) in reads.iter() {
        let end = start + *len as u64;
        for (ex_start, ex_end) in &excluded {
            assert!(
                end <= *ex_start || *start >= *ex_end,
                "read {start}..{end} overlaps unselected chunk {ex_start}..{ex_end}"
            );
        }
    }
}

#[test]
fn on_disk_roundtrip_through_a_real_file() {
    let rows = nested_rows(40);
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let bytes = write_file(nested_schema(), Arc::new(props), &rows).unwrap();

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&bytes).unwrap();
    tmp.flush().unwrap();

    let file = tmp.reopen().unwrap();
    let mut reader = SerializedFileReader::new(file).unwrap();
    let read: Vec<Row> = reader.rows().unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(read, rows);
}

#[test]
fn mixed_encoding_chunks_roundtrip() {
    // low cardinality early, high cardinality later: the dictionary freezes
    // mid-chunk and the file mixes page encodings
    let schema = Arc::new(
        SchemaDescriptor::new(vec![Column::string("s", Repetition::REQUIRED)]).unwrap(),
    );
    let props = WriterProperties::builder()
        .set_data_page_value_count_limit(8)
        .set_dictionary_page_size_limit(64)
        .set_dictionary_ratio_limit(1.0)
        .build();
    let rows: Vec<Row> = (0..64)
        .map(|i| {
            Row::new(vec![(
                "s".to_string(),
                Field::Str(format!("key-{:04}", i / 2)),
            )])
        })
        .collect();
    let bytes = write_file(schema, Arc::new(props), &rows).unwrap();
    assert_eq!(read_all(bytes).unwrap(), rows);
}
