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

//! The nested row model consumed by the writer and produced by the reader.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};

/// A nested row: an ordered list of named fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, Field)>,
}

impl Row {
    /// Creates a row from named fields.
    pub fn new(fields: Vec<(String, Field)>) -> Self {
        Self { fields }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field by name, `None` when absent. An absent field and an explicit
    /// [`Field::Null`] shred identically.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find_map(|(n, f)| (n == name).then_some(f))
    }

    /// Iterator over `(name, field)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }
}

impl From<Vec<(String, Field)>> for Row {
    fn from(fields: Vec<(String, Field)>) -> Self {
        Self::new(fields)
    }
}

/// A typed value within a [`Row`].
///
/// Temporal variants hold epoch-based integers, normalized at construction
/// so statistics comparison is a plain integer comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A null value; which levels it is null at is determined structurally
    /// by the schema during shredding.
    Null,
    /// A boolean.
    Bool(bool),
    /// A 32-bit signed integer.
    Int(i32),
    /// A 64-bit signed integer.
    Long(i64),
    /// A 32-bit float.
    Float(f32),
    /// A 64-bit float.
    Double(f64),
    /// A UTF-8 string.
    Str(String),
    /// Raw bytes.
    Bytes(Bytes),
    /// Days since the Unix epoch.
    Date(i32),
    /// Microseconds since midnight.
    TimeMicros(i64),
    /// Microseconds since the Unix epoch.
    TimestampMicros(i64),
    /// Fixed-point decimal: unscaled value with precision and scale.
    Decimal {
        /// Unscaled integer value, e.g. `1234` for `12.34` at scale 2.
        unscaled: i64,
        /// Total number of digits.
        precision: u8,
        /// Digits to the right of the decimal point.
        scale: u8,
    },
    /// A nested struct.
    Group(Row),
    /// A list of elements.
    List(Vec<Field>),
    /// Ordered key/value pairs.
    Map(Vec<(Field, Field)>),
}

impl Field {
    /// Builds a [`Field::Date`] from a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid epoch");
        Field::Date((date - epoch).num_days() as i32)
    }

    /// Builds a [`Field::TimestampMicros`] from a UTC timestamp.
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        Field::TimestampMicros(ts.timestamp_micros())
    }

    /// Builds a [`Field::TimeMicros`] from a time of day.
    pub fn from_time(time: NaiveTime) -> Self {
        let micros =
            i64::from(time.num_seconds_from_midnight()) * 1_000_000 + i64::from(time.nanosecond()) / 1_000;
        Field::TimeMicros(micros)
    }

    /// Whether this field is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Field::Null => "null",
            Field::Bool(_) => "bool",
            Field::Int(_) => "int",
            Field::Long(_) => "long",
            Field::Float(_) => "float",
            Field::Double(_) => "double",
            Field::Str(_) => "string",
            Field::Bytes(_) => "bytes",
            Field::Date(_) => "date",
            Field::TimeMicros(_) => "time",
            Field::TimestampMicros(_) => "timestamp",
            Field::Decimal { .. } => "decimal",
            Field::Group(_) => "group",
            Field::List(_) => "list",
            Field::Map(_) => "map",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Null => write!(f, "null"),
            Field::Bool(v) => write!(f, "{v}"),
            Field::Int(v) => write!(f, "{v}"),
            Field::Long(v) => write!(f, "{v}"),
            Field::Float(v) => write!(f, "{v}"),
            Field::Double(v) => write!(f, "{v}"),
            Field::Str(v) => write!(f, "{v:?}"),
            Field::Bytes(v) => write!(f, "{v:?}"),
            Field::Date(v) => write!(f, "date({v})"),
            Field::TimeMicros(v) => write!(f, "time({v})"),
            Field::TimestampMicros(v) => write!(f, "timestamp({v})"),
            Field::Decimal {
                unscaled,
                precision,
                scale,
            } => write!(f, "decimal({unscaled}, {precision}, {scale})"),
            Field::Group(row) => {
                write!(f, "{{")?;
                for (i, (name, field)) in row.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {field}")?;
                }
                write!(f, "}}")
            }
            Field::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Field::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k} -> {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
