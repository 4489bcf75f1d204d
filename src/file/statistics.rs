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

//! Per-chunk statistics: null count, min/max and an exact distinct count up
//! to a configurable limit.
//!
//! Ordering rules: absent (`None`) sorts below every present value, signed
//! integers and floats compare numerically, booleans order `false < true`,
//! byte arrays compare lexicographically by unsigned byte, and `NaN` never
//! enters min/max. Accumulation is order independent, so the same values in
//! any order produce the same statistics.

use std::collections::HashSet;

use crate::data_type::Value;
use crate::errors::{ColumnFileError, Result};

/// Returns whether `left > right` under the statistics ordering. `None` is
/// smaller than any present value.
pub fn is_greater_than(left: Option<&Value>, right: Option<&Value>) -> Result<bool> {
    compare(left, right).map(|ord| ord == std::cmp::Ordering::Greater)
}

/// Returns whether `left < right` under the statistics ordering.
pub fn is_less_than(left: Option<&Value>, right: Option<&Value>) -> Result<bool> {
    compare(left, right).map(|ord| ord == std::cmp::Ordering::Less)
}

fn compare(left: Option<&Value>, right: Option<&Value>) -> Result<std::cmp::Ordering> {
    use std::cmp::Ordering;
    let (left, right) = match (left, right) {
        (None, None) => return Ok(Ordering::Equal),
        (None, Some(_)) => return Ok(Ordering::Less),
        (Some(_), None) => return Ok(Ordering::Greater),
        (Some(l), Some(r)) => (l, r),
    };
    match (left, right) {
        (Value::Bool(l), Value::Bool(r)) => Ok(l.cmp(r)),
        (Value::Int32(l), Value::Int32(r)) => Ok(l.cmp(r)),
        (Value::Int64(l), Value::Int64(r)) => Ok(l.cmp(r)),
        (Value::Float(l), Value::Float(r)) => l
            .partial_cmp(r)
            .ok_or_else(|| general_err!("cannot order NaN")),
        (Value::Double(l), Value::Double(r)) => l
            .partial_cmp(r)
            .ok_or_else(|| general_err!("cannot order NaN")),
        (Value::ByteArray(l), Value::ByteArray(r)) => Ok(l.as_ref().cmp(r.as_ref())),
        (l, r) => Err(ColumnFileError::IncomparableTypes {
            left: l.type_name(),
            right: r.type_name(),
        }),
    }
}

/// The statistics snapshot stored in the footer for one column chunk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnStatistics {
    /// Number of null slots among the chunk's logical values.
    pub null_count: u64,
    /// Smallest non-null value, absent when every value was null or `NaN`.
    pub min: Option<Value>,
    /// Largest non-null value, absent when every value was null or `NaN`.
    pub max: Option<Value>,
    /// Exact distinct non-null count, absent once the tracking limit was
    /// exceeded.
    pub distinct_count: Option<u64>,
}

/// Accumulates statistics while a chunk is written.
#[derive(Debug)]
pub struct StatisticsBuilder {
    null_count: u64,
    min: Option<Value>,
    max: Option<Value>,
    /// Distinct values keyed by canonical bytes; `None` once the limit was
    /// exceeded and the count became unknown.
    distinct: Option<HashSet<Vec<u8>>>,
    distinct_limit: usize,
}

impl StatisticsBuilder {
    /// Creates a builder tracking exact distinct counts up to
    /// `distinct_limit` values.
    pub fn new(distinct_limit: usize) -> Self {
        Self {
            null_count: 0,
            min: None,
            max: None,
            distinct: Some(HashSet::new()),
            distinct_limit,
        }
    }

    pub fn update_null(&mut self) {
        self.null_count += 1;
    }

    pub fn update(&mut self, value: &Value) -> Result<()> {
        let skip_ordering = match value {
            Value::Float(v) => v.is_nan(),
            Value::Double(v) => v.is_nan(),
            _ => false,
        };
        if !skip_ordering {
            if is_less_than(Some(value), self.min.as_ref())? || self.min.is_none() {
                self.min = Some(value.clone());
            }
            if is_greater_than(Some(value), self.max.as_ref())? {
                self.max = Some(value.clone());
            }
        }

        if let Some(distinct) = self.distinct.as_mut() {
            let mut key = Vec::new();
            value.write_key(&mut key);
            distinct.insert(key);
            if distinct.len() > self.distinct_limit {
                self.distinct = None;
            }
        }
        Ok(())
    }

    pub fn null_count(&self) -> u64 {
        self.null_count
    }

    pub fn build(self) -> ColumnStatistics {
        ColumnStatistics {
            null_count: self.null_count,
            min: self.min,
            max: self.max,
            distinct_count: self.distinct.map(|d| d.len() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_none_sorts_below_everything() {
        assert!(is_greater_than(Some(&Value::Int32(i32::MIN)), None).unwrap());
        assert!(is_less_than(None, Some(&Value::Int32(i32::MIN))).unwrap());
        assert!(!is_greater_than(None, None).unwrap());
        assert!(!is_less_than(None, None).unwrap());
    }

    #[test]
    fn test_byte_arrays_compare_unsigned() {
        let a = Value::ByteArray(Bytes::from_static(&[0x7F]));
        let b = Value::ByteArray(Bytes::from_static(&[0x80]));
        assert!(is_less_than(Some(&a), Some(&b)).unwrap());

        let prefix = Value::ByteArray(Bytes::from_static(b"ab"));
        let longer = Value::ByteArray(Bytes::from_static(b"abc"));
        assert!(is_less_than(Some(&prefix), Some(&longer)).unwrap());
    }

    #[test]
    fn test_mixed_types_rejected() {
        let err = is_less_than(Some(&Value::Int32(1)), Some(&Value::Int64(1))).unwrap_err();
        assert!(matches!(
            err,
            ColumnFileError::IncomparableTypes {
                left: "INT32",
                right: "INT64"
            }
        ));
    }

    #[test]
    fn test_accumulation() {
        let mut builder = StatisticsBuilder::new(1024);
        for v in [5i64, -3, 12, 5, 0] {
            builder.update(&Value::Int64(v)).unwrap();
        }
        builder.update_null();
        builder.update_null();
        let stats = builder.build();
        assert_eq!(stats.null_count, 2);
        assert_eq!(stats.min, Some(Value::Int64(-3)));
        assert_eq!(stats.max, Some(Value::Int64(12)));
        assert_eq!(stats.distinct_count, Some(4));
    }

    #[test]
    fn test_order_independence() {
        let values = [3i32, 1, 4, 1, 5, 9, 2, 6];
        let mut forward = StatisticsBuilder::new(1024);
        for v in values {
            forward.update(&Value::Int32(v)).unwrap();
        }
        let mut reverse = StatisticsBuilder::new(1024);
        for v in values.iter().rev() {
            reverse.update(&Value::Int32(*v)).unwrap();
        }
        assert_eq!(forward.build(), reverse.build());
    }

    #[test]
    fn test_nan_excluded_from_min_max() {
        let mut builder = StatisticsBuilder::new(1024);
        builder.update(&Value::Double(f64::NAN)).unwrap();
        builder.update(&Value::Double(2.5)).unwrap();
        builder.update(&Value::Double(f64::NAN)).unwrap();
        let stats = builder.build();
        assert_eq!(stats.min, Some(Value::Double(2.5)));
        assert_eq!(stats.max, Some(Value::Double(2.5)));

        let mut builder = StatisticsBuilder::new(1024);
        builder.update(&Value::Double(f64::NAN)).unwrap();
        let stats = builder.build();
        assert_eq!(stats.min, None);
        assert_eq!(stats.max, None);
    }

    #[test]
    fn test_distinct_limit() {
        let mut builder = StatisticsBuilder::new(3);
        for v in 0..3 {
            builder.update(&Value::Int32(v)).unwrap();
        }
        for v in 0..3 {
            builder.update(&Value::Int32(v)).unwrap();
        }
        // still within the limit, repeats do not count
        let stats = builder.build();
        assert_eq!(stats.distinct_count, Some(3));

        let mut builder = StatisticsBuilder::new(3);
        for v in 0..4 {
            builder.update(&Value::Int32(v)).unwrap();
        }
        assert_eq!(builder.build().distinct_count, None);
    }
}
