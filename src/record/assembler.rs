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

//! Record assembly: the inverse of shredding. Reconstructs one nested
//! [`Row`] at a time from per-leaf triple buffers, using definition levels
//! to place nulls and repetition levels to group list and map entries.

use crate::basic::{LogicalType, PhysicalType};
use crate::column::reader::TripleBuffer;
use crate::data_type::Value;
use crate::errors::Result;
use crate::record::row::{Field, Row};
use crate::schema::types::{Column, ColumnKind, SchemaDescriptor};

/// Assembles the next row from `buffers`, which hold one [`TripleBuffer`]
/// per schema leaf in leaf order. Each call consumes exactly one row's
/// slots from every buffer.
pub fn assemble_row(schema: &SchemaDescriptor, buffers: &mut [TripleBuffer]) -> Result<Row> {
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut leaf_start = 0;
    for column in schema.fields() {
        let field = assemble(column, 0, 0, leaf_start, buffers)?;
        fields.push((column.name().to_string(), field));
        leaf_start += column.num_leaves();
    }
    Ok(Row::new(fields))
}

/// Assembles one logical slot of `column`.
///
/// `parent_def` is the definition level reached when every ancestor is
/// present; `rep_depth` counts repeated ancestors.
fn assemble(
    column: &Column,
    parent_def: i16,
    rep_depth: i16,
    leaf_start: usize,
    buffers: &mut [TripleBuffer],
) -> Result<Field> {
    let self_def = parent_def + i16::from(column.is_optional());

    match column.kind() {
        ColumnKind::Primitive { physical, logical } => {
            let (value, _def, _rep) = next_slot(column, leaf_start, buffers)?;
            match value {
                Some(v) => value_to_field(v, *physical, *logical, column.name()),
                None => Ok(Field::Null),
            }
        }
        ColumnKind::Struct(children) => {
            let d = peek_def(column, leaf_start, buffers)?;
            if column.is_optional() && d < self_def {
                consume_null_slots(column, leaf_start, buffers)?;
                return Ok(Field::Null);
            }
            let mut fields = Vec::with_capacity(children.len());
            let mut child_start = leaf_start;
            for child in children {
                let field = assemble(child, self_def, rep_depth, child_start, buffers)?;
                fields.push((child.name().to_string(), field));
                child_start += child.num_leaves();
            }
            Ok(Field::Group(Row::new(fields)))
        }
        ColumnKind::List(element) => {
            let d = peek_def(column, leaf_start, buffers)?;
            if d < self_def {
                consume_null_slots(column, leaf_start, buffers)?;
                return Ok(Field::Null);
            }
            if d == self_def {
                consume_null_slots(column, leaf_start, buffers)?;
                return Ok(Field::List(Vec::new()));
            }
            let own_rep = rep_depth + 1;
            let mut items = Vec::new();
            loop {
                items.push(assemble(element, self_def + 1, own_rep, leaf_start, buffers)?);
                // the next slot continues this list only at exactly our
                // repetition level; deeper levels were consumed above,
                // shallower ones belong to an ancestor or the next row
                match buffers[leaf_start].peek_rep() {
                    Some(rep) if rep == own_rep => {}
                    _ => break,
                }
            }
            Ok(Field::List(items))
        }
        ColumnKind::Map(key, value) => {
            let d = peek_def(column, leaf_start, buffers)?;
            if d < self_def {
                consume_null_slots(column, leaf_start, buffers)?;
                return Ok(Field::Null);
            }
            if d == self_def {
                consume_null_slots(column, leaf_start, buffers)?;
                return Ok(Field::Map(Vec::new()));
            }
            let own_rep = rep_depth + 1;
            let value_start = leaf_start + key.num_leaves();
            let mut entries = Vec::new();
            loop {
                let k = assemble(key, self_def + 1, own_rep, leaf_start, buffers)?;
                let v = assemble(value, self_def + 1, own_rep, value_start, buffers)?;
                entries.push((k, v));
                match buffers[leaf_start].peek_rep() {
                    Some(rep) if rep == own_rep => {}
                    _ => break,
                }
            }
            Ok(Field::Map(entries))
        }
    }
}

fn next_slot(
    column: &Column,
    leaf: usize,
    buffers: &mut [TripleBuffer],
) -> Result<(Option<Value>, i16, i16)> {
    buffers[leaf]
        .next()
        .ok_or_else(|| eof_err!("column '{}' ran out of slots mid-row", column.name()))
}

/// Definition level of the subtree's next slot, read from its first leaf.
/// All leaves of a subtree move in lockstep.
fn peek_def(column: &Column, leaf_start: usize, buffers: &[TripleBuffer]) -> Result<i16> {
    buffers[leaf_start]
        .peek_def()
        .ok_or_else(|| eof_err!("column '{}' ran out of slots mid-row", column.name()))
}

/// Consumes one slot from every leaf under `column`; used when the subtree
/// contributes no values to this row.
fn consume_null_slots(
    column: &Column,
    leaf_start: usize,
    buffers: &mut [TripleBuffer],
) -> Result<()> {
    for leaf in leaf_start..leaf_start + column.num_leaves() {
        buffers[leaf]
            .next()
            .ok_or_else(|| eof_err!("column '{}' ran out of slots mid-row", column.name()))?;
    }
    Ok(())
}

/// Converts a stored [`Value`] back to the [`Field`] its logical type
/// dictates.
fn value_to_field(
    value: Value,
    physical: PhysicalType,
    logical: LogicalType,
    name: &str,
) -> Result<Field> {
    let field = match (value, logical) {
        (Value::Bool(v), LogicalType::None) => Field::Bool(v),
        (Value::Int32(v), LogicalType::None) => Field::Int(v),
        (Value::Int64(v), LogicalType::None) => Field::Long(v),
        (Value::Float(v), LogicalType::None) => Field::Float(v),
        (Value::Double(v), LogicalType::None) => Field::Double(v),
        (Value::ByteArray(v), LogicalType::None) => Field::Bytes(v),
        (Value::ByteArray(v), LogicalType::String) => {
            let s = String::from_utf8(v.to_vec()).map_err(|_| {
                general_err!("column '{}' holds invalid UTF-8 in a string value", name)
            })?;
            Field::Str(s)
        }
        (Value::Int32(v), LogicalType::Date) => Field::Date(v),
        (Value::Int64(v), LogicalType::TimeMicros) => Field::TimeMicros(v),
        (Value::Int64(v), LogicalType::TimestampMicros) => Field::TimestampMicros(v),
        (Value::Int64(v), LogicalType::Decimal { precision, scale }) => Field::Decimal {
            unscaled: v,
            precision,
            scale,
        },
        (value, logical) => {
            return Err(general_err!(
                "column '{}' ({}, {}) holds a mismatched {} value",
                name,
                physical,
                logical,
                value.type_name()
            ))
        }
    };
    Ok(field)
}
