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

//! Record shredding: striping a nested [`Row`] into per-leaf
//! `(value, def_level, rep_level)` triples.
//!
//! The definition level counts how many optional or repeated ancestors of
//! the leaf are actually present; the repetition level says at which
//! repeated ancestor the current value starts a new entry (0 starts a new
//! row). Nulls are purely structural: a missing optional subtree emits one
//! slot per leaf beneath it at the level where presence stopped, and an
//! empty list or map emits slots one level higher than its entries would.

use crate::basic::{LogicalType, PhysicalType};
use crate::data_type::Value;
use crate::errors::{ColumnFileError, Result};
use crate::record::row::{Field, Row};
use crate::schema::types::{Column, ColumnKind, SchemaDescriptor};

/// One shredded slot of one leaf column.
pub type Triple = (Option<Value>, i16, i16);

/// Shreds `row` against `schema`, returning one triple list per leaf in
/// schema leaf order. Every leaf receives at least one slot per row.
pub fn shred_row(schema: &SchemaDescriptor, row: &Row) -> Result<Vec<Vec<Triple>>> {
    for (name, _) in row.iter() {
        if schema.field(name).is_none() {
            return Err(ColumnFileError::SchemaMismatch(format!(
                "row field '{name}' is not in the schema"
            )));
        }
    }

    let mut out: Vec<Vec<Triple>> = vec![Vec::new(); schema.num_leaves()];
    let mut leaf_start = 0;
    for column in schema.fields() {
        shred(column, row.get(column.name()), 0, 0, 0, leaf_start, &mut out)?;
        leaf_start += column.num_leaves();
    }
    Ok(out)
}

/// Recursively shreds `field` under `column`.
///
/// `def` counts defined optional/repeated ancestors so far, `rep` is the
/// repetition level this subtree starts at, and `rep_depth` counts repeated
/// ancestors so far. `leaf_start` indexes the first leaf of this subtree in
/// `out`.
fn shred(
    column: &Column,
    field: Option<&Field>,
    def: i16,
    rep: i16,
    rep_depth: i16,
    leaf_start: usize,
    out: &mut Vec<Vec<Triple>>,
) -> Result<()> {
    let present = matches!(field, Some(f) if !f.is_null());
    if !present {
        if !column.is_optional() {
            return Err(ColumnFileError::SchemaMismatch(format!(
                "required column '{}' is missing or null",
                column.name()
            )));
        }
        write_nulls(column, def, rep, leaf_start, out);
        return Ok(());
    }
    let field = field.expect("present");
    let def = def + i16::from(column.is_optional());

    match column.kind() {
        ColumnKind::Primitive { physical, logical } => {
            let value = field_to_value(field, *physical, *logical, column.name())?;
            out[leaf_start].push((Some(value), def, rep));
        }
        ColumnKind::Struct(children) => {
            let Field::Group(row) = field else {
                return Err(type_mismatch(column.name(), "a group", field));
            };
            for (name, _) in row.iter() {
                if children.iter().all(|c| c.name() != name) {
                    return Err(ColumnFileError::SchemaMismatch(format!(
                        "field '{name}' is not in group '{}'",
                        column.name()
                    )));
                }
            }
            let mut child_start = leaf_start;
            for child in children {
                shred(
                    child,
                    row.get(child.name()),
                    def,
                    rep,
                    rep_depth,
                    child_start,
                    out,
                )?;
                child_start += child.num_leaves();
            }
        }
        ColumnKind::List(element) => {
            let Field::List(items) = field else {
                return Err(type_mismatch(column.name(), "a list", field));
            };
            if items.is_empty() {
                // defined but empty: one slot per leaf at the list's level
                write_nulls_at(element, def, rep, leaf_start, out);
                return Ok(());
            }
            let own_rep = rep_depth + 1;
            for (i, item) in items.iter().enumerate() {
                let item_rep = if i == 0 { rep } else { own_rep };
                shred(
                    element,
                    Some(item),
                    def + 1,
                    item_rep,
                    own_rep,
                    leaf_start,
                    out,
                )?;
            }
        }
        ColumnKind::Map(key, value) => {
            let Field::Map(entries) = field else {
                return Err(type_mismatch(column.name(), "a map", field));
            };
            if entries.is_empty() {
                write_nulls_at(key, def, rep, leaf_start, out);
                write_nulls_at(value, def, rep, leaf_start + key.num_leaves(), out);
                return Ok(());
            }
            let own_rep = rep_depth + 1;
            for (i, (k, v)) in entries.iter().enumerate() {
                let entry_rep = if i == 0 { rep } else { own_rep };
                shred(key, Some(k), def + 1, entry_rep, own_rep, leaf_start, out)?;
                shred(
                    value,
                    Some(v),
                    def + 1,
                    entry_rep,
                    own_rep,
                    leaf_start + key.num_leaves(),
                    out,
                )?;
            }
        }
    }
    Ok(())
}

/// Emits one `(None, def, rep)` slot for every leaf under `column`; used
/// when an optional subtree is absent.
fn write_nulls(column: &Column, def: i16, rep: i16, leaf_start: usize, out: &mut [Vec<Triple>]) {
    for leaf in out
        .iter_mut()
        .skip(leaf_start)
        .take(column.num_leaves())
    {
        leaf.push((None, def, rep));
    }
}

/// Like [`write_nulls`], but for a subtree rooted below a defined repeated
/// level (empty list/map entries).
fn write_nulls_at(column: &Column, def: i16, rep: i16, leaf_start: usize, out: &mut [Vec<Triple>]) {
    write_nulls(column, def, rep, leaf_start, out);
}

fn type_mismatch(name: &str, expected: &str, got: &Field) -> ColumnFileError {
    ColumnFileError::SchemaMismatch(format!(
        "column '{name}' expects {expected}, got {}",
        got.type_name()
    ))
}

/// Converts a leaf [`Field`] to its physical [`Value`], enforcing the
/// column's logical annotation.
fn field_to_value(
    field: &Field,
    physical: PhysicalType,
    logical: LogicalType,
    name: &str,
) -> Result<Value> {
    let value = match (field, logical) {
        (Field::Bool(v), LogicalType::None) if physical == PhysicalType::BOOLEAN => {
            Value::Bool(*v)
        }
        (Field::Int(v), LogicalType::None) if physical == PhysicalType::INT32 => Value::Int32(*v),
        (Field::Long(v), LogicalType::None) if physical == PhysicalType::INT64 => {
            Value::Int64(*v)
        }
        (Field::Float(v), LogicalType::None) if physical == PhysicalType::FLOAT => {
            Value::Float(*v)
        }
        (Field::Double(v), LogicalType::None) if physical == PhysicalType::DOUBLE => {
            Value::Double(*v)
        }
        (Field::Str(v), LogicalType::String | LogicalType::None)
            if physical == PhysicalType::BYTE_ARRAY =>
        {
            Value::ByteArray(v.clone().into_bytes().into())
        }
        (Field::Bytes(v), LogicalType::None) if physical == PhysicalType::BYTE_ARRAY => {
            Value::ByteArray(v.clone())
        }
        (Field::Date(v), LogicalType::Date) => Value::Int32(*v),
        (Field::TimeMicros(v), LogicalType::TimeMicros) => Value::Int64(*v),
        (Field::TimestampMicros(v), LogicalType::TimestampMicros) => Value::Int64(*v),
        (
            Field::Decimal {
                unscaled,
                precision,
                scale,
            },
            LogicalType::Decimal {
                precision: col_precision,
                scale: col_scale,
            },
        ) => {
            if *precision != col_precision || *scale != col_scale {
                return Err(ColumnFileError::SchemaMismatch(format!(
                    "column '{name}' is DECIMAL({col_precision},{col_scale}), \
                     got DECIMAL({precision},{scale})"
                )));
            }
            Value::Int64(*unscaled)
        }
        (field, _) => {
            return Err(ColumnFileError::SchemaMismatch(format!(
                "column '{name}' ({physical}, {logical}) cannot store a {} field",
                field.type_name()
            )))
        }
    };
    Ok(value)
}
