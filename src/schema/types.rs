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

//! The schema tree and its flattened leaf view.
//!
//! A [`Column`] is a node in the ordered schema tree: either a typed leaf or
//! a nested struct, list or map. [`SchemaDescriptor`] flattens the leaves in
//! depth-first order into [`ColumnDescriptor`]s carrying the dotted path and
//! the maximum repetition and definition levels the shredder and assembler
//! rely on.

use std::fmt;
use std::sync::Arc;

use crate::basic::{LogicalType, PhysicalType, Repetition};
use crate::errors::Result;

/// Reference counted pointer to a [`ColumnDescriptor`].
pub type ColumnDescPtr = Arc<ColumnDescriptor>;

/// Reference counted pointer to a [`SchemaDescriptor`].
pub type SchemaDescPtr = Arc<SchemaDescriptor>;

/// A named node of the schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    repetition: Repetition,
    kind: ColumnKind,
}

/// The shape of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    /// A typed leaf, the unit of storage.
    Primitive {
        /// Storage type of the leaf.
        physical: PhysicalType,
        /// Logical annotation, `LogicalType::None` for bare physicals.
        logical: LogicalType,
    },
    /// A group of named child columns.
    Struct(Vec<Column>),
    /// A list of element values; carries one implicit repeated level.
    List(Box<Column>),
    /// Key/value pairs; carries one implicit repeated level. Keys are
    /// required leaves.
    Map(Box<Column>, Box<Column>),
}

impl Column {
    /// Creates a primitive leaf column.
    pub fn primitive(
        name: impl Into<String>,
        repetition: Repetition,
        physical: PhysicalType,
        logical: LogicalType,
    ) -> Result<Self> {
        if let Some(required) = logical.physical_type() {
            if required != physical {
                return Err(general_err!(
                    "logical type {} requires physical type {}, got {}",
                    logical,
                    required,
                    physical
                ));
            }
        }
        Ok(Self {
            name: name.into(),
            repetition,
            kind: ColumnKind::Primitive { physical, logical },
        })
    }

    /// Shorthand for a bare physical leaf.
    pub fn plain(
        name: impl Into<String>,
        repetition: Repetition,
        physical: PhysicalType,
    ) -> Self {
        Self {
            name: name.into(),
            repetition,
            kind: ColumnKind::Primitive {
                physical,
                logical: LogicalType::None,
            },
        }
    }

    /// Shorthand for a UTF-8 string leaf.
    pub fn string(name: impl Into<String>, repetition: Repetition) -> Self {
        Self {
            name: name.into(),
            repetition,
            kind: ColumnKind::Primitive {
                physical: PhysicalType::BYTE_ARRAY,
                logical: LogicalType::String,
            },
        }
    }

    /// Creates a struct column from child columns.
    pub fn group(
        name: impl Into<String>,
        repetition: Repetition,
        children: Vec<Column>,
    ) -> Self {
        Self {
            name: name.into(),
            repetition,
            kind: ColumnKind::Struct(children),
        }
    }

    /// Creates a list column over an element column.
    pub fn list(name: impl Into<String>, repetition: Repetition, element: Column) -> Self {
        Self {
            name: name.into(),
            repetition,
            kind: ColumnKind::List(Box::new(element)),
        }
    }

    /// Creates a map column from a key column and a value column. The key
    /// must be a required leaf.
    pub fn map(
        name: impl Into<String>,
        repetition: Repetition,
        key: Column,
        value: Column,
    ) -> Result<Self> {
        if !key.is_leaf() || key.repetition != Repetition::REQUIRED {
            return Err(general_err!(
                "map key column '{}' must be a required leaf",
                key.name
            ));
        }
        Ok(Self {
            name: name.into(),
            repetition,
            kind: ColumnKind::Map(Box::new(key), Box::new(value)),
        })
    }

    /// Name of this column.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Repetition of this column.
    pub fn repetition(&self) -> Repetition {
        self.repetition
    }

    /// Shape of this column.
    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    /// Whether this is a typed leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, ColumnKind::Primitive { .. })
    }

    /// Whether this column or anything beneath it may be absent.
    pub fn is_optional(&self) -> bool {
        self.repetition == Repetition::OPTIONAL
    }

    /// Number of leaves in the subtree rooted at this column.
    pub fn num_leaves(&self) -> usize {
        match &self.kind {
            ColumnKind::Primitive { .. } => 1,
            ColumnKind::Struct(children) => children.iter().map(Column::num_leaves).sum(),
            ColumnKind::List(element) => element.num_leaves(),
            ColumnKind::Map(key, value) => key.num_leaves() + value.num_leaves(),
        }
    }
}

/// A flattened leaf column: dotted path plus the level bounds computed from
/// its ancestors.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    path: String,
    physical: PhysicalType,
    logical: LogicalType,
    max_def_level: i16,
    max_rep_level: i16,
}

impl ColumnDescriptor {
    /// Dotted path from the schema root, e.g. `user.tags.element`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Physical storage type.
    pub fn physical_type(&self) -> PhysicalType {
        self.physical
    }

    /// Logical annotation.
    pub fn logical_type(&self) -> LogicalType {
        self.logical
    }

    /// Maximum definition level: number of optional or repeated ancestors
    /// (including this leaf's own optionality).
    pub fn max_def_level(&self) -> i16 {
        self.max_def_level
    }

    /// Maximum repetition level: number of repeated ancestors.
    pub fn max_rep_level(&self) -> i16 {
        self.max_rep_level
    }
}

/// A schema: the ordered column tree plus its flattened leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    fields: Vec<Column>,
    leaves: Vec<ColumnDescPtr>,
}

impl SchemaDescriptor {
    /// Builds a schema from top-level columns, computing leaf paths and
    /// level bounds.
    pub fn new(fields: Vec<Column>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for f in &fields {
            if !seen.insert(f.name.as_str()) {
                return Err(general_err!("duplicate top-level column '{}'", f.name));
            }
        }
        let mut leaves = Vec::new();
        for f in &fields {
            flatten(f, "", 0, 0, &mut leaves);
        }
        if leaves.is_empty() {
            return Err(general_err!("schema must contain at least one leaf column"));
        }
        Ok(Self { fields, leaves })
    }

    /// Top-level columns in declaration order.
    pub fn fields(&self) -> &[Column] {
        &self.fields
    }

    /// Flattened leaves in depth-first order.
    pub fn leaves(&self) -> &[ColumnDescPtr] {
        &self.leaves
    }

    /// Number of leaf columns.
    pub fn num_leaves(&self) -> usize {
        self.leaves.len()
    }

    /// Leaf descriptor by index.
    pub fn leaf(&self, i: usize) -> &ColumnDescPtr {
        &self.leaves[i]
    }

    /// Top-level column by name.
    pub fn field(&self, name: &str) -> Option<&Column> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Index range `[start, end)` of the leaves under the top-level column
    /// at `field_index`.
    pub fn leaf_range(&self, field_index: usize) -> (usize, usize) {
        let start: usize = self.fields[..field_index]
            .iter()
            .map(Column::num_leaves)
            .sum();
        (start, start + self.fields[field_index].num_leaves())
    }
}

fn flatten(
    column: &Column,
    parent_path: &str,
    def_level: i16,
    rep_level: i16,
    leaves: &mut Vec<ColumnDescPtr>,
) {
    let path = if parent_path.is_empty() {
        column.name.clone()
    } else {
        format!("{parent_path}.{}", column.name)
    };
    let def_level = def_level + i16::from(column.is_optional());
    match &column.kind {
        ColumnKind::Primitive { physical, logical } => {
            leaves.push(Arc::new(ColumnDescriptor {
                path,
                physical: *physical,
                logical: *logical,
                max_def_level: def_level,
                max_rep_level: rep_level,
            }));
        }
        ColumnKind::Struct(children) => {
            for child in children {
                flatten(child, &path, def_level, rep_level, leaves);
            }
        }
        // The repeated level contributes one definition level (list or map
        // present and non-empty) and one repetition level.
        ColumnKind::List(element) => {
            flatten(element, &path, def_level + 1, rep_level + 1, leaves);
        }
        ColumnKind::Map(key, value) => {
            flatten(key, &path, def_level + 1, rep_level + 1, leaves);
            flatten(value, &path, def_level + 1, rep_level + 1, leaves);
        }
    }
}

impl fmt::Display for SchemaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for leaf in &self.leaves {
            writeln!(
                f,
                "{}: {} ({}) def={} rep={}",
                leaf.path(),
                leaf.physical_type(),
                leaf.logical_type(),
                leaf.max_def_level(),
                leaf.max_rep_level()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested_schema() -> SchemaDescriptor {
        // message {
        //   required int64 id;
        //   optional group user {
        //     optional string name;
        //     optional list<required int32> scores;
        //   }
        //   optional map<string, optional double> metrics;
        // }
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
        .unwrap()
    }

    #[test]
    fn test_leaf_levels() {
        let schema = nested_schema();
        let leaves = schema.leaves();
        assert_eq!(leaves.len(), 5);

        assert_eq!(leaves[0].path(), "id");
        assert_eq!(leaves[0].max_def_level(), 0);
        assert_eq!(leaves[0].max_rep_level(), 0);

        assert_eq!(leaves[1].path(), "user.name");
        assert_eq!(leaves[1].max_def_level(), 2);
        assert_eq!(leaves[1].max_rep_level(), 0);

        // optional user (+1), optional scores (+1), repeated (+1), required element (+0)
        assert_eq!(leaves[2].path(), "user.scores.element");
        assert_eq!(leaves[2].max_def_level(), 3);
        assert_eq!(leaves[2].max_rep_level(), 1);

        assert_eq!(leaves[3].path(), "metrics.key");
        assert_eq!(leaves[3].max_def_level(), 2);
        assert_eq!(leaves[3].max_rep_level(), 1);

        assert_eq!(leaves[4].path(), "metrics.value");
        assert_eq!(leaves[4].max_def_level(), 3);
        assert_eq!(leaves[4].max_rep_level(), 1);
    }

    #[test]
    fn test_leaf_range() {
        let schema = nested_schema();
        assert_eq!(schema.leaf_range(0), (0, 1));
        assert_eq!(schema.leaf_range(1), (1, 3));
        assert_eq!(schema.leaf_range(2), (3, 5));
    }

    #[test]
    fn test_duplicate_top_level_rejected() {
        let err = SchemaDescriptor::new(vec![
            Column::plain("a", Repetition::REQUIRED, PhysicalType::INT32),
            Column::plain("a", Repetition::OPTIONAL, PhysicalType::INT64),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_map_key_must_be_required_leaf() {
        assert!(Column::map(
            "m",
            Repetition::OPTIONAL,
            Column::string("key", Repetition::OPTIONAL),
            Column::plain("value", Repetition::OPTIONAL, PhysicalType::INT32),
        )
        .is_err());
    }

    #[test]
    fn test_logical_physical_validation() {
        assert!(Column::primitive(
            "d",
            Repetition::OPTIONAL,
            PhysicalType::BOOLEAN,
            LogicalType::Date
        )
        .is_err());
    }
}
