// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Archetypes and their column tables
//!
//! An archetype is the ordered set of components spawned together for one
//! entity. Entities declared with the same archetype share one [`Table`]:
//! every column in a table has the same number of rows, indexed by the same
//! row order, and rows are only ever appended.

use crate::ecs::component::{
    ColumnBuf, Component, ComponentId, ComponentSchema, ComponentValue, Elem,
};
use crate::ecs::EntityId;
use crate::error::{Result, SchemaError};
use std::collections::HashMap;
use std::fmt;

/// Normalized archetype name
///
/// Derived from a declared type name: module path and generic arguments are
/// stripped, `CamelCase` becomes `snake_case`, and the result is lowercase.
/// `my_sim::RigidBody` and `RigidBody` both normalize to `rigid_body`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchetypeName(String);

impl ArchetypeName {
    /// Normalize a raw name
    pub fn new(raw: &str) -> Self {
        let base = raw.split('<').next().unwrap_or(raw);
        let base = base.rsplit("::").next().unwrap_or(base);

        let mut name = String::with_capacity(base.len() + 4);
        let mut prev_lower = false;
        for ch in base.chars() {
            if ch.is_ascii_uppercase() {
                if prev_lower {
                    name.push('_');
                }
                name.push(ch.to_ascii_lowercase());
                prev_lower = false;
            } else if ch.is_alphanumeric() {
                name.push(ch);
                prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            } else {
                if !name.ends_with('_') && !name.is_empty() {
                    name.push('_');
                }
                prev_lower = false;
            }
        }
        ArchetypeName(name.trim_end_matches('_').to_string())
    }

    /// Name derived from a Rust type
    pub fn of<T: ?Sized>() -> Self {
        ArchetypeName::new(std::any::type_name::<T>())
    }

    /// Borrow as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchetypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entity's worth of component values under an archetype name
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    name: ArchetypeName,
    values: Vec<ComponentValue>,
}

impl Bundle {
    /// Empty bundle with a normalized name
    pub fn new(name: &str) -> Self {
        Bundle {
            name: ArchetypeName::new(name),
            values: Vec::new(),
        }
    }

    /// Empty bundle named after a Rust type
    pub fn of<T: ?Sized>() -> Self {
        Bundle {
            name: ArchetypeName::of::<T>(),
            values: Vec::new(),
        }
    }

    /// Add a typed component value
    pub fn with<C: Component>(mut self, value: C) -> Self {
        self.values.push(ComponentValue::of(&value));
        self
    }

    /// Add a type-erased component value
    pub fn push(&mut self, value: ComponentValue) {
        self.values.push(value);
    }

    /// Archetype name
    pub fn name(&self) -> &ArchetypeName {
        &self.name
    }

    /// Component values in declaration order
    pub fn values(&self) -> &[ComponentValue] {
        &self.values
    }

    /// Reject a component declared twice
    pub fn validate(&self) -> Result<()> {
        for (i, value) in self.values.iter().enumerate() {
            let id = value.schema().id();
            if self.values[..i].iter().any(|v| v.schema().id() == id) {
                return Err(SchemaError::DuplicateComponent {
                    archetype: self.name.to_string(),
                    component: value.schema().name().to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    pub(crate) fn into_values(self) -> Vec<ComponentValue> {
        self.values
    }
}

/// Types that can be spawned as one entity
///
/// Implementors usually build the bundle with [`Bundle::of::<Self>()`] so the
/// archetype name follows the type name.
pub trait Archetype {
    /// Convert into a bundle of component values
    fn into_bundle(self) -> Bundle;
}

impl Archetype for Bundle {
    fn into_bundle(self) -> Bundle {
        self
    }
}

/// Where an entity's row for one archetype lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLocation {
    /// Index of the table in discovery order
    pub table: usize,
    /// Row within the table
    pub row: usize,
}

/// Dense column for one component inside one table
#[derive(Debug, Clone)]
pub(crate) struct Column {
    schema: ComponentSchema,
    data: ColumnBuf,
}

impl Column {
    fn new(schema: ComponentSchema) -> Self {
        let data = ColumnBuf::empty(schema.prim());
        Column { schema, data }
    }

    pub(crate) fn schema(&self) -> &ComponentSchema {
        &self.schema
    }

    pub(crate) fn data(&self) -> &ColumnBuf {
        &self.data
    }

    /// Read one row as a typed value
    pub(crate) fn get<C: Component>(&self, row: usize) -> Option<C> {
        let n = self.schema.elem_count();
        let elems = C::Elem::slice(&self.data)?;
        elems.get(row * n..(row + 1) * n).map(C::from_elems)
    }

    /// Overwrite one row from a typed value
    pub(crate) fn set<C: Component>(&mut self, row: usize, value: &C) -> bool {
        let n = self.schema.elem_count();
        match C::Elem::slice_mut(&mut self.data).and_then(|e| e.get_mut(row * n..(row + 1) * n)) {
            Some(out) => {
                value.write_elems(out);
                true
            }
            None => false,
        }
    }
}

/// Column group for one archetype
#[derive(Debug, Clone)]
pub(crate) struct Table {
    name: ArchetypeName,
    columns: Vec<Column>,
    column_index: HashMap<ComponentId, usize>,
    entity_ids: Vec<EntityId>,
    insertion_seq: Vec<u64>,
    rows: HashMap<EntityId, usize>,
}

impl Table {
    pub(crate) fn new(name: ArchetypeName, schemas: Vec<ComponentSchema>) -> Self {
        let column_index = schemas
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id(), i))
            .collect();
        Table {
            name,
            columns: schemas.into_iter().map(Column::new).collect(),
            column_index,
            entity_ids: Vec::new(),
            insertion_seq: Vec::new(),
            rows: HashMap::new(),
        }
    }

    pub(crate) fn name(&self) -> &ArchetypeName {
        &self.name
    }

    pub(crate) fn len(&self) -> usize {
        self.entity_ids.len()
    }

    pub(crate) fn entity_ids(&self) -> &[EntityId] {
        &self.entity_ids
    }

    pub(crate) fn insertion_seq(&self, row: usize) -> u64 {
        self.insertion_seq[row]
    }

    pub(crate) fn row_of(&self, entity: EntityId) -> Option<usize> {
        self.rows.get(&entity).copied()
    }

    pub(crate) fn has_column(&self, id: ComponentId) -> bool {
        self.column_index.contains_key(&id)
    }

    pub(crate) fn column(&self, id: ComponentId) -> Option<&Column> {
        self.column_index.get(&id).map(|&i| &self.columns[i])
    }

    pub(crate) fn column_mut(&mut self, id: ComponentId) -> Option<&mut Column> {
        match self.column_index.get(&id) {
            Some(&i) => Some(&mut self.columns[i]),
            None => None,
        }
    }

    pub(crate) fn schemas(&self) -> impl Iterator<Item = &ComponentSchema> {
        self.columns.iter().map(|c| c.schema())
    }

    /// Whether `values` declare exactly this table's columns, in order
    pub(crate) fn matches(&self, values: &[ComponentValue]) -> bool {
        values.len() == self.columns.len()
            && values
                .iter()
                .zip(&self.columns)
                .all(|(v, c)| v.schema() == c.schema())
    }

    /// Append one row; callers validate the values against [`Table::matches`] first
    pub(crate) fn push_row(
        &mut self,
        entity: EntityId,
        seq: u64,
        values: Vec<ComponentValue>,
    ) -> usize {
        let row = self.entity_ids.len();
        for (column, value) in self.columns.iter_mut().zip(values) {
            let len = value.data().len();
            let appended = column.data.extend_from_range(value.data(), 0, len);
            debug_assert!(appended, "value layout checked before push");
        }
        self.entity_ids.push(entity);
        self.insertion_seq.push(seq);
        self.rows.insert(entity, row);

        debug_assert!(self
            .columns
            .iter()
            .all(|c| c.data.len() == self.entity_ids.len() * c.schema.elem_count()));
        row
    }
}
