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
//! Column store
//!
//! The World owns every archetype table, the entity → row index and the
//! registry of component schemas. It is the only persistent state in the
//! runtime: systems read from it and write back into it, and nothing else
//! survives between ticks.
//!
//! # Read order
//!
//! [`World::column_array`] concatenates a component across every table that
//! stores it, tables in the order they were first seen and rows in insertion
//! order. The order is stable for as long as nothing new is spawned.

use crate::assets::{Asset, Assets, Handle};
use crate::ecs::archetype::{Archetype, ArchetypeName, Bundle, EntityLocation, Table};
use crate::ecs::component::{ColumnBuf, Component, ComponentId, ComponentSchema, Elem};
use crate::ecs::entity::{EntityAllocator, EntityId};
use crate::error::{IdentityError, MissingOutputError, Result, SchemaError};
use std::collections::HashMap;

/// A component column read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentArray {
    schema: ComponentSchema,
    entity_ids: Vec<EntityId>,
    data: ColumnBuf,
}

impl ComponentArray {
    /// Schema of the column
    pub fn schema(&self) -> &ComponentSchema {
        &self.schema
    }

    /// Entity owning each row
    pub fn entity_ids(&self) -> &[EntityId] {
        &self.entity_ids
    }

    /// Number of rows (entities)
    pub fn len(&self) -> usize {
        self.entity_ids.len()
    }

    /// Whether the column has no rows
    pub fn is_empty(&self) -> bool {
        self.entity_ids.is_empty()
    }

    /// Flat element view, `len() * elem_count` long
    pub fn as_slice<E: Elem>(&self) -> Option<&[E]> {
        self.data.as_slice::<E>()
    }

    /// Raw buffer
    pub fn data(&self) -> &ColumnBuf {
        &self.data
    }

    /// Decode every row as a typed component
    pub fn values<C: Component>(&self) -> Option<Vec<C>> {
        let n = self.schema.elem_count();
        let elems = self.data.as_slice::<C::Elem>()?;
        if n == 0 {
            return Some(Vec::new());
        }
        Some(elems.chunks_exact(n).map(C::from_elems).collect())
    }
}

/// The main ECS world container
pub struct World {
    entities: EntityAllocator,
    tables: Vec<Table>,
    table_index: HashMap<ArchetypeName, usize>,
    schemas: HashMap<ComponentId, ComponentSchema>,
    component_tables: HashMap<ComponentId, Vec<usize>>,
    locations: HashMap<EntityId, Vec<EntityLocation>>,
    names: HashMap<EntityId, String>,
    next_seq: u64,
    frozen: bool,
    assets: Assets,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        World {
            entities: EntityAllocator::new(),
            tables: Vec::new(),
            table_index: HashMap::new(),
            schemas: HashMap::new(),
            component_tables: HashMap::new(),
            locations: HashMap::new(),
            names: HashMap::new(),
            next_seq: 0,
            frozen: false,
            assets: Assets::new(),
        }
    }

    /// Spawn one entity, allocating a table for an unseen archetype
    pub fn spawn(&mut self, archetype: impl Archetype) -> Result<EntityId> {
        let bundle = archetype.into_bundle();
        // Validate before allocating so a rejected spawn does not burn an id.
        self.check_bundle(&bundle, None)?;
        let id = self.entities.allocate();
        self.insert_unchecked(id, bundle);
        Ok(id)
    }

    /// Spawn one entity and record a display name for it
    ///
    /// Names are metadata only. They are not unique and never affect
    /// queries or read order.
    pub fn spawn_named(
        &mut self,
        archetype: impl Archetype,
        name: impl Into<String>,
    ) -> Result<EntityId> {
        let id = self.spawn(archetype)?;
        self.names.insert(id, name.into());
        Ok(id)
    }

    /// Display name given at spawn
    pub fn entity_name(&self, entity: EntityId) -> Option<&str> {
        self.names.get(&entity).map(String::as_str)
    }

    /// Lowest-id entity spawned under `name`
    pub fn find_named(&self, name: &str) -> Option<EntityId> {
        self.names
            .iter()
            .filter(|(_, n)| n.as_str() == name)
            .map(|(&id, _)| id)
            .min()
    }

    /// Spawn one entity per item, returning ids in spawn order
    pub fn spawn_batch<A, I>(&mut self, archetypes: I) -> Result<Vec<EntityId>>
    where
        A: Archetype,
        I: IntoIterator<Item = A>,
    {
        archetypes.into_iter().map(|a| self.spawn(a)).collect()
    }

    /// Give an existing entity membership in another archetype
    ///
    /// The entity keeps its id and now straddles both tables, joined by id.
    pub fn attach(&mut self, entity: EntityId, archetype: impl Archetype) -> Result<()> {
        if !self.entities.contains(entity) {
            return Err(IdentityError { entity }.into());
        }
        let bundle = archetype.into_bundle();
        self.check_bundle(&bundle, Some(entity))?;
        self.insert_unchecked(entity, bundle);
        Ok(())
    }

    fn check_bundle(&self, bundle: &Bundle, entity: Option<EntityId>) -> Result<()> {
        if self.frozen {
            return Err(SchemaError::Frozen {
                archetype: bundle.name().to_string(),
            }
            .into());
        }
        bundle.validate()?;

        for value in bundle.values() {
            if let Some(registered) = self.schemas.get(&value.schema().id()) {
                registered.check_layout(value.schema())?;
            }
            if let Some(entity) = entity {
                if self.locate(entity, value.schema().id()).is_some() {
                    return Err(SchemaError::ComponentAlreadyHeld {
                        entity,
                        component: value.schema().name().to_string(),
                    }
                    .into());
                }
            }
        }

        if let Some(&table) = self.table_index.get(bundle.name()) {
            if !self.tables[table].matches(bundle.values()) {
                return Err(SchemaError::ArchetypeMismatch {
                    archetype: bundle.name().to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn insert_unchecked(&mut self, entity: EntityId, bundle: Bundle) {
        let name = bundle.name().clone();
        let table = match self.table_index.get(&name) {
            Some(&table) => table,
            None => {
                let schemas: Vec<ComponentSchema> =
                    bundle.values().iter().map(|v| v.schema().clone()).collect();
                let table = self.tables.len();
                for schema in &schemas {
                    self.schemas
                        .entry(schema.id())
                        .or_insert_with(|| schema.clone());
                    self.component_tables.entry(schema.id()).or_default().push(table);
                }
                tracing::debug!(
                    archetype = %name,
                    components = schemas.len(),
                    "new archetype table"
                );
                self.tables.push(Table::new(name.clone(), schemas));
                self.table_index.insert(name, table);
                table
            }
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        let row = self.tables[table].push_row(entity, seq, bundle.into_values());
        self.locations
            .entry(entity)
            .or_default()
            .push(EntityLocation { table, row });
    }

    /// Store an opaque asset and return its handle
    pub fn insert_asset<T: Asset>(&mut self, asset: T) -> Handle<T> {
        self.assets.insert(asset)
    }

    /// Asset store
    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    /// Number of entity ids handed out
    pub fn entity_count(&self) -> u64 {
        self.entities.len()
    }

    /// Whether `entity` was ever spawned
    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.entities.contains(entity)
    }

    /// Archetype names in discovery order
    pub fn archetypes(&self) -> impl Iterator<Item = &ArchetypeName> {
        self.tables.iter().map(|t| t.name())
    }

    /// Component schemas stored by an archetype, in declaration order
    pub fn archetype_schemas(&self, name: &ArchetypeName) -> Option<Vec<ComponentSchema>> {
        let &table = self.table_index.get(name)?;
        Some(self.tables[table].schemas().cloned().collect())
    }

    /// Whether at least one table stores `id`
    pub fn has_component(&self, id: ComponentId) -> bool {
        self.component_tables.contains_key(&id)
    }

    /// Registered schema for a component
    pub fn schema(&self, id: ComponentId) -> Option<&ComponentSchema> {
        self.schemas.get(&id)
    }

    /// Check that a typed component agrees with the registered layout
    ///
    /// Unregistered components pass; they simply match nothing.
    pub fn check_schema(&self, schema: &ComponentSchema) -> Result<()> {
        match self.schemas.get(&schema.id()) {
            Some(registered) => registered.check_layout(schema),
            None => Ok(()),
        }
    }

    pub(crate) fn locate(
        &self,
        entity: EntityId,
        component: ComponentId,
    ) -> Option<EntityLocation> {
        self.locations
            .get(&entity)?
            .iter()
            .copied()
            .find(|loc| self.tables[loc.table].has_column(component))
    }

    /// Entities holding `component`, in read order
    pub fn entities_with(&self, component: ComponentId) -> Vec<EntityId> {
        self.tables_with(component)
            .iter()
            .flat_map(|&t| self.tables[t].entity_ids().iter().copied())
            .collect()
    }

    /// Read one entity's value for a component
    pub fn get<C: Component>(&self, entity: EntityId) -> Result<Option<C>> {
        let schema = C::schema();
        self.check_schema(&schema)?;
        Ok(self.get_by_id::<C>(entity, schema.id()))
    }

    /// Typed read with a precomputed id; the layout must already be checked
    pub(crate) fn get_by_id<C: Component>(&self, entity: EntityId, id: ComponentId) -> Option<C> {
        let loc = self.locate(entity, id)?;
        self.tables[loc.table].column(id)?.get::<C>(loc.row)
    }

    /// Indices of the tables storing `id`, in discovery order
    pub(crate) fn tables_with(&self, id: ComponentId) -> &[usize] {
        self.component_tables
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn table(&self, index: usize) -> &Table {
        &self.tables[index]
    }

    /// Number of rows storing `id` across every table
    pub(crate) fn component_len(&self, id: ComponentId) -> usize {
        self.tables_with(id)
            .iter()
            .map(|&t| self.tables[t].len())
            .sum()
    }

    /// Position of the row holding `component` for `entity` in global insertion order
    pub(crate) fn insertion_seq(&self, entity: EntityId, component: ComponentId) -> Option<u64> {
        let loc = self.locate(entity, component)?;
        Some(self.tables[loc.table].insertion_seq(loc.row))
    }

    /// Concatenate a component across every table that stores it
    pub fn column_array(&self, id: ComponentId) -> Result<ComponentArray> {
        let schema = self
            .schemas
            .get(&id)
            .cloned()
            .ok_or(SchemaError::UnresolvedComponent {
                component: format!("#{:016x}", id.raw()),
            })?;
        let n = schema.elem_count();
        let mut data = ColumnBuf::empty(schema.prim());
        let mut entity_ids = Vec::new();

        for &t in self.component_tables.get(&id).into_iter().flatten() {
            let table = &self.tables[t];
            if let Some(column) = table.column(id) {
                data.extend_from_range(column.data(), 0, table.len() * n);
                entity_ids.extend_from_slice(table.entity_ids());
            }
        }

        Ok(ComponentArray {
            schema,
            entity_ids,
            data,
        })
    }

    /// Overwrite `component` for exactly the given entities
    ///
    /// Every target must already hold the component; otherwise nothing is
    /// written and a [`MissingOutputError`] names the first offender. Rows of
    /// entities not listed are left untouched.
    pub fn write<C: Component>(&mut self, entities: &[EntityId], values: &[C]) -> Result<()> {
        let schema = C::schema();
        if entities.len() != values.len() {
            return Err(SchemaError::RowCountMismatch {
                component: schema.name().to_string(),
                entities: entities.len(),
                values: values.len(),
            }
            .into());
        }
        self.check_schema(&schema)?;

        let mut targets = Vec::with_capacity(entities.len());
        for &entity in entities {
            if !self.entities.contains(entity) {
                return Err(IdentityError { entity }.into());
            }
            match self.locate(entity, schema.id()) {
                Some(loc) => targets.push(loc),
                None => {
                    return Err(MissingOutputError {
                        entity,
                        component: schema.name().to_string(),
                    }
                    .into())
                }
            }
        }

        for (loc, value) in targets.into_iter().zip(values) {
            let written = self.tables[loc.table]
                .column_mut(schema.id())
                .map(|column| column.set(loc.row, value))
                .unwrap_or(false);
            debug_assert!(written, "location resolved before write");
        }
        Ok(())
    }

    /// Stop accepting spawns and attaches; values stay writable
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether the schema is frozen
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Bundle;
    use crate::Error;

    crate::component!(struct X(f32) => "x";);
    crate::component!(struct Y(f32) => "y";);
    crate::component!(struct Wide(f64) => "x_wide";);
    crate::component!(struct BadX(f64) => "x";);

    fn xy(x: f32, y: f32) -> Bundle {
        Bundle::new("Test").with(X(x)).with(Y(y))
    }

    #[test]
    fn test_world_spawn_assigns_monotonic_ids() {
        let mut world = World::new();
        let a = world.spawn(xy(1.0, 2.0)).unwrap();
        let b = world.spawn(xy(3.0, 4.0)).unwrap();
        assert_eq!(a.raw(), 0);
        assert_eq!(b.raw(), 1);
        assert_eq!(world.entity_count(), 2);
        assert_eq!(world.archetypes().count(), 1);
    }

    #[test]
    fn test_column_array_read_order() {
        let mut world = World::new();
        world.spawn(xy(1.0, 10.0)).unwrap();
        world.spawn(Bundle::new("Lonely").with(X(2.0))).unwrap();
        world.spawn(xy(3.0, 30.0)).unwrap();

        // Tables in discovery order, rows in insertion order.
        let xs = world.column_array(X::component_id()).unwrap();
        assert_eq!(xs.as_slice::<f32>().unwrap(), &[1.0, 3.0, 2.0]);
        assert_eq!(
            xs.entity_ids(),
            &[EntityId::new(0), EntityId::new(2), EntityId::new(1)]
        );
        assert_eq!(xs.values::<X>().unwrap(), vec![X(1.0), X(3.0), X(2.0)]);
        assert_eq!(world.entities_with(X::component_id()), xs.entity_ids());
        assert_eq!(world.component_len(Y::component_id()), 2);
    }

    #[test]
    fn test_spawn_duplicate_component_rejected() {
        let mut world = World::new();
        let result = world.spawn(Bundle::new("Test").with(X(1.0)).with(X(2.0)));
        assert!(matches!(
            result,
            Err(Error::Schema(SchemaError::DuplicateComponent { .. }))
        ));
        // No id was consumed by the rejected spawn.
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_archetype_redeclared_with_different_schema() {
        let mut world = World::new();
        world.spawn(xy(1.0, 2.0)).unwrap();
        let result = world.spawn(Bundle::new("Test").with(X(1.0)));
        assert!(matches!(
            result,
            Err(Error::Schema(SchemaError::ArchetypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_component_type_mismatch_rejected() {
        let mut world = World::new();
        world.spawn(xy(1.0, 2.0)).unwrap();
        let result = world.spawn(Bundle::new("Other").with(BadX(1.0)));
        assert!(matches!(
            result,
            Err(Error::Schema(SchemaError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_attach_to_existing_entity() {
        let mut world = World::new();
        let id = world.spawn(Bundle::new("Test").with(X(1.0))).unwrap();
        world.attach(id, Bundle::new("Extra").with(Wide(2.0))).unwrap();

        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.get::<X>(id).unwrap(), Some(X(1.0)));
        assert_eq!(world.get::<Wide>(id).unwrap(), Some(Wide(2.0)));
    }

    #[test]
    fn test_attach_unknown_entity() {
        let mut world = World::new();
        let result = world.attach(EntityId::new(9), Bundle::new("Extra").with(Wide(2.0)));
        assert!(matches!(result, Err(Error::Identity(_))));
    }

    #[test]
    fn test_attach_component_already_held() {
        let mut world = World::new();
        let id = world.spawn(Bundle::new("Test").with(X(1.0))).unwrap();
        let result = world.attach(id, Bundle::new("Again").with(X(5.0)));
        assert!(matches!(
            result,
            Err(Error::Schema(SchemaError::ComponentAlreadyHeld { .. }))
        ));
    }

    #[test]
    fn test_write_only_touches_subset() {
        let mut world = World::new();
        let a = world.spawn(xy(1.0, 0.0)).unwrap();
        let b = world.spawn(xy(2.0, 0.0)).unwrap();
        world.write(&[b], &[X(20.0)]).unwrap();

        assert_eq!(world.get::<X>(a).unwrap(), Some(X(1.0)));
        assert_eq!(world.get::<X>(b).unwrap(), Some(X(20.0)));
    }

    #[test]
    fn test_write_missing_output_writes_nothing() {
        let mut world = World::new();
        let a = world.spawn(xy(1.0, 0.0)).unwrap();
        let lonely = world.spawn(Bundle::new("Lonely").with(Wide(0.0))).unwrap();

        let result = world.write(&[a, lonely], &[X(5.0), X(6.0)]);
        assert!(matches!(result, Err(Error::MissingOutput(_))));
        assert_eq!(world.get::<X>(a).unwrap(), Some(X(1.0)));
    }

    #[test]
    fn test_write_row_count_mismatch() {
        let mut world = World::new();
        let a = world.spawn(xy(1.0, 0.0)).unwrap();
        let result = world.write(&[a], &[X(1.0), X(2.0)]);
        assert!(matches!(
            result,
            Err(Error::Schema(SchemaError::RowCountMismatch { .. }))
        ));
    }

    #[test]
    fn test_frozen_world_rejects_spawn() {
        let mut world = World::new();
        let a = world.spawn(xy(1.0, 0.0)).unwrap();
        world.freeze();
        assert!(world.is_frozen());
        assert!(matches!(
            world.spawn(xy(1.0, 0.0)),
            Err(Error::Schema(SchemaError::Frozen { .. }))
        ));
        // Values remain writable.
        world.write(&[a], &[X(3.0)]).unwrap();
    }

    #[test]
    fn test_spawn_named_metadata() {
        let mut world = World::new();
        let anon = world.spawn(xy(0.0, 0.0)).unwrap();
        let sat = world.spawn_named(xy(1.0, 0.0), "satellite").unwrap();
        let twin = world.spawn_named(xy(2.0, 0.0), "satellite").unwrap();

        assert_eq!(world.entity_name(anon), None);
        assert_eq!(world.entity_name(twin), Some("satellite"));
        assert_eq!(world.find_named("satellite"), Some(sat));
        assert_eq!(world.find_named("ground"), None);
        // Named entities are ordinary rows.
        let xs = world.column_array(X::component_id()).unwrap();
        assert_eq!(xs.as_slice::<f32>().unwrap(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_frozen_world_rejects_spawn_named() {
        let mut world = World::new();
        world.freeze();
        assert!(world.spawn_named(xy(1.0, 0.0), "late").is_err());
        assert_eq!(world.find_named("late"), None);
    }

    #[test]
    fn test_column_array_unresolved() {
        let world = World::new();
        assert!(matches!(
            world.column_array(X::component_id()),
            Err(Error::Schema(SchemaError::UnresolvedComponent { .. }))
        ));
    }
}
