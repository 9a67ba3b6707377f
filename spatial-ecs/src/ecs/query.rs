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
//! Typed multi-component queries
//!
//! A `Query<(C1, .., Cn)>` is an inner join on entity id: it selects every
//! entity that currently holds all of `C1..Cn`, no matter which archetype
//! tables supply them. Matches are ordered by ascending entity id and are
//! recomputed on every evaluation, since spawns and attaches change
//! membership.
//!
//! `map` evaluates a function once per matched entity and produces a
//! [`ColumnWrite`] that touches only those entities. Entities outside the
//! match keep their previous value.

use crate::config::Client;
use crate::ecs::component::{Component, ComponentId, ComponentSchema, Elem};
use crate::ecs::entity::EntityId;
use crate::ecs::world::World;
use crate::error::Result;

/// Tuples of components that can be fetched together for one entity
pub trait QueryData: Clone + Send + Sync + Sized + 'static {
    /// Schemas of every component in the tuple, in tuple order
    fn schemas() -> Vec<ComponentSchema>;

    /// Append every row of `table` that holds the whole tuple
    ///
    /// `ids` are the ids of [`QueryData::schemas`], in the same order.
    #[doc(hidden)]
    fn collect_table(
        world: &World,
        table: usize,
        ids: &[ComponentId],
        out: &mut Vec<(EntityId, Self)>,
    );
}

/// Typed reader for one component over the rows of one table
///
/// Columns the table stores are read straight from the element slice;
/// components living in another archetype are joined through the entity id.
enum ColumnReader<'w, C: Component> {
    Local { elems: &'w [C::Elem], width: usize },
    Joined { world: &'w World, id: ComponentId },
}

impl<'w, C: Component> ColumnReader<'w, C> {
    fn new(world: &'w World, table: usize, id: ComponentId) -> Self {
        let local = world.table(table).column(id).and_then(|column| {
            let elems = C::Elem::slice(column.data())?;
            Some((elems, column.schema().elem_count()))
        });
        match local {
            Some((elems, width)) => ColumnReader::Local { elems, width },
            None => ColumnReader::Joined { world, id },
        }
    }

    fn read(&self, row: usize, entity: EntityId) -> Option<C> {
        match self {
            ColumnReader::Local { elems, width } => elems
                .get(row * width..(row + 1) * width)
                .map(C::from_elems),
            ColumnReader::Joined { world, id } => world.get_by_id::<C>(entity, *id),
        }
    }
}

macro_rules! impl_query_data {
    ($(($c:ident, $i:tt)),+) => {
        impl<$($c: Component),+> QueryData for ($($c,)+) {
            fn schemas() -> Vec<ComponentSchema> {
                vec![$($c::schema()),+]
            }

            #[allow(non_snake_case)]
            fn collect_table(
                world: &World,
                table: usize,
                ids: &[ComponentId],
                out: &mut Vec<(EntityId, Self)>,
            ) {
                $(let $c = ColumnReader::<$c>::new(world, table, ids[$i]);)+
                let entities = world.table(table).entity_ids();
                out.reserve(entities.len());
                for (row, &entity) in entities.iter().enumerate() {
                    if let ($(Some($c),)+) = ($($c.read(row, entity),)+) {
                        out.push((entity, ($($c,)+)));
                    }
                }
            }
        }
    };
}

impl_query_data!((A, 0));
impl_query_data!((A, 0), (B, 1));
impl_query_data!((A, 0), (B, 1), (C, 2));
impl_query_data!((A, 0), (B, 1), (C, 2), (D, 3));
impl_query_data!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4));
impl_query_data!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5));
impl_query_data!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5), (G, 6));
impl_query_data!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5), (G, 6), (H, 7));

/// Materialized join result
#[derive(Debug, Clone)]
pub struct Query<Q> {
    entities: Vec<EntityId>,
    rows: Vec<Q>,
}

impl<Q: QueryData> Query<Q> {
    /// Evaluate the join against the current store
    pub fn new(world: &World) -> Result<Self> {
        let schemas = Q::schemas();
        for schema in &schemas {
            world.check_schema(schema)?;
        }
        let ids: Vec<ComponentId> = schemas.iter().map(|s| s.id()).collect();

        // Drive the join from the least populated component, table by table.
        let Some(driver) = ids.iter().copied().min_by_key(|&id| world.component_len(id)) else {
            return Ok(Query {
                entities: Vec::new(),
                rows: Vec::new(),
            });
        };
        let mut matched = Vec::with_capacity(world.component_len(driver));
        for &table in world.tables_with(driver) {
            Q::collect_table(world, table, &ids, &mut matched);
        }
        matched.sort_by_key(|(entity, _)| *entity);

        let (entities, rows) = matched.into_iter().unzip();
        Ok(Query { entities, rows })
    }

    /// Number of matched entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing matched
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Matched entities, ascending
    pub fn entity_ids(&self) -> &[EntityId] {
        &self.entities
    }

    /// Fetched tuples, aligned with [`Query::entity_ids`]
    pub fn rows(&self) -> &[Q] {
        &self.rows
    }

    /// Iterate `(entity, tuple)` pairs in ascending entity order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Q)> {
        self.entities.iter().copied().zip(self.rows.iter())
    }

    /// Tuple for one entity, if it matched
    pub fn get(&self, entity: EntityId) -> Option<&Q> {
        self.entities
            .binary_search(&entity)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Apply `f` to every matched tuple on the calling thread
    pub fn map<O, F>(&self, f: F) -> ColumnWrite<O>
    where
        O: Component,
        F: Fn(Q) -> O + Send + Sync,
    {
        self.map_with(&Client::cpu(), f)
    }

    /// Apply `f` to every matched tuple on the client's execution target
    pub fn map_with<O, F>(&self, client: &Client, f: F) -> ColumnWrite<O>
    where
        O: Component,
        F: Fn(Q) -> O + Send + Sync,
    {
        let values = map_rows(client, &self.rows, |row| f(row.clone()));
        ColumnWrite {
            entities: self.entities.clone(),
            values,
        }
    }
}

/// Values destined for one component column, keyed by entity
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnWrite<O> {
    entities: Vec<EntityId>,
    values: Vec<O>,
}

impl<O: Component> ColumnWrite<O> {
    /// Pair entities with values
    pub fn new(entities: Vec<EntityId>, values: Vec<O>) -> Self {
        ColumnWrite { entities, values }
    }

    /// Target entities
    pub fn entity_ids(&self) -> &[EntityId] {
        &self.entities
    }

    /// Values to write, aligned with [`ColumnWrite::entity_ids`]
    pub fn values(&self) -> &[O] {
        &self.values
    }

    /// Number of rows to write
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the write is a no-op
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Write into the store
    ///
    /// Fails without writing anything if a target never held `O`.
    pub fn apply(&self, world: &mut World) -> Result<()> {
        if self.entities.is_empty() {
            return Ok(());
        }
        world.write(&self.entities, &self.values)
    }
}

#[cfg(feature = "parallel")]
pub(crate) fn map_rows<T, O, F>(client: &Client, rows: &[T], f: F) -> Vec<O>
where
    T: Sync,
    O: Send,
    F: Fn(&T) -> O + Send + Sync,
{
    use rayon::prelude::*;

    if client.should_parallelize(rows.len()) {
        rows.par_iter().map(f).collect()
    } else {
        rows.iter().map(f).collect()
    }
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn map_rows<T, O, F>(_client: &Client, rows: &[T], f: F) -> Vec<O>
where
    T: Sync,
    O: Send,
    F: Fn(&T) -> O + Send + Sync,
{
    rows.iter().map(f).collect()
}
