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
//! Relation-typed graph queries
//!
//! A relation component stores a directed `(source, target)` pair of entity
//! ids. [`GraphQuery`] rebuilds the adjacency of one relation type from the
//! store on every evaluation, grouping targets by source in the order the
//! edges were spawned. Edges are ordinary entities; cycles need no special
//! handling because nothing holds back-pointers.
//!
//! [`GraphQuery::edge_fold`] reduces the outgoing edges of every source in
//! that order. The fold function does not have to be commutative, so edge
//! insertion order is observable.

use crate::config::Client;
use crate::ecs::component::{Component, ComponentSchema};
use crate::ecs::entity::EntityId;
use crate::ecs::query::{map_rows, ColumnWrite, Query, QueryData};
use crate::ecs::world::World;
use crate::error::Result;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// A component interpreted as a directed edge
pub trait Relation: Component {
    /// Entity the edge leaves
    fn source(&self) -> EntityId;

    /// Entity the edge enters
    fn target(&self) -> EntityId;
}

crate::component!(
    /// Generic directed edge `[from, to]`
    pub struct Edge([u64; 2]) => "edge";
);

impl Edge {
    /// Edge from `from` to `to`
    pub fn new(from: EntityId, to: EntityId) -> Self {
        Edge([from.raw(), to.raw()])
    }
}

impl Relation for Edge {
    fn source(&self) -> EntityId {
        EntityId::new(self.0[0])
    }

    fn target(&self) -> EntityId {
        EntityId::new(self.0[1])
    }
}

/// Adjacency of one relation type, grouped by source
#[derive(Debug, Clone)]
pub struct GraphQuery<E> {
    adjacency: BTreeMap<EntityId, Vec<EntityId>>,
    edges: usize,
    _relation: PhantomData<fn() -> E>,
}

impl<E: Relation> GraphQuery<E> {
    /// Index every stored edge of type `E`
    pub fn new(world: &World) -> Result<Self> {
        let id = E::component_id();
        let holders = Query::<(E,)>::new(world)?;

        let mut edges = Vec::with_capacity(holders.len());
        for (holder, (edge,)) in holders.iter() {
            if let Some(seq) = world.insertion_seq(holder, id) {
                edges.push((seq, edge.source(), edge.target()));
            }
        }
        edges.sort_by_key(|&(seq, _, _)| seq);

        let mut adjacency: BTreeMap<EntityId, Vec<EntityId>> = BTreeMap::new();
        for &(_, source, target) in &edges {
            adjacency.entry(source).or_default().push(target);
        }

        Ok(GraphQuery {
            adjacency,
            edges: edges.len(),
            _relation: PhantomData,
        })
    }

    /// Sources with at least one outgoing edge, ascending
    pub fn sources(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.adjacency.keys().copied()
    }

    /// Targets of `source` in edge insertion order
    pub fn targets(&self, source: EntityId) -> &[EntityId] {
        self.adjacency
            .get(&source)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct sources
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Whether no edge of this type exists
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Total number of edges
    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Fold every source's outgoing edges on the calling thread
    pub fn edge_fold<L, R, O, F>(
        &self,
        left: &Query<L>,
        right: &Query<R>,
        init: O,
        f: F,
    ) -> ColumnWrite<O>
    where
        L: QueryData,
        R: QueryData,
        O: Component,
        F: Fn(O, L, R) -> O + Send + Sync,
    {
        self.edge_fold_with(&Client::cpu(), left, right, init, f)
    }

    /// Fold every source's outgoing edges on the client's execution target
    ///
    /// For each source `s`, the accumulator starts at `init` and is updated
    /// with `f(acc, left[s], right[t])` for every edge `(s, t)` in insertion
    /// order. Sources are independent and may be folded in parallel; the
    /// edges of one source never are. Sources missing from `left` and edges
    /// whose target is missing from `right` are skipped, and a source left
    /// with no usable edge keeps its previous value.
    pub fn edge_fold_with<L, R, O, F>(
        &self,
        client: &Client,
        left: &Query<L>,
        right: &Query<R>,
        init: O,
        f: F,
    ) -> ColumnWrite<O>
    where
        L: QueryData,
        R: QueryData,
        O: Component,
        F: Fn(O, L, R) -> O + Send + Sync,
    {
        let mut sources = Vec::with_capacity(self.adjacency.len());
        let mut rows: Vec<(&L, Vec<&R>)> = Vec::with_capacity(self.adjacency.len());

        for (&source, targets) in &self.adjacency {
            let Some(l) = left.get(source) else {
                tracing::warn!(
                    %source,
                    edges = targets.len(),
                    "skipping edges: source lacks the left query components"
                );
                continue;
            };
            let mut resolved = Vec::with_capacity(targets.len());
            for &target in targets {
                match right.get(target) {
                    Some(r) => resolved.push(r),
                    None => tracing::warn!(
                        %source,
                        %target,
                        "skipping edge: target lacks the right query components"
                    ),
                }
            }
            if !resolved.is_empty() {
                sources.push(source);
                rows.push((l, resolved));
            }
        }

        let values = map_rows(client, &rows, |(l, targets)| {
            targets.iter().fold(init.clone(), |acc, r| {
                f(acc, (*l).clone(), (*r).clone())
            })
        });
        ColumnWrite::new(sources, values)
    }
}

/// Schemas a graph fold reads: the relation plus both joined queries
pub(crate) fn fold_inputs<E: Relation, L: QueryData, R: QueryData>() -> Vec<ComponentSchema> {
    let mut schemas = vec![E::schema()];
    for schema in L::schemas().into_iter().chain(R::schemas()) {
        if !schemas.iter().any(|s| s.id() == schema.id()) {
            schemas.push(schema);
        }
    }
    schemas
}
