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
//! Entity Component System (ECS) core implementation
//!
//! This module provides the columnar runtime:
//! - Entity ids and archetype-grouped column storage
//! - Typed joins over components and relation-typed graph folds
//! - Systems composed into ordered pipelines
//! - A builder and executor that advance the store tick by tick

mod archetype;
mod component;
mod entity;
mod exec;
mod graph;
mod query;
mod system;
mod world;

pub use archetype::{Archetype, ArchetypeName, Bundle, EntityLocation};
pub use component::{
    ColumnBuf, Component, ComponentId, ComponentSchema, ComponentValue, Elem, PrimType,
};
pub use entity::{EntityAllocator, EntityId};
pub use exec::{Exec, WorldBuilder};
pub use graph::{Edge, GraphQuery, Relation};
pub use query::{ColumnWrite, Query, QueryData};
pub use system::{
    edge_fold, map, pipe, EdgeFoldSystem, FnSystem, MapSystem, Pipeline, System, SystemExt,
};
pub use world::{ComponentArray, World};

#[cfg(test)]
mod tests {
    use super::*;

    crate::component!(struct X(f64) => "x";);

    #[test]
    fn test_world_creation() {
        let world = World::new();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_entity_creation() {
        let mut world = World::new();
        let entity = world.spawn(Bundle::new("Test").with(X(1.0))).unwrap();
        assert_eq!(world.entity_count(), 1);
        assert!(world.contains_entity(entity));
    }
}
