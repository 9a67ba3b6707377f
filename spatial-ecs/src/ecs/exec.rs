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
//! World building and tick execution
//!
//! [`WorldBuilder`] collects spawns and attaches. [`WorldBuilder::build`]
//! binds a system to the finished store, validates once that every input
//! component referenced anywhere in the chain is stored somewhere, and
//! freezes the store's schema. The resulting [`Exec`] owns the store and
//! advances it one tick per [`Exec::run`]; each run sees everything the
//! previous runs wrote.
//!
//! Every built store carries one [`Globals`] entity. Its tick counter is
//! advanced by the first stage of each run, and its time step is set by
//! [`WorldBuilder::build_with`].

use crate::assets::{Asset, Handle};
use crate::config::Client;
use crate::ecs::archetype::Archetype;
use crate::ecs::component::ComponentId;
use crate::ecs::entity::EntityId;
use crate::ecs::query::Query;
use crate::ecs::system::{Pipeline, System};
use crate::ecs::world::{ComponentArray, World};
use crate::error::{Result, SchemaError, TickLimitError};
use crate::globals::{increment_tick, sim_time_step, Globals, SimulationTimeStep, Tick};

/// Builder-phase owner of the store
#[derive(Default)]
pub struct WorldBuilder {
    world: World,
    globals: Option<EntityId>,
}

impl WorldBuilder {
    /// Create a builder around an empty store
    pub fn new() -> Self {
        WorldBuilder {
            world: World::new(),
            globals: None,
        }
    }

    /// Spawn one entity
    pub fn spawn(&mut self, archetype: impl Archetype) -> Result<EntityId> {
        self.world.spawn(archetype)
    }

    /// Spawn one entity with a display name
    pub fn spawn_named(
        &mut self,
        archetype: impl Archetype,
        name: impl Into<String>,
    ) -> Result<EntityId> {
        self.world.spawn_named(archetype, name)
    }

    /// Spawn one entity per item
    pub fn spawn_batch<A, I>(&mut self, archetypes: I) -> Result<Vec<EntityId>>
    where
        A: Archetype,
        I: IntoIterator<Item = A>,
    {
        self.world.spawn_batch(archetypes)
    }

    /// Add another archetype membership to an existing entity
    pub fn attach(&mut self, entity: EntityId, archetype: impl Archetype) -> Result<()> {
        self.world.attach(entity, archetype)
    }

    /// Store an opaque asset
    pub fn insert_asset<T: Asset>(&mut self, asset: T) -> Handle<T> {
        self.world.insert_asset(asset)
    }

    /// Spawn the globals singleton
    ///
    /// A second call returns the existing entity unchanged. Without this
    /// call, [`WorldBuilder::build`] spawns [`Globals::default`].
    pub fn spawn_globals(&mut self, globals: Globals) -> Result<EntityId> {
        if let Some(id) = self.globals {
            tracing::warn!(entity = %id, "globals already spawned");
            return Ok(id);
        }
        let id = self.world.spawn(globals)?;
        self.globals = Some(id);
        Ok(id)
    }

    /// Store built so far
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Bind `system` to the store and freeze its schema
    ///
    /// The tick counter stage runs first, so every user stage of a tick
    /// sees the tick it belongs to. The simulation time step is whatever
    /// the globals entity holds.
    pub fn build(self, system: impl System + 'static) -> Result<Exec> {
        self.build_inner(system, None, None)
    }

    /// Like [`WorldBuilder::build`], also setting the simulation time step
    /// and an optional tick limit
    ///
    /// # Panics
    ///
    /// Panics if `sim_time_step` is non-positive, NaN, or infinite
    pub fn build_with(
        self,
        system: impl System + 'static,
        sim_time_step: f64,
        max_ticks: Option<u64>,
    ) -> Result<Exec> {
        assert!(
            sim_time_step > 0.0 && sim_time_step.is_finite(),
            "Time step must be positive and finite"
        );
        self.build_inner(system, Some(sim_time_step), max_ticks)
    }

    fn build_inner(
        mut self,
        system: impl System + 'static,
        time_step: Option<f64>,
        max_ticks: Option<u64>,
    ) -> Result<Exec> {
        let globals = self.ensure_globals()?;
        if let Some(dt) = time_step {
            self.world.write(&[globals], &[SimulationTimeStep(dt)])?;
        }

        let mut world = self.world;
        let pipeline = Pipeline::new().then(increment_tick()).then(system);

        for schema in pipeline.referenced_inputs() {
            if !world.has_component(schema.id()) {
                return Err(SchemaError::UnresolvedComponent {
                    component: schema.name().to_string(),
                }
                .into());
            }
            world.check_schema(&schema)?;
        }
        world.freeze();

        tracing::info!(
            entities = world.entity_count(),
            archetypes = world.archetypes().count(),
            stages = pipeline.len(),
            time_step = sim_time_step(&world)?,
            max_ticks = ?max_ticks,
            "built pipeline"
        );
        Ok(Exec {
            world,
            pipeline,
            globals,
            ticks: 0,
            max_ticks,
        })
    }

    fn ensure_globals(&mut self) -> Result<EntityId> {
        if let Some(id) = self.globals {
            return Ok(id);
        }
        // Globals spawned as a plain archetype are adopted, not duplicated.
        let existing = Query::<(Tick,)>::new(&self.world)?.entity_ids().first().copied();
        let id = match existing {
            Some(id) => id,
            None => self.world.spawn(Globals::default())?,
        };
        self.globals = Some(id);
        Ok(id)
    }
}

/// A built pipeline bound to its store
pub struct Exec {
    world: World,
    pipeline: Pipeline,
    globals: EntityId,
    ticks: u64,
    max_ticks: Option<u64>,
}

impl Exec {
    /// Run every stage once, in order
    ///
    /// On failure, stages before the failing one stay committed and the
    /// failing stage has written nothing. Once the tick limit is reached
    /// every further call fails with [`TickLimitError`] without running.
    pub fn run(&mut self, client: &Client) -> Result<()> {
        if let Some(max_ticks) = self.max_ticks {
            if self.ticks >= max_ticks {
                return Err(TickLimitError { max_ticks }.into());
            }
        }
        tracing::debug!(tick = self.ticks, "running tick");
        self.pipeline.run(&mut self.world, client)?;
        self.ticks += 1;
        Ok(())
    }

    /// Run `n` ticks, stopping at the first failure
    pub fn run_ticks(&mut self, client: &Client, n: usize) -> Result<()> {
        for _ in 0..n {
            self.run(client)?;
        }
        Ok(())
    }

    /// Number of completed ticks
    pub fn tick(&self) -> u64 {
        self.ticks
    }

    /// Configured tick limit
    pub fn max_ticks(&self) -> Option<u64> {
        self.max_ticks
    }

    /// Whether the tick limit has been reached
    pub fn is_finished(&self) -> bool {
        self.max_ticks.is_some_and(|max| self.ticks >= max)
    }

    /// The globals singleton
    pub fn globals(&self) -> EntityId {
        self.globals
    }

    /// Simulation time step held by the globals entity
    pub fn time_step(&self) -> Result<f64> {
        sim_time_step(&self.world)
    }

    /// Read a component back in store order
    pub fn column_array(&self, id: ComponentId) -> Result<ComponentArray> {
        self.world.column_array(id)
    }

    /// Bound store
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Compiled stages
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}
