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
//! Simulation-wide singleton components
//!
//! Seed, tick counter and time step live on one designated entity and are
//! read with ordinary queries. Every built pipeline has exactly one globals
//! entity and advances its [`Tick`] before any user stage runs.

use crate::ecs::{map, Archetype, Bundle, MapSystem, Query, World};
use crate::error::{Result, SchemaError};
use crate::random::RngKey;

/// Default simulation time step, 120 Hz
pub const DEFAULT_TIME_STEP: f64 = 1.0 / 120.0;

crate::component!(
    /// Base seed for keyed random sampling
    pub struct Seed(u64) => "seed";
);
crate::component!(
    /// Number of completed ticks
    pub struct Tick(u64) => "tick";
);
crate::component!(
    /// Fixed simulation time step in seconds
    pub struct SimulationTimeStep(f64) => "simulation_time_step";
);

impl Seed {
    /// Sampling key for this seed
    pub fn key(&self) -> RngKey {
        RngKey::new(self.0)
    }
}

/// The globals singleton
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Globals {
    /// Base seed
    pub seed: u64,
    /// Time step in seconds
    pub time_step: f64,
}

impl Globals {
    /// Globals with the given seed and time step, tick zero
    pub fn new(seed: u64, time_step: f64) -> Self {
        Globals { seed, time_step }
    }
}

impl Default for Globals {
    fn default() -> Self {
        Self::new(0, DEFAULT_TIME_STEP)
    }
}

impl Archetype for Globals {
    fn into_bundle(self) -> Bundle {
        Bundle::of::<Globals>()
            .with(Seed(self.seed))
            .with(Tick(0))
            .with(SimulationTimeStep(self.time_step))
    }
}

type TickFn = fn((Tick,)) -> Tick;

/// Stage that advances the tick counter by one
pub fn increment_tick() -> MapSystem<(Tick,), Tick, TickFn> {
    let f: TickFn = |(tick,)| Tick(tick.0 + 1);
    map(f).with_name("increment_tick")
}

/// Read the simulation time step from the globals entity
pub fn sim_time_step(world: &World) -> Result<f64> {
    let steps = Query::<(SimulationTimeStep,)>::new(world)?;
    match steps.rows().first() {
        Some((step,)) => Ok(step.0),
        None => Err(SchemaError::UnresolvedComponent {
            component: "simulation_time_step".to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Client;
    use crate::ecs::System;

    #[test]
    fn test_globals_archetype_name() {
        let bundle = Globals::default().into_bundle();
        assert_eq!(bundle.name().as_str(), "globals");
        assert_eq!(bundle.values().len(), 3);
    }

    #[test]
    fn test_increment_tick() {
        let mut world = World::new();
        let id = world.spawn(Globals::new(3, 0.01)).unwrap();
        let stage = increment_tick();
        stage.run(&mut world, &Client::cpu()).unwrap();
        stage.run(&mut world, &Client::cpu()).unwrap();
        assert_eq!(world.get::<Tick>(id).unwrap(), Some(Tick(2)));
        assert_eq!(world.get::<Seed>(id).unwrap().map(|s| s.key()), Some(RngKey::new(3)));
    }

    #[test]
    fn test_sim_time_step_read() {
        let mut world = World::new();
        assert!(sim_time_step(&world).is_err());
        world.spawn(Globals::new(0, 0.25)).unwrap();
        assert_eq!(sim_time_step(&world).unwrap(), 0.25);
        assert_eq!(Globals::default().time_step, DEFAULT_TIME_STEP);
    }
}
