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
//! Six-degree-of-freedom rigid-body integration
//!
//! The integrator is an ordinary [`Pipeline`] of map systems over the
//! [`Body`](crate::spatial::Body) components, run once per tick:
//!
//! 1. **clear_forces**: reset [`Force`] to zero for every body
//! 2. **effector** (optional): user system writing [`Force`]
//! 3. **accelerate**: Euler's rigid-body equation, written to [`WorldAccel`]
//! 4. **integrate_velocity**: `ω' = ω + α·dt`, `v' = v + a·dt`
//! 5. **integrate_position**: `q' = normalize(exp(½·ω'·dt) ⊗ q)`, `p' = p + v'·dt`
//!
//! The position update uses the velocity just written (semi-implicit Euler),
//! and the quaternion exponential keeps the orientation unit-norm every step.
//! Force does not accumulate across ticks.
//!
//! The time step is either fixed when the pipeline is assembled
//! ([`SixDof::new`]) or read from the globals [`SimulationTimeStep`] at the
//! start of each integration stage ([`SixDof::from_sim_time_step`]).
//!
//! # Timestep Guidelines
//!
//! - Too small: Numerical precision issues and wasted computation
//! - Too large: Instability and inaccuracy, especially for fast spin
//! - Recommended: Start with dt = 1/60 (60 FPS) and adjust based on simulation needs

use crate::ecs::{map, FnSystem, Pipeline, Query, System};
use crate::globals::{sim_time_step, SimulationTimeStep};
use crate::spatial::{Force, Inertia, WorldAccel, WorldPos, WorldVel};

/// Builder for the rigid-body integration pipeline
///
/// # Examples
///
/// ```
/// use spatial_ecs::ecs::map;
/// use spatial_ecs::integration::SixDof;
/// use spatial_ecs::spatial::{Force, Inertia};
///
/// let gravity = map(|(inertia,): (Inertia,)| {
///     Force([0.0, 0.0, 0.0, 0.0, 0.0, -9.81 * inertia.0[0]])
/// });
/// let pipeline = SixDof::new(1.0 / 60.0).with_effector(gravity).build();
/// assert_eq!(pipeline.len(), 5);
/// ```
pub struct SixDof {
    dt: Option<f64>,
    effector: Option<Pipeline>,
}

impl SixDof {
    /// Create an integrator with the given time step
    ///
    /// # Panics
    ///
    /// Panics if `dt` is non-positive, NaN, or infinite
    pub fn new(dt: f64) -> Self {
        assert!(dt > 0.0 && dt.is_finite(), "Time step must be positive and finite");
        SixDof {
            dt: Some(dt),
            effector: None,
        }
    }

    /// Create an integrator that reads the globals time step every tick
    pub fn from_sim_time_step() -> Self {
        SixDof {
            dt: None,
            effector: None,
        }
    }

    /// Fixed time step in seconds, `None` when read from the globals
    pub fn time_step(&self) -> Option<f64> {
        self.dt
    }

    /// Run `effector` after forces are cleared and before dynamics
    pub fn with_effector<S: System + 'static>(mut self, effector: S) -> Self {
        self.effector = Some(Pipeline::new().then(effector));
        self
    }

    /// Validate the time step for stability
    ///
    /// Returns a warning if the time step might cause numerical issues.
    /// Extremely small steps lose precision, while large steps make the
    /// rotation per tick too coarse.
    pub fn validate_time_step(&self) -> Result<(), String> {
        let Some(dt) = self.dt else {
            return Ok(());
        };

        if dt < 1e-9 {
            return Err(format!(
                "Warning: Time step {} is extremely small and may cause precision loss with f64.",
                dt
            ));
        }

        if dt > 1.0 {
            return Err(format!(
                "Warning: Time step {} is large and may cause instability. \
                Consider using smaller time steps for better accuracy.",
                dt
            ));
        }

        Ok(())
    }

    /// Assemble the stages
    pub fn build(self) -> Pipeline {
        if let Err(warning) = self.validate_time_step() {
            tracing::warn!(dt = ?self.dt, "{}", warning);
        }
        let pipeline = Pipeline::new()
            .then(clear_forces())
            .then_some(self.effector)
            .then(accelerate());
        match self.dt {
            Some(dt) => pipeline
                .then(integrate_velocity(dt))
                .then(integrate_position(dt)),
            None => pipeline
                .then(integrate_velocity_from_globals())
                .then(integrate_position_from_globals()),
        }
    }
}

/// Integration pipeline without an effector
///
/// # Panics
///
/// Panics if `dt` is non-positive, NaN, or infinite
pub fn six_dof(dt: f64) -> Pipeline {
    SixDof::new(dt).build()
}

/// Reset every body's force to zero
pub fn clear_forces() -> impl System {
    map(|(_,): (Force,)| Force::zero()).with_name("clear_forces")
}

/// Compute spatial acceleration from pose, velocity, inertia and force
pub fn accelerate() -> impl System {
    map(|(pos, vel, inertia, force): (WorldPos, WorldVel, Inertia, Force)| {
        let accel = inertia
            .inertia()
            .accelerate(&pos.transform(), &vel.motion(), &force.force());
        WorldAccel::from(accel)
    })
    .with_name("accelerate")
}

/// Semi-implicit velocity update
pub fn integrate_velocity(dt: f64) -> impl System {
    map(move |(vel, accel): (WorldVel, WorldAccel)| {
        WorldVel::from(vel.motion().integrate(&accel.motion(), dt))
    })
    .with_name("integrate_velocity")
}

/// Pose update from the freshly integrated velocity
pub fn integrate_position(dt: f64) -> impl System {
    map(move |(pos, vel): (WorldPos, WorldVel)| {
        WorldPos::from(pos.transform().integrate(&vel.motion(), dt))
    })
    .with_name("integrate_position")
}

/// [`integrate_velocity`] with the step read from [`SimulationTimeStep`]
pub fn integrate_velocity_from_globals() -> impl System {
    FnSystem::new("integrate_velocity", |world, client| {
        let dt = sim_time_step(world)?;
        Query::<(WorldVel, WorldAccel)>::new(world)?
            .map_with(client, move |(vel, accel)| {
                WorldVel::from(vel.motion().integrate(&accel.motion(), dt))
            })
            .apply(world)
    })
    .with_input::<WorldVel>()
    .with_input::<WorldAccel>()
    .with_input::<SimulationTimeStep>()
    .with_output::<WorldVel>()
}

/// [`integrate_position`] with the step read from [`SimulationTimeStep`]
pub fn integrate_position_from_globals() -> impl System {
    FnSystem::new("integrate_position", |world, client| {
        let dt = sim_time_step(world)?;
        Query::<(WorldPos, WorldVel)>::new(world)?
            .map_with(client, move |(pos, vel)| {
                WorldPos::from(pos.transform().integrate(&vel.motion(), dt))
            })
            .apply(world)
    })
    .with_input::<WorldPos>()
    .with_input::<WorldVel>()
    .with_input::<SimulationTimeStep>()
    .with_output::<WorldPos>()
}
