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
//! # Spatial ECS
//!
//! A columnar entity-component simulation runtime with a built-in
//! rigid-body integrator.
//!
//! ## Features
//!
//! - **Column Store**: Archetype-grouped, insertion-ordered component columns keyed by entity id
//! - **Queries**: Typed inner joins with pass-through `map` writes
//! - **Graph Folds**: Ordered per-source reductions over relation components
//! - **Pipelines**: Associative, strictly ordered composition of systems
//! - **Six-DoF Integration**: Quaternion exponential kinematics with gyroscopic dynamics
//! - **Parallelization**: Optional Rayon fan-out of per-entity work
//!
//! ## Example
//!
//! ```rust
//! use spatial_ecs::prelude::*;
//!
//! component!(pub struct X(f64) => "x";);
//! component!(pub struct Y(f64) => "y";);
//!
//! let mut builder = WorldBuilder::new();
//! builder.spawn(Bundle::new("Test").with(X(1.0)).with(Y(500.0))).unwrap();
//!
//! let double = map(|(x,): (X,)| X(x.0 * 2.0));
//! let scale = map(|(x, y): (X, Y)| X(x.0 * y.0));
//! let mut exec = builder.build(double.pipe(scale)).unwrap();
//!
//! exec.run(&Client::cpu()).unwrap();
//! let xs = exec.column_array(X::component_id()).unwrap();
//! assert_eq!(xs.as_slice::<f64>().unwrap(), &[1000.0]);
//! ```

#![warn(missing_docs)]

/// Opaque asset storage
pub mod assets;

/// Execution configuration
pub mod config;

/// Entity Component System implementation
pub mod ecs;

/// Error types
pub mod error;

/// Simulation-wide singleton components
pub mod globals;

/// Rigid-body integration pipeline
pub mod integration;

/// Deterministic keyed random sampling
pub mod random;

/// Spatial algebra and physics components
pub mod spatial;

pub use ecs::{EntityId, World};
pub use error::{Error, Result};

/// Common imports
pub mod prelude {
    pub use crate::component;
    pub use crate::config::{Client, ExecConfig};
    pub use crate::ecs::{
        edge_fold, map, pipe, Archetype, Bundle, Component, Edge, EntityId, Exec, FnSystem,
        GraphQuery, Pipeline, Query, Relation, System, SystemExt, World, WorldBuilder,
    };
    pub use crate::error::{Error, Result};
    pub use crate::globals::{Globals, Seed, SimulationTimeStep, Tick};
    pub use crate::integration::{six_dof, SixDof};
    pub use crate::spatial::{
        Body, Force, Inertia, SpatialForce, SpatialInertia, SpatialMotion, SpatialTransform,
        WorldAccel, WorldPos, WorldVel,
    };
}
