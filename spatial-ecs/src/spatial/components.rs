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
//! Rigid-body components
//!
//! Packed f64 columns for the physics pipeline, each convertible to and from
//! its algebra type.

use crate::ecs::{Archetype, Bundle};
use crate::spatial::algebra::{SpatialForce, SpatialInertia, SpatialMotion, SpatialTransform};

crate::component!(
    /// World-frame pose `[qx, qy, qz, qw, px, py, pz]`
    pub struct WorldPos([f64; 7]) => "world_pos";
);
crate::component!(
    /// World-frame spatial velocity `[ωx, ωy, ωz, vx, vy, vz]`
    pub struct WorldVel([f64; 6]) => "world_vel";
);
crate::component!(
    /// Spatial acceleration from the latest dynamics stage
    pub struct WorldAccel([f64; 6]) => "world_accel";
);
crate::component!(
    /// Spatial force `[τx, τy, τz, fx, fy, fz]`, recomputed every tick
    pub struct Force([f64; 6]) => "force";
);
crate::component!(
    /// Mass and principal moments `[m, Ixx, Iyy, Izz]`
    pub struct Inertia([f64; 4]) => "inertia";
);

impl WorldPos {
    /// Unpack
    pub fn transform(&self) -> SpatialTransform {
        SpatialTransform::from_array(self.0)
    }
}

impl From<SpatialTransform> for WorldPos {
    fn from(t: SpatialTransform) -> Self {
        WorldPos(t.to_array())
    }
}

impl WorldVel {
    /// Unpack
    pub fn motion(&self) -> SpatialMotion {
        SpatialMotion::from_array(self.0)
    }
}

impl From<SpatialMotion> for WorldVel {
    fn from(m: SpatialMotion) -> Self {
        WorldVel(m.to_array())
    }
}

impl WorldAccel {
    /// Unpack
    pub fn motion(&self) -> SpatialMotion {
        SpatialMotion::from_array(self.0)
    }
}

impl From<SpatialMotion> for WorldAccel {
    fn from(m: SpatialMotion) -> Self {
        WorldAccel(m.to_array())
    }
}

impl Force {
    /// Zero torque and force
    pub fn zero() -> Self {
        Force([0.0; 6])
    }

    /// Unpack
    pub fn force(&self) -> SpatialForce {
        SpatialForce::from_array(self.0)
    }
}

impl From<SpatialForce> for Force {
    fn from(f: SpatialForce) -> Self {
        Force(f.to_array())
    }
}

impl Inertia {
    /// Unpack
    pub fn inertia(&self) -> SpatialInertia {
        SpatialInertia::from_array(self.0)
    }
}

impl From<SpatialInertia> for Inertia {
    fn from(i: SpatialInertia) -> Self {
        Inertia(i.to_array())
    }
}

/// Rigid body archetype
///
/// # Examples
///
/// ```
/// use glam::DVec3;
/// use spatial_ecs::ecs::World;
/// use spatial_ecs::spatial::{Body, SpatialInertia, SpatialMotion};
///
/// let mut world = World::new();
/// let body = Body::new(SpatialInertia::from_mass(2.0))
///     .with_vel(SpatialMotion::from_linear(DVec3::X));
/// world.spawn(body).unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Body {
    /// Initial pose
    pub pos: SpatialTransform,
    /// Initial velocity
    pub vel: SpatialMotion,
    /// Mass properties
    pub inertia: SpatialInertia,
}

impl Body {
    /// Body at rest at the origin
    pub fn new(inertia: SpatialInertia) -> Self {
        Body {
            inertia,
            ..Self::default()
        }
    }

    /// Set the initial pose
    pub fn with_pos(mut self, pos: SpatialTransform) -> Self {
        self.pos = pos;
        self
    }

    /// Set the initial velocity
    pub fn with_vel(mut self, vel: SpatialMotion) -> Self {
        self.vel = vel;
        self
    }
}

impl Archetype for Body {
    fn into_bundle(self) -> Bundle {
        Bundle::of::<Body>()
            .with(WorldPos::from(self.pos))
            .with(WorldVel::from(self.vel))
            .with(WorldAccel([0.0; 6]))
            .with(Force::zero())
            .with(Inertia::from(self.inertia))
    }
}
