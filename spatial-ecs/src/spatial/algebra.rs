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
//! Quaternion and spatial-vector algebra
//!
//! Spatial quantities pair an angular part with a linear part. Packed
//! layouts put the angular part first:
//!
//! - transform: `[qx, qy, qz, qw, px, py, pz]`
//! - motion: `[ωx, ωy, ωz, vx, vy, vz]`
//! - force: `[τx, τy, τz, fx, fy, fz]`
//!
//! Angular velocity and torque are expressed in the world frame, the same
//! frame as the pose. Principal moments of inertia are expressed in the body
//! frame.

use glam::{DQuat, DVec3};

/// Unit moments used by [`SpatialInertia::from_mass`], scaled by mass
pub const DEFAULT_UNIT_MOMENTS: [f64; 3] = [1.0, 1.0, 1.0];

/// Quaternion exponential of the pure quaternion `(v, 0)`
///
/// Maps a half-angle rotation vector to a unit quaternion. Small arguments
/// use the series expansion of `sin(θ)/θ`.
pub fn quat_exp(v: DVec3) -> DQuat {
    let theta = v.length();
    let (sin, cos) = theta.sin_cos();
    let k = if theta < 1e-8 {
        1.0 - theta * theta / 6.0
    } else {
        sin / theta
    };
    DQuat::from_xyzw(v.x * k, v.y * k, v.z * k, cos)
}

/// Rigid pose: orientation then position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialTransform {
    /// Unit orientation quaternion
    pub angular: DQuat,
    /// Position
    pub linear: DVec3,
}

impl SpatialTransform {
    /// Create a transform
    pub fn new(angular: DQuat, linear: DVec3) -> Self {
        SpatialTransform { angular, linear }
    }

    /// Identity orientation at the origin
    pub fn identity() -> Self {
        SpatialTransform::new(DQuat::IDENTITY, DVec3::ZERO)
    }

    /// Identity orientation at `linear`
    pub fn from_linear(linear: DVec3) -> Self {
        SpatialTransform::new(DQuat::IDENTITY, linear)
    }

    /// `angular` orientation at the origin
    pub fn from_angular(angular: DQuat) -> Self {
        SpatialTransform::new(angular, DVec3::ZERO)
    }

    /// Pack as `[qx, qy, qz, qw, px, py, pz]`
    pub fn to_array(&self) -> [f64; 7] {
        let q = self.angular.to_array();
        let p = self.linear.to_array();
        [q[0], q[1], q[2], q[3], p[0], p[1], p[2]]
    }

    /// Unpack from `[qx, qy, qz, qw, px, py, pz]`
    pub fn from_array(a: [f64; 7]) -> Self {
        SpatialTransform::new(
            DQuat::from_xyzw(a[0], a[1], a[2], a[3]),
            DVec3::new(a[4], a[5], a[6]),
        )
    }

    /// Advance by a motion over `dt`
    ///
    /// `q' = normalize(exp(½·ω·dt) ⊗ q)` and `p' = p + v·dt`. With the
    /// angular velocity in the world frame this is the same rotation as
    /// `q ⊗ exp(½·ω_body·dt)`.
    pub fn integrate(&self, motion: &SpatialMotion, dt: f64) -> Self {
        let delta = quat_exp(motion.angular * (0.5 * dt));
        SpatialTransform::new(
            (delta * self.angular).normalize(),
            self.linear + motion.linear * dt,
        )
    }

    /// Rotate a world-frame vector into the body frame
    pub fn to_body(&self, v: DVec3) -> DVec3 {
        self.angular.inverse() * v
    }

    /// Rotate a body-frame vector into the world frame
    pub fn to_world(&self, v: DVec3) -> DVec3 {
        self.angular * v
    }
}

impl Default for SpatialTransform {
    fn default() -> Self {
        SpatialTransform::identity()
    }
}

/// Spatial velocity or acceleration: angular then linear
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpatialMotion {
    /// Angular part
    pub angular: DVec3,
    /// Linear part
    pub linear: DVec3,
}

impl SpatialMotion {
    /// Create a motion
    pub fn new(angular: DVec3, linear: DVec3) -> Self {
        SpatialMotion { angular, linear }
    }

    /// Pure linear motion
    pub fn from_linear(linear: DVec3) -> Self {
        SpatialMotion::new(DVec3::ZERO, linear)
    }

    /// Pure angular motion
    pub fn from_angular(angular: DVec3) -> Self {
        SpatialMotion::new(angular, DVec3::ZERO)
    }

    /// Pack as `[ωx, ωy, ωz, vx, vy, vz]`
    pub fn to_array(&self) -> [f64; 6] {
        pack6(self.angular, self.linear)
    }

    /// Unpack from `[ωx, ωy, ωz, vx, vy, vz]`
    pub fn from_array(a: [f64; 6]) -> Self {
        let (angular, linear) = unpack6(a);
        SpatialMotion::new(angular, linear)
    }

    /// Semi-implicit update: `self + accel·dt`
    pub fn integrate(&self, accel: &SpatialMotion, dt: f64) -> Self {
        SpatialMotion::new(
            self.angular + accel.angular * dt,
            self.linear + accel.linear * dt,
        )
    }
}

/// Spatial force: torque then linear force
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpatialForce {
    /// Torque
    pub torque: DVec3,
    /// Linear force
    pub force: DVec3,
}

impl SpatialForce {
    /// Create a force
    pub fn new(torque: DVec3, force: DVec3) -> Self {
        SpatialForce { torque, force }
    }

    /// Pure linear force
    pub fn from_linear(force: DVec3) -> Self {
        SpatialForce::new(DVec3::ZERO, force)
    }

    /// Pure torque
    pub fn from_torque(torque: DVec3) -> Self {
        SpatialForce::new(torque, DVec3::ZERO)
    }

    /// Pack as `[τx, τy, τz, fx, fy, fz]`
    pub fn to_array(&self) -> [f64; 6] {
        pack6(self.torque, self.force)
    }

    /// Unpack from `[τx, τy, τz, fx, fy, fz]`
    pub fn from_array(a: [f64; 6]) -> Self {
        let (torque, force) = unpack6(a);
        SpatialForce::new(torque, force)
    }
}

impl std::ops::Add for SpatialForce {
    type Output = SpatialForce;

    fn add(self, rhs: SpatialForce) -> SpatialForce {
        SpatialForce::new(self.torque + rhs.torque, self.force + rhs.force)
    }
}

/// Mass plus principal moments of inertia (body frame)
///
/// A mass or moment below [`SpatialInertia::IMMOVABLE_THRESHOLD`] is treated
/// as infinite along that axis: no force or torque accelerates it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialInertia {
    /// Mass
    pub mass: f64,
    /// Principal moments
    pub moments: DVec3,
}

impl SpatialInertia {
    /// Threshold below which mass is considered effectively zero (immovable)
    pub const IMMOVABLE_THRESHOLD: f64 = 1e-10;

    /// Create from mass and principal moments
    pub fn new(mass: f64, moments: DVec3) -> Self {
        SpatialInertia { mass, moments }
    }

    /// Mass with the default moments, [`DEFAULT_UNIT_MOMENTS`] scaled by mass
    pub fn from_mass(mass: f64) -> Self {
        SpatialInertia::from_mass_with(mass, DEFAULT_UNIT_MOMENTS)
    }

    /// Mass with `unit_moments` scaled by mass
    pub fn from_mass_with(mass: f64, unit_moments: [f64; 3]) -> Self {
        SpatialInertia::new(mass, DVec3::from_array(unit_moments) * mass)
    }

    /// Pack as `[m, Ixx, Iyy, Izz]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.mass, self.moments.x, self.moments.y, self.moments.z]
    }

    /// Unpack from `[m, Ixx, Iyy, Izz]`
    pub fn from_array(a: [f64; 4]) -> Self {
        SpatialInertia::new(a[0], DVec3::new(a[1], a[2], a[3]))
    }

    /// Whether the body cannot be translated
    pub fn is_immovable(&self) -> bool {
        self.mass.abs() < Self::IMMOVABLE_THRESHOLD
    }

    /// Acceleration produced by `force` on a body at `pose` moving with `vel`
    ///
    /// Angular: `α = I⁻¹·(τ − ω × (I·ω))`, evaluated in the body frame and
    /// rotated back to the world frame. Linear: `a = f / m`.
    pub fn accelerate(
        &self,
        pose: &SpatialTransform,
        vel: &SpatialMotion,
        force: &SpatialForce,
    ) -> SpatialMotion {
        let omega = pose.to_body(vel.angular);
        let torque = pose.to_body(force.torque);
        let net = torque - omega.cross(self.moments * omega);
        let alpha = DVec3::new(
            safe_div(net.x, self.moments.x),
            safe_div(net.y, self.moments.y),
            safe_div(net.z, self.moments.z),
        );

        let linear = if self.is_immovable() {
            DVec3::ZERO
        } else {
            force.force / self.mass
        };
        SpatialMotion::new(pose.to_world(alpha), linear)
    }
}

impl Default for SpatialInertia {
    fn default() -> Self {
        SpatialInertia::from_mass(1.0)
    }
}

fn safe_div(n: f64, d: f64) -> f64 {
    if d.abs() < SpatialInertia::IMMOVABLE_THRESHOLD {
        0.0
    } else {
        n / d
    }
}

fn pack6(a: DVec3, b: DVec3) -> [f64; 6] {
    [a.x, a.y, a.z, b.x, b.y, b.z]
}

fn unpack6(a: [f64; 6]) -> (DVec3, DVec3) {
    (DVec3::new(a[0], a[1], a[2]), DVec3::new(a[3], a[4], a[5]))
}

/// Kinetic energy `½·m·v² + ½·ω·(I·ω)`
pub fn kinetic_energy(
    pose: &SpatialTransform,
    vel: &SpatialMotion,
    inertia: &SpatialInertia,
) -> f64 {
    let omega = pose.to_body(vel.angular);
    let linear = if inertia.is_immovable() {
        0.0
    } else {
        0.5 * inertia.mass * vel.linear.length_squared()
    };
    linear + 0.5 * omega.dot(inertia.moments * omega)
}

/// Angular momentum about the center of mass, world frame
pub fn angular_momentum(
    pose: &SpatialTransform,
    vel: &SpatialMotion,
    inertia: &SpatialInertia,
) -> DVec3 {
    let omega = pose.to_body(vel.angular);
    pose.to_world(inertia.moments * omega)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_quat_exp_zero_is_identity() {
        assert_eq!(quat_exp(DVec3::ZERO), DQuat::IDENTITY);
    }

    #[test]
    fn test_quat_exp_half_angle() {
        let q = quat_exp(DVec3::new(0.0, 0.0, 0.25));
        let expected = DQuat::from_rotation_z(0.5);
        assert!((q.z - expected.z).abs() < EPS);
        assert!((q.w - expected.w).abs() < EPS);
        assert!((q.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_quat_exp_small_angle_is_unit() {
        let q = quat_exp(DVec3::new(1e-10, -2e-10, 3e-10));
        assert!((q.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_transform_array_layout() {
        let t = SpatialTransform::from_linear(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.to_array(), [0.0, 0.0, 0.0, 1.0, 1.0, 2.0, 3.0]);
        assert_eq!(SpatialTransform::from_array(t.to_array()), t);
    }

    #[test]
    fn test_from_mass_default_moments() {
        let inertia = SpatialInertia::from_mass(2.0);
        assert_eq!(inertia.to_array(), [2.0, 2.0, 2.0, 2.0]);
        let custom = SpatialInertia::from_mass_with(2.0, [0.4, 0.4, 0.4]);
        assert_eq!(custom.moments, DVec3::splat(0.8));
    }

    #[test]
    fn test_linear_acceleration() {
        let inertia = SpatialInertia::from_mass(4.0);
        let accel = inertia.accelerate(
            &SpatialTransform::identity(),
            &SpatialMotion::default(),
            &SpatialForce::from_linear(DVec3::new(8.0, 0.0, 0.0)),
        );
        assert_eq!(accel.linear, DVec3::new(2.0, 0.0, 0.0));
        assert_eq!(accel.angular, DVec3::ZERO);
    }

    #[test]
    fn test_immovable_body_does_not_accelerate() {
        let inertia = SpatialInertia::new(0.0, DVec3::ZERO);
        let accel = inertia.accelerate(
            &SpatialTransform::identity(),
            &SpatialMotion::from_angular(DVec3::X),
            &SpatialForce::new(DVec3::ONE, DVec3::ONE),
        );
        assert_eq!(accel, SpatialMotion::default());
    }

    #[test]
    fn test_gyroscopic_term() {
        // ω × Iω = (1,1,0) × (1,2,0) = (0,0,1), so α = -(0,0,1)/3.
        let inertia = SpatialInertia::new(1.0, DVec3::new(1.0, 2.0, 3.0));
        let accel = inertia.accelerate(
            &SpatialTransform::identity(),
            &SpatialMotion::from_angular(DVec3::new(1.0, 1.0, 0.0)),
            &SpatialForce::default(),
        );
        assert!((accel.angular.z + 1.0 / 3.0).abs() < EPS);
        assert!(accel.angular.x.abs() < EPS);
    }

    #[test]
    fn test_torque_is_world_frame() {
        // Body rotated a quarter turn about z; world torque about x lands on body y.
        let quarter = DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2);
        let pose = SpatialTransform::from_angular(quarter);
        let inertia = SpatialInertia::new(1.0, DVec3::new(1.0, 4.0, 1.0));
        let accel = inertia.accelerate(
            &pose,
            &SpatialMotion::default(),
            &SpatialForce::from_torque(DVec3::X),
        );
        assert!((accel.angular.x - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_energy_and_momentum() {
        let pose = SpatialTransform::identity();
        let vel = SpatialMotion::new(DVec3::new(0.0, 0.0, 2.0), DVec3::new(3.0, 0.0, 0.0));
        let inertia = SpatialInertia::new(2.0, DVec3::new(1.0, 1.0, 0.5));
        assert!((kinetic_energy(&pose, &vel, &inertia) - (9.0 + 1.0)).abs() < EPS);
        assert_eq!(angular_momentum(&pose, &vel, &inertia), DVec3::new(0.0, 0.0, 1.0));
    }
}
