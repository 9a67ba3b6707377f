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
//! Spinning rigid bodies under gravity
//!
//! Spawns a few bodies with anisotropic inertia, integrates them for two
//! seconds and prints pose, energy and angular momentum. Run with
//! `RUST_LOG=spatial_ecs=debug` to see per-tick events.

use glam::DVec3;
use spatial_ecs::prelude::*;
use spatial_ecs::spatial::{angular_momentum, kinetic_energy};
use tracing::info;
use tracing_subscriber::EnvFilter;

const GRAVITY: f64 = 9.81;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("spinning_body=info".parse()?))
        .init();

    let dt = 1.0 / 120.0;
    let mut builder = WorldBuilder::new();
    builder.spawn_globals(Globals::new(42, dt))?;
    let names = ["upright", "tumbling", "wobbling"];

    let inertia = SpatialInertia::new(1.0, DVec3::new(1.0, 2.0, 3.0));
    let spins = [DVec3::new(0.0, 0.0, 1.0), DVec3::new(1.0, 1.0, 0.0), DVec3::new(0.1, 3.0, 0.1)];
    let mut ids = Vec::new();
    for (i, (spin, name)) in spins.iter().zip(names).enumerate() {
        let body = Body::new(inertia)
            .with_pos(SpatialTransform::from_linear(DVec3::new(i as f64 * 2.0, 0.0, 10.0)))
            .with_vel(SpatialMotion::from_angular(*spin));
        ids.push(builder.spawn_named(body, name)?);
    }

    let gravity = map(|(inertia,): (Inertia,)| {
        let weight = -GRAVITY * inertia.inertia().mass;
        Force::from(SpatialForce::from_linear(DVec3::new(0.0, 0.0, weight)))
    })
    .with_name("gravity");
    let integrator = SixDof::from_sim_time_step().with_effector(gravity).build();
    let mut exec = builder.build_with(integrator, dt, Some(240))?;
    info!(stages = ?exec.pipeline().stage_names(), "pipeline ready");

    let client = Client::parallel().with_config(ExecConfig::from_env());
    while !exec.is_finished() {
        exec.run(&client)?;
    }

    for id in ids {
        let world = exec.world();
        let pose = world.get::<WorldPos>(id)?.map(|p| p.transform()).unwrap_or_default();
        let vel = world.get::<WorldVel>(id)?.map(|v| v.motion()).unwrap_or_default();
        info!(
            entity = %id,
            name = world.entity_name(id).unwrap_or("?"),
            position = ?pose.linear,
            orientation = ?pose.angular,
            energy = kinetic_energy(&pose, &vel, &inertia),
            momentum = ?angular_momentum(&pose, &vel, &inertia),
            "body state"
        );
    }
    info!(ticks = exec.tick(), "done");
    Ok(())
}
