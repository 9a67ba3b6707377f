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
//! Ordered graph fold over a small network
//!
//! Each node averages its own load with its neighbours' loads, visiting
//! outgoing edges in the order they were spawned.

use spatial_ecs::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

component!(
    /// Scalar load carried by a node
    pub struct Load(f64) => "load";
);

struct Node {
    load: f64,
}

impl Archetype for Node {
    fn into_bundle(self) -> Bundle {
        Bundle::of::<Node>().with(Load(self.load))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("graph_fold=info".parse()?))
        .init();

    let mut builder = WorldBuilder::new();
    let nodes = builder.spawn_batch([10.0, 0.0, 4.0, 2.0].map(|load| Node { load }))?;
    for (from, to) in [(0, 1), (0, 2), (1, 2), (2, 3), (3, 0)] {
        builder.spawn(Bundle::new("Link").with(Edge::new(nodes[from], nodes[to])))?;
    }

    let smooth = edge_fold::<Edge, (Load,), (Load,), _, _>(
        Load(0.0),
        |acc: Load, (own,): (Load,), (other,): (Load,)| {
            Load(0.5 * (acc.0 + 0.5 * (own.0 + other.0)))
        },
    )
    .with_name("smooth");
    let mut exec = builder.build(smooth)?;

    for _ in 0..5 {
        exec.run(&Client::cpu())?;
        let loads = exec.column_array(Load::component_id())?;
        info!(tick = exec.tick(), loads = ?loads.as_slice::<f64>(), "loads");
    }
    Ok(())
}
