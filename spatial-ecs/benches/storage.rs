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
//! Benchmarks for the column store
//!
//! These benchmarks measure:
//! - Spawn throughput into one archetype table
//! - Column read-back across several tables
//! - Query join cost when components straddle attached tables

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spatial_ecs::prelude::*;

component!(pub struct X(f64) => "x";);
component!(pub struct Y(f64) => "y";);

fn populated(count: usize, attach: bool) -> World {
    let mut world = World::new();
    for i in 0..count {
        let id = world.spawn(Bundle::new("Base").with(X(i as f64))).unwrap();
        if attach {
            world.attach(id, Bundle::new("Extra").with(Y(2.0))).unwrap();
        }
    }
    world
}

/// Benchmark: Spawn N entities
fn bench_spawn(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn");

    for entity_count in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*entity_count as u64));
        group.bench_with_input(
            BenchmarkId::new("Body", entity_count),
            entity_count,
            |b, &count| {
                b.iter(|| {
                    let mut world = World::new();
                    for _ in 0..count {
                        world.spawn(Body::new(SpatialInertia::from_mass(1.0))).unwrap();
                    }
                    black_box(world);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: Read a component back as one array
fn bench_column_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("column_array");

    for entity_count in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*entity_count as u64));
        let world = populated(*entity_count, false);
        group.bench_with_input(
            BenchmarkId::new("x", entity_count),
            entity_count,
            |b, _| {
                b.iter(|| black_box(world.column_array(X::component_id()).unwrap()));
            },
        );
    }

    group.finish();
}

/// Benchmark: Two-component join across attached tables
fn bench_query_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_join");

    for entity_count in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*entity_count as u64));
        let world = populated(*entity_count, true);
        group.bench_with_input(
            BenchmarkId::new("x_y", entity_count),
            entity_count,
            |b, _| {
                b.iter(|| black_box(Query::<(X, Y)>::new(&world).unwrap().len()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_spawn, bench_column_array, bench_query_join);
criterion_main!(benches);
