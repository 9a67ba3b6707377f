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
//! Pipeline composition and query pass-through tests

use spatial_ecs::prelude::*;

component!(pub struct X(f64) => "x";);
component!(pub struct Y(f64) => "y";);
component!(pub struct E(f64) => "e";);

struct Test {
    x: f64,
    y: f64,
}

impl Archetype for Test {
    fn into_bundle(self) -> Bundle {
        Bundle::of::<Test>().with(X(self.x)).with(Y(self.y))
    }
}

struct Effect {
    e: f64,
}

impl Archetype for Effect {
    fn into_bundle(self) -> Bundle {
        Bundle::of::<Effect>().with(E(self.e))
    }
}

fn foo() -> impl System {
    map(|(x,): (X,)| X(x.0 * 2.0)).with_name("foo")
}

fn bar() -> impl System {
    map(|(x, y): (X, Y)| X(x.0 * y.0)).with_name("bar")
}

fn baz() -> impl System {
    map(|(x, e): (X, E)| X(x.0 + e.0)).with_name("baz")
}

fn basic_world() -> WorldBuilder {
    let mut builder = WorldBuilder::new();
    builder.spawn(Test { x: 1.0, y: 500.0 }).unwrap();
    let id = builder.spawn(Test { x: 15.0, y: 500.0 }).unwrap();
    builder.attach(id, Effect { e: 15.0 }).unwrap();
    builder
}

fn xs(exec: &Exec) -> Vec<f64> {
    exec.column_array(X::component_id())
        .unwrap()
        .as_slice::<f64>()
        .unwrap()
        .to_vec()
}

#[test]
fn test_basic_system() {
    let mut exec = basic_world().build(foo().pipe(bar()).pipe(baz())).unwrap();

    exec.run(&Client::cpu()).unwrap();
    assert_eq!(xs(&exec), vec![1000.0, 15015.0]);

    exec.run(&Client::cpu()).unwrap();
    assert_eq!(xs(&exec), vec![1_000_000.0, 15_015_015.0]);

    let ys = exec.column_array(Y::component_id()).unwrap();
    assert_eq!(ys.as_slice::<f64>().unwrap(), &[500.0, 500.0]);
}

#[test]
fn test_pipe_is_associative() {
    let mut left = basic_world().build(foo().pipe(bar()).pipe(baz())).unwrap();
    let mut right = basic_world().build(foo().pipe(bar().pipe(baz()))).unwrap();
    let mut free = basic_world().build(pipe(foo(), pipe(bar(), baz()))).unwrap();

    for _ in 0..3 {
        left.run(&Client::cpu()).unwrap();
        right.run(&Client::cpu()).unwrap();
        free.run(&Client::cpu()).unwrap();
        assert_eq!(xs(&left), xs(&right));
        assert_eq!(xs(&left), xs(&free));
    }
}

#[test]
fn test_order_is_declaration_order() {
    let mut forward = basic_world().build(foo().pipe(baz())).unwrap();
    let mut reversed = basic_world().build(baz().pipe(foo())).unwrap();
    forward.run(&Client::cpu()).unwrap();
    reversed.run(&Client::cpu()).unwrap();

    assert_eq!(xs(&forward), vec![2.0, 45.0]);
    assert_eq!(xs(&reversed), vec![2.0, 60.0]);
}

#[test]
fn test_parallel_client_matches_cpu() {
    let build = || {
        let mut builder = WorldBuilder::new();
        for i in 0..3000 {
            let id = builder.spawn(Test { x: i as f64, y: 1.5 }).unwrap();
            if i % 3 == 0 {
                builder.attach(id, Effect { e: 0.25 }).unwrap();
            }
        }
        builder.build(foo().pipe(bar()).pipe(baz())).unwrap()
    };
    let mut cpu = build();
    let mut parallel = build();
    let client = Client::parallel().with_config(ExecConfig::new(64).with_stage_logging());

    cpu.run_ticks(&Client::cpu(), 2).unwrap();
    parallel.run_ticks(&client, 2).unwrap();
    assert_eq!(xs(&cpu), xs(&parallel));
}

#[test]
fn test_mixed_archetype_queries() {
    let mut builder = WorldBuilder::new();
    let both = builder.spawn(Test { x: 1.0, y: 2.0 }).unwrap();
    let only_x = builder.spawn(Bundle::new("Lonely").with(X(3.0))).unwrap();
    builder.spawn(Bundle::new("OnlyY").with(Y(4.0))).unwrap();

    let world = builder.world();
    let pair = Query::<(X, Y)>::new(world).unwrap();
    assert_eq!(pair.entity_ids(), &[both]);

    let single = Query::<(X,)>::new(world).unwrap();
    assert_eq!(single.entity_ids(), &[both, only_x]);
    assert_eq!(single.get(only_x), Some(&(X(3.0),)));
}

#[test]
fn test_map_passes_through_unmatched_entities() {
    let mut exec = basic_world().build(baz()).unwrap();
    exec.run(&Client::cpu()).unwrap();
    // Only the second entity holds E.
    assert_eq!(xs(&exec), vec![1.0, 30.0]);
}

#[test]
fn test_archetype_names_are_normalized() {
    let exec = basic_world().build(foo()).unwrap();
    let names: Vec<String> = exec.world().archetypes().map(|n| n.to_string()).collect();
    // The globals singleton is spawned last, at build.
    assert_eq!(names, vec!["test", "effect", "globals"]);
}
