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
//! Graph fold tests

use spatial_ecs::prelude::*;

component!(pub struct X(f64) => "x";);
component!(pub struct Total(f64) => "total";);

fn node(x: f64) -> Bundle {
    Bundle::new("Node").with(X(x))
}

fn link(from: EntityId, to: EntityId) -> Bundle {
    Bundle::new("Link").with(Edge::new(from, to))
}

fn sum_fold() -> impl System {
    edge_fold::<Edge, (X,), (X,), _, _>(X(5.0), |acc: X, (l,): (X,), (r,): (X,)| {
        X(acc.0 + l.0 + r.0)
    })
}

#[test]
fn test_edge_fold_pass_through() {
    let mut builder = WorldBuilder::new();
    let a = builder.spawn(node(1.0)).unwrap();
    let b = builder.spawn(node(2.0)).unwrap();
    let c = builder.spawn(node(2.0)).unwrap();
    builder.spawn(link(a, b)).unwrap();
    builder.spawn(link(a, c)).unwrap();
    builder.spawn(link(b, c)).unwrap();

    let mut exec = builder.build(sum_fold()).unwrap();
    exec.run(&Client::cpu()).unwrap();

    let xs = exec.column_array(X::component_id()).unwrap();
    assert_eq!(xs.as_slice::<f64>().unwrap(), &[11.0, 9.0, 2.0]);
}

#[test]
fn test_edge_insertion_order_is_observable() {
    // acc * 10 + target: a digit per edge in insertion order.
    let digits = || {
        edge_fold::<Edge, (X,), (X,), _, _>(X(0.0), |acc: X, _: (X,), (r,): (X,)| {
            X(acc.0 * 10.0 + r.0)
        })
    };

    let run = |reverse: bool| {
        let mut builder = WorldBuilder::new();
        let a = builder.spawn(node(0.0)).unwrap();
        let b = builder.spawn(node(1.0)).unwrap();
        let c = builder.spawn(node(2.0)).unwrap();
        if reverse {
            builder.spawn(link(a, c)).unwrap();
            builder.spawn(link(a, b)).unwrap();
        } else {
            builder.spawn(link(a, b)).unwrap();
            builder.spawn(link(a, c)).unwrap();
        }
        let mut exec = builder.build(digits()).unwrap();
        exec.run(&Client::cpu()).unwrap();
        exec.world().get::<X>(a).unwrap()
    };

    assert_eq!(run(false), Some(X(12.0)));
    assert_eq!(run(true), Some(X(21.0)));
}

#[test]
fn test_cycles_fold_from_current_values() {
    let mut builder = WorldBuilder::new();
    let a = builder.spawn(node(1.0)).unwrap();
    let b = builder.spawn(node(2.0)).unwrap();
    builder.spawn(link(a, b)).unwrap();
    builder.spawn(link(b, a)).unwrap();

    let mut exec = builder.build(sum_fold()).unwrap();
    exec.run(&Client::cpu()).unwrap();
    // Both sources read the pre-stage values: a = 5+1+2, b = 5+2+1.
    let xs = exec.column_array(X::component_id()).unwrap();
    assert_eq!(xs.as_slice::<f64>().unwrap(), &[8.0, 8.0]);

    exec.run(&Client::cpu()).unwrap();
    let xs = exec.column_array(X::component_id()).unwrap();
    assert_eq!(xs.as_slice::<f64>().unwrap(), &[21.0, 21.0]);
}

#[test]
fn test_edges_attached_to_nodes() {
    // Edges may live on the node entities themselves.
    let mut builder = WorldBuilder::new();
    let a = builder.spawn(node(1.0)).unwrap();
    let b = builder.spawn(node(2.0)).unwrap();
    builder.attach(a, Bundle::new("Out").with(Edge::new(a, b))).unwrap();

    let mut exec = builder.build(sum_fold()).unwrap();
    exec.run(&Client::cpu()).unwrap();
    assert_eq!(exec.world().get::<X>(a).unwrap(), Some(X(8.0)));
    assert_eq!(exec.world().get::<X>(b).unwrap(), Some(X(2.0)));
}

#[test]
fn test_fold_into_source_without_output_fails() {
    let tally = |x: f64| Bundle::new("Tally").with(X(x)).with(Total(0.0));
    let mut builder = WorldBuilder::new();
    let a = builder.spawn(tally(1.0)).unwrap();
    let bare = builder.spawn(node(2.0)).unwrap();
    let c = builder.spawn(tally(3.0)).unwrap();
    builder.spawn(link(a, c)).unwrap();
    builder.spawn(link(bare, a)).unwrap();
    builder.spawn(link(c, bare)).unwrap();

    let totals = edge_fold::<Edge, (X,), (X,), _, _>(
        Total(0.0),
        |acc: Total, (l,): (X,), (r,): (X,)| Total(acc.0 + l.0 * r.0),
    );
    let mut exec = builder.build(totals).unwrap();

    match exec.run(&Client::cpu()) {
        Err(Error::MissingOutput(err)) => {
            assert_eq!(err.entity, bare);
            assert_eq!(err.component, "total");
        }
        other => panic!("expected missing output, got {:?}", other),
    }
    // Sources a and c were folded but nothing was written.
    let totals = exec.column_array(Total::component_id()).unwrap();
    assert_eq!(totals.as_slice::<f64>().unwrap(), &[0.0, 0.0]);
    assert_eq!(exec.tick(), 0);
}

#[test]
fn test_parallel_fold_matches_cpu() {
    let build = || {
        let mut builder = WorldBuilder::new();
        let nodes: Vec<EntityId> = (0..500)
            .map(|i| builder.spawn(node(i as f64)).unwrap())
            .collect();
        for (i, &from) in nodes.iter().enumerate() {
            for k in 1..4 {
                let to = nodes[(i * 7 + k * 13) % nodes.len()];
                builder.spawn(link(from, to)).unwrap();
            }
        }
        builder.build(sum_fold()).unwrap()
    };
    let mut cpu = build();
    let mut parallel = build();
    cpu.run_ticks(&Client::cpu(), 2).unwrap();
    parallel
        .run_ticks(&Client::parallel().with_config(ExecConfig::new(16)), 2)
        .unwrap();

    let read = |exec: &Exec| exec.column_array(X::component_id()).unwrap();
    assert_eq!(read(&cpu), read(&parallel));
}

#[test]
fn test_graph_query_read_back() {
    let mut builder = WorldBuilder::new();
    let a = builder.spawn(node(1.0)).unwrap();
    let b = builder.spawn(node(2.0)).unwrap();
    builder.spawn(link(b, a)).unwrap();

    let graph = GraphQuery::<Edge>::new(builder.world()).unwrap();
    assert_eq!(graph.sources().collect::<Vec<_>>(), vec![b]);
    assert_eq!(graph.targets(b), &[a]);
    assert_eq!(graph.edge_count(), 1);
}
