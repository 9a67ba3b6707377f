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
//! System execution framework
//!
//! A system is a store-to-store transform with a statically declared set of
//! input and output components. Systems hold no state between runs; the
//! [`World`] is the only thing that persists.
//!
//! Systems compose with [`SystemExt::pipe`] into a [`Pipeline`], which runs
//! its stages strictly in declaration order. Every stage's writes are applied
//! before the next stage reads, and nothing is reordered. Composition
//! flattens, so `a.pipe(b).pipe(c)` and `a.pipe(b.pipe(c))` produce the same
//! three-stage pipeline.

use crate::config::Client;
use crate::ecs::component::{Component, ComponentSchema};
use crate::ecs::graph::{fold_inputs, GraphQuery, Relation};
use crate::ecs::query::{Query, QueryData};
use crate::ecs::World;
use crate::error::Result;
use std::marker::PhantomData;

/// Trait for systems that operate on the ECS world
pub trait System: Send + Sync {
    /// Execute one tick of this system against the world
    fn run(&self, world: &mut World, client: &Client) -> Result<()>;

    /// Get the name of this system for debugging
    fn name(&self) -> &str;

    /// Declared input components
    fn inputs(&self) -> Vec<ComponentSchema>;

    /// Declared logical output components
    fn outputs(&self) -> Vec<ComponentSchema>;

    /// Every input read anywhere inside this system
    fn referenced_inputs(&self) -> Vec<ComponentSchema> {
        self.inputs()
    }

    /// Every component this system may write
    fn effects(&self) -> Vec<ComponentSchema> {
        self.outputs()
    }

    /// Flatten into pipeline stages
    fn into_stages(self) -> Vec<Box<dyn System>>
    where
        Self: Sized + 'static,
    {
        vec![Box::new(self)]
    }
}

/// Sequential composition
pub trait SystemExt: System + Sized + 'static {
    /// Run `self`, apply its writes, then run `next` against the updated store
    fn pipe<S: System + 'static>(self, next: S) -> Pipeline {
        Pipeline::new().then(self).then(next)
    }
}

impl<T: System + Sized + 'static> SystemExt for T {}

/// Free-function form of [`SystemExt::pipe`]
pub fn pipe<A, B>(first: A, second: B) -> Pipeline
where
    A: System + 'static,
    B: System + 'static,
{
    first.pipe(second)
}

/// Elementwise map over a query, written to one output component
pub struct MapSystem<Q, O, F> {
    name: String,
    f: F,
    _types: PhantomData<fn(Q) -> O>,
}

/// Build a [`MapSystem`] from a per-entity function
///
/// ```
/// use spatial_ecs::component;
/// use spatial_ecs::ecs::{map, System};
///
/// component!(pub struct X(f64) => "x";);
/// component!(pub struct Y(f64) => "y";);
///
/// let scale = map(|(x, y): (X, Y)| X(x.0 * y.0));
/// assert_eq!(scale.outputs()[0].name(), "x");
/// ```
pub fn map<Q, O, F>(f: F) -> MapSystem<Q, O, F>
where
    Q: QueryData,
    O: Component,
    F: Fn(Q) -> O + Send + Sync + 'static,
{
    let inputs: Vec<String> = Q::schemas().iter().map(|s| s.name().to_string()).collect();
    MapSystem {
        name: format!("map({} -> {})", inputs.join(", "), O::schema().name()),
        f,
        _types: PhantomData,
    }
}

impl<Q, O, F> MapSystem<Q, O, F> {
    /// Replace the generated name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<Q, O, F> System for MapSystem<Q, O, F>
where
    Q: QueryData,
    O: Component,
    F: Fn(Q) -> O + Send + Sync + 'static,
{
    fn run(&self, world: &mut World, client: &Client) -> Result<()> {
        let query = Query::<Q>::new(world)?;
        query.map_with(client, &self.f).apply(world)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> Vec<ComponentSchema> {
        Q::schemas()
    }

    fn outputs(&self) -> Vec<ComponentSchema> {
        vec![O::schema()]
    }
}

/// Per-source ordered fold over a relation
pub struct EdgeFoldSystem<E, L, R, O, F> {
    name: String,
    init: O,
    f: F,
    _types: PhantomData<fn(E, L, R) -> O>,
}

/// Build an [`EdgeFoldSystem`] over relation `E`
///
/// `left` components are read from each edge's source and `right`
/// components from its target; the result is written to the source.
pub fn edge_fold<E, L, R, O, F>(init: O, f: F) -> EdgeFoldSystem<E, L, R, O, F>
where
    E: Relation,
    L: QueryData,
    R: QueryData,
    O: Component,
    F: Fn(O, L, R) -> O + Send + Sync + 'static,
{
    EdgeFoldSystem {
        name: format!("edge_fold({} -> {})", E::schema().name(), O::schema().name()),
        init,
        f,
        _types: PhantomData,
    }
}

impl<E, L, R, O, F> EdgeFoldSystem<E, L, R, O, F> {
    /// Replace the generated name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<E, L, R, O, F> System for EdgeFoldSystem<E, L, R, O, F>
where
    E: Relation,
    L: QueryData,
    R: QueryData,
    O: Component,
    F: Fn(O, L, R) -> O + Send + Sync + 'static,
{
    fn run(&self, world: &mut World, client: &Client) -> Result<()> {
        let graph = GraphQuery::<E>::new(world)?;
        let left = Query::<L>::new(world)?;
        let right = Query::<R>::new(world)?;
        graph
            .edge_fold_with(client, &left, &right, self.init.clone(), &self.f)
            .apply(world)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> Vec<ComponentSchema> {
        fold_inputs::<E, L, R>()
    }

    fn outputs(&self) -> Vec<ComponentSchema> {
        vec![O::schema()]
    }
}

type WorldFn = dyn Fn(&mut World, &Client) -> Result<()> + Send + Sync;

/// Arbitrary store transform with a hand-declared signature
///
/// For effectors and bookkeeping that do not fit a single map or fold. The
/// declared inputs take part in build-time validation like any other system.
pub struct FnSystem {
    name: String,
    inputs: Vec<ComponentSchema>,
    outputs: Vec<ComponentSchema>,
    f: Box<WorldFn>,
}

impl FnSystem {
    /// Wrap a closure
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut World, &Client) -> Result<()> + Send + Sync + 'static,
    {
        FnSystem {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            f: Box::new(f),
        }
    }

    /// Declare a component the closure reads
    pub fn with_input<C: Component>(mut self) -> Self {
        self.inputs.push(C::schema());
        self
    }

    /// Declare a component the closure writes
    pub fn with_output<C: Component>(mut self) -> Self {
        self.outputs.push(C::schema());
        self
    }
}

impl System for FnSystem {
    fn run(&self, world: &mut World, client: &Client) -> Result<()> {
        (self.f)(world, client)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> Vec<ComponentSchema> {
        self.inputs.clone()
    }

    fn outputs(&self) -> Vec<ComponentSchema> {
        self.outputs.clone()
    }
}

/// Ordered sequence of systems run once per tick
///
/// The pipeline's declared inputs are those of its first stage and its
/// logical output is that of its last; its effects are the union of every
/// stage's writes.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn System>>,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Pipeline { stages: Vec::new() }
    }

    /// Append a system; nested pipelines are flattened
    pub fn then<S: System + 'static>(mut self, system: S) -> Self {
        self.stages.extend(system.into_stages());
        self
    }

    /// Append an optional system
    pub fn then_some<S: System + 'static>(self, system: Option<S>) -> Self {
        match system {
            Some(system) => self.then(system),
            None => self,
        }
    }

    /// Append an already boxed system
    pub fn push(&mut self, system: Box<dyn System>) {
        self.stages.push(system);
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

fn union(schemas: impl Iterator<Item = ComponentSchema>) -> Vec<ComponentSchema> {
    let mut out: Vec<ComponentSchema> = Vec::new();
    for schema in schemas {
        if !out.iter().any(|s| s.id() == schema.id()) {
            out.push(schema);
        }
    }
    out
}

impl System for Pipeline {
    fn run(&self, world: &mut World, client: &Client) -> Result<()> {
        for stage in &self.stages {
            if client.config().log_stages {
                tracing::debug!(stage = stage.name(), "running stage");
            }
            stage.run(world, client)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "pipeline"
    }

    fn inputs(&self) -> Vec<ComponentSchema> {
        self.stages.first().map(|s| s.inputs()).unwrap_or_default()
    }

    fn outputs(&self) -> Vec<ComponentSchema> {
        self.stages.last().map(|s| s.outputs()).unwrap_or_default()
    }

    fn referenced_inputs(&self) -> Vec<ComponentSchema> {
        union(self.stages.iter().flat_map(|s| s.referenced_inputs()))
    }

    fn effects(&self) -> Vec<ComponentSchema> {
        union(self.stages.iter().flat_map(|s| s.effects()))
    }

    fn into_stages(self) -> Vec<Box<dyn System>> {
        self.stages
    }
}
