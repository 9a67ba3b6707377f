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
//! Opaque asset storage
//!
//! Rendering resources such as meshes and materials live outside the
//! simulation core. The store only hands out handles; a [`Handle`] is an
//! ordinary u64 component named `asset_handle_<kind>`, so entities can refer
//! to assets without the runtime ever interpreting them.

use crate::ecs::{Component, ComponentSchema, PrimType};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// A value that can be stored in [`Assets`]
pub trait Asset: Send + Sync + 'static {
    /// Short kind name used in the handle component name, e.g. `"mesh"`
    const KIND: &'static str;
}

/// Raw index into the asset store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(u64);

impl AssetId {
    /// Get the raw u64 value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Typed reference to a stored asset
pub struct Handle<T> {
    id: AssetId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Wrap a raw id
    pub fn new(id: AssetId) -> Self {
        Handle {
            id,
            _marker: PhantomData,
        }
    }

    /// Untyped id
    pub fn id(&self) -> AssetId {
        self.id
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.id.0)
    }
}

impl<T: Asset> Component for Handle<T> {
    type Elem = u64;

    fn schema() -> ComponentSchema {
        ComponentSchema::new(format!("asset_handle_{}", T::KIND), PrimType::U64, &[])
    }

    fn from_elems(elems: &[u64]) -> Self {
        Handle::new(AssetId(elems[0]))
    }

    fn write_elems(&self, out: &mut [u64]) {
        out[0] = self.id.0;
    }
}

/// Append-only store of opaque assets
#[derive(Default)]
pub struct Assets {
    items: Vec<Box<dyn Any + Send + Sync>>,
}

impl Assets {
    /// Create an empty store
    pub fn new() -> Self {
        Assets { items: Vec::new() }
    }

    /// Store a value, returning a handle to it
    pub fn insert<T: Asset>(&mut self, asset: T) -> Handle<T> {
        let id = AssetId(self.items.len() as u64);
        self.items.push(Box::new(asset));
        Handle::new(id)
    }

    /// Look up a stored value
    pub fn get<T: Asset>(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.id.0 as usize)?.downcast_ref::<T>()
    }

    /// Number of stored assets
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
