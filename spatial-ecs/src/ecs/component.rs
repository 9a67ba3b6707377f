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
//! Component descriptors and column buffers
//!
//! A component is a named, fixed-shape value made of one elemental scalar
//! type. The store never sees Rust component types directly: each type maps
//! itself onto a [`ComponentSchema`] and onto a flat slice of elements, and
//! the store keeps those elements densely in a [`ColumnBuf`].
//!
//! # Memory Layout
//!
//! A pose component (7 f64 per entity) for three entities is stored as one
//! contiguous buffer:
//!
//! ```text
//! [qx0 qy0 qz0 qw0 px0 py0 pz0 | qx1 ... pz1 | qx2 ... pz2]
//! ```

use crate::error::{Result, SchemaError};
use std::borrow::Cow;
use std::fmt;

/// Elemental scalar type of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimType {
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// 64-bit unsigned integer (entity ids, asset handles, counters)
    U64,
}

impl PrimType {
    /// Size of one element in bytes
    pub fn size(&self) -> usize {
        match self {
            PrimType::F32 => 4,
            PrimType::F64 | PrimType::U64 => 8,
        }
    }
}

impl fmt::Display for PrimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimType::F32 => "f32",
            PrimType::F64 => "f64",
            PrimType::U64 => "u64",
        };
        f.write_str(name)
    }
}

/// Stable identifier derived from a component name
///
/// Two schemas with the same name always share an id, across runs and
/// processes (FNV-1a over the UTF-8 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Hash a component name into its id
    pub const fn new(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            i += 1;
        }
        ComponentId(hash)
    }

    /// Get the raw u64 value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Named, typed, fixed-shape column descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSchema {
    id: ComponentId,
    name: Cow<'static, str>,
    prim: PrimType,
    shape: Vec<usize>,
}

impl ComponentSchema {
    /// Create a schema; an empty shape means a scalar
    pub fn new(name: impl Into<Cow<'static, str>>, prim: PrimType, shape: &[usize]) -> Self {
        let name = name.into();
        ComponentSchema {
            id: ComponentId::new(&name),
            name,
            prim,
            shape: shape.to_vec(),
        }
    }

    /// Stable id of this component
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Elemental type
    pub fn prim(&self) -> PrimType {
        self.prim
    }

    /// Per-entity shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of elements one entity occupies
    pub fn elem_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether `other` describes the same storage layout
    pub fn same_layout(&self, other: &ComponentSchema) -> bool {
        self.prim == other.prim && self.shape == other.shape
    }

    /// Short description of type and shape, e.g. `f64[7]`
    pub fn describe(&self) -> String {
        if self.shape.is_empty() {
            self.prim.to_string()
        } else {
            let dims: Vec<String> = self.shape.iter().map(|d| d.to_string()).collect();
            format!("{}[{}]", self.prim, dims.join(", "))
        }
    }

    pub(crate) fn check_layout(&self, other: &ComponentSchema) -> Result<()> {
        if self.same_layout(other) {
            Ok(())
        } else {
            Err(SchemaError::TypeMismatch {
                component: self.name.to_string(),
                expected: self.describe(),
                found: other.describe(),
            }
            .into())
        }
    }
}

/// Dense storage for one component column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnBuf {
    /// f32 elements
    F32(Vec<f32>),
    /// f64 elements
    F64(Vec<f64>),
    /// u64 elements
    U64(Vec<u64>),
}

impl ColumnBuf {
    /// Empty buffer for the given element type
    pub fn empty(prim: PrimType) -> Self {
        match prim {
            PrimType::F32 => ColumnBuf::F32(Vec::new()),
            PrimType::F64 => ColumnBuf::F64(Vec::new()),
            PrimType::U64 => ColumnBuf::U64(Vec::new()),
        }
    }

    /// Element type held by this buffer
    pub fn prim(&self) -> PrimType {
        match self {
            ColumnBuf::F32(_) => PrimType::F32,
            ColumnBuf::F64(_) => PrimType::F64,
            ColumnBuf::U64(_) => PrimType::U64,
        }
    }

    /// Number of elements (not entities)
    pub fn len(&self) -> usize {
        match self {
            ColumnBuf::F32(v) => v.len(),
            ColumnBuf::F64(v) => v.len(),
            ColumnBuf::U64(v) => v.len(),
        }
    }

    /// Whether the buffer holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Typed view of the elements
    pub fn as_slice<E: Elem>(&self) -> Option<&[E]> {
        E::slice(self)
    }

    /// Append `src[start..end]`; returns false when element types differ
    pub fn extend_from_range(&mut self, src: &ColumnBuf, start: usize, end: usize) -> bool {
        match (self, src) {
            (ColumnBuf::F32(dst), ColumnBuf::F32(src)) => dst.extend_from_slice(&src[start..end]),
            (ColumnBuf::F64(dst), ColumnBuf::F64(src)) => dst.extend_from_slice(&src[start..end]),
            (ColumnBuf::U64(dst), ColumnBuf::U64(src)) => dst.extend_from_slice(&src[start..end]),
            _ => return false,
        }
        true
    }
}

/// Scalar element types a column can hold
pub trait Elem: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Matching [`PrimType`]
    const PRIM: PrimType;

    /// Borrow the buffer as `&[Self]` if the element types match
    fn slice(buf: &ColumnBuf) -> Option<&[Self]>;

    /// Borrow the buffer as `&mut [Self]` if the element types match
    fn slice_mut(buf: &mut ColumnBuf) -> Option<&mut [Self]>;

    /// Wrap owned elements into a buffer
    fn wrap(values: Vec<Self>) -> ColumnBuf;
}

impl Elem for f32 {
    const PRIM: PrimType = PrimType::F32;

    fn slice(buf: &ColumnBuf) -> Option<&[Self]> {
        match buf {
            ColumnBuf::F32(v) => Some(v),
            _ => None,
        }
    }

    fn slice_mut(buf: &mut ColumnBuf) -> Option<&mut [Self]> {
        match buf {
            ColumnBuf::F32(v) => Some(v),
            _ => None,
        }
    }

    fn wrap(values: Vec<Self>) -> ColumnBuf {
        ColumnBuf::F32(values)
    }
}

impl Elem for f64 {
    const PRIM: PrimType = PrimType::F64;

    fn slice(buf: &ColumnBuf) -> Option<&[Self]> {
        match buf {
            ColumnBuf::F64(v) => Some(v),
            _ => None,
        }
    }

    fn slice_mut(buf: &mut ColumnBuf) -> Option<&mut [Self]> {
        match buf {
            ColumnBuf::F64(v) => Some(v),
            _ => None,
        }
    }

    fn wrap(values: Vec<Self>) -> ColumnBuf {
        ColumnBuf::F64(values)
    }
}

impl Elem for u64 {
    const PRIM: PrimType = PrimType::U64;

    fn slice(buf: &ColumnBuf) -> Option<&[Self]> {
        match buf {
            ColumnBuf::U64(v) => Some(v),
            _ => None,
        }
    }

    fn slice_mut(buf: &mut ColumnBuf) -> Option<&mut [Self]> {
        match buf {
            ColumnBuf::U64(v) => Some(v),
            _ => None,
        }
    }

    fn wrap(values: Vec<Self>) -> ColumnBuf {
        ColumnBuf::U64(values)
    }
}

/// Trait that all components must implement
///
/// Components are plain data: a schema plus a lossless mapping to and from
/// `schema().elem_count()` elements. Use the [`component!`](crate::component)
/// macro for scalar and fixed-array newtypes.
pub trait Component: Clone + Send + Sync + 'static {
    /// Elemental scalar type
    type Elem: Elem;

    /// Name, element type and shape
    fn schema() -> ComponentSchema;

    /// Rebuild a value from exactly `elem_count` elements
    fn from_elems(elems: &[Self::Elem]) -> Self;

    /// Write this value into exactly `elem_count` elements
    fn write_elems(&self, out: &mut [Self::Elem]);

    /// Id of this component type
    fn component_id() -> ComponentId {
        Self::schema().id()
    }
}

/// One entity's value for one component, type-erased
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentValue {
    schema: ComponentSchema,
    data: ColumnBuf,
}

impl ComponentValue {
    /// Erase a typed component value
    pub fn of<C: Component>(value: &C) -> Self {
        let schema = C::schema();
        let mut elems = vec![C::Elem::default(); schema.elem_count()];
        value.write_elems(&mut elems);
        ComponentValue {
            schema,
            data: C::Elem::wrap(elems),
        }
    }

    /// Build from a schema and raw elements, checking type and length
    pub fn from_raw(schema: ComponentSchema, data: ColumnBuf) -> Result<Self> {
        if data.prim() != schema.prim() || data.len() != schema.elem_count() {
            return Err(SchemaError::TypeMismatch {
                component: schema.name().to_string(),
                expected: schema.describe(),
                found: format!("{}[{}]", data.prim(), data.len()),
            }
            .into());
        }
        Ok(ComponentValue { schema, data })
    }

    /// Schema of the value
    pub fn schema(&self) -> &ComponentSchema {
        &self.schema
    }

    /// Raw elements
    pub fn data(&self) -> &ColumnBuf {
        &self.data
    }
}

/// Declare a scalar or fixed-array newtype component
///
/// ```
/// use spatial_ecs::component;
/// use spatial_ecs::ecs::Component;
///
/// component!(
///     /// Temperature in kelvin
///     pub struct Temperature(f64) => "temperature";
/// );
/// component!(pub struct Color([f32; 3]) => "color";);
///
/// assert_eq!(Temperature::schema().name(), "temperature");
/// assert_eq!(Color::schema().elem_count(), 3);
/// ```
#[macro_export]
macro_rules! component {
    ($(#[$meta:meta])* $vis:vis struct $ty:ident([$elem:ty; $n:literal]) => $name:literal;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        $vis struct $ty(pub [$elem; $n]);

        impl $crate::ecs::Component for $ty {
            type Elem = $elem;

            fn schema() -> $crate::ecs::ComponentSchema {
                $crate::ecs::ComponentSchema::new(
                    $name,
                    <$elem as $crate::ecs::Elem>::PRIM,
                    &[$n],
                )
            }

            fn from_elems(elems: &[$elem]) -> Self {
                let mut values = [<$elem as ::std::default::Default>::default(); $n];
                values.copy_from_slice(&elems[..$n]);
                $ty(values)
            }

            fn write_elems(&self, out: &mut [$elem]) {
                out[..$n].copy_from_slice(&self.0);
            }
        }
    };
    ($(#[$meta:meta])* $vis:vis struct $ty:ident($elem:ty) => $name:literal;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        $vis struct $ty(pub $elem);

        impl $crate::ecs::Component for $ty {
            type Elem = $elem;

            fn schema() -> $crate::ecs::ComponentSchema {
                $crate::ecs::ComponentSchema::new(
                    $name,
                    <$elem as $crate::ecs::Elem>::PRIM,
                    &[],
                )
            }

            fn from_elems(elems: &[$elem]) -> Self {
                $ty(elems[0])
            }

            fn write_elems(&self, out: &mut [$elem]) {
                out[0] = self.0;
            }
        }
    };
}
