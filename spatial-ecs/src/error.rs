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
//! Error types for the column store, queries and pipelines
//!
//! Failures fall into three families:
//!
//! - [`SchemaError`]: the declared shape of the store is inconsistent
//!   (duplicate component in one archetype, a pipeline input no archetype
//!   stores, a value whose element type disagrees with its registered schema).
//!   These surface at spawn or build time, never mid-tick.
//! - [`MissingOutputError`]: a `map` or `edge_fold` tried to write a component
//!   into an entity that never held it. Nothing from the offending stage is
//!   written.
//! - [`IdentityError`]: an operation named an entity id that was never spawned.
//!
//! [`TickLimitError`] is not a fault: it reports that a pipeline built with a
//! tick limit has already run its last tick.
//!
//! All of them convert into the crate-level [`Error`] so callers can use `?`
//! throughout and match on the family at the boundary.

use crate::ecs::EntityId;

/// Inconsistencies in the declared component/archetype layout
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The same component type appears twice in one archetype declaration
    #[error("archetype `{archetype}` declares component `{component}` more than once")]
    DuplicateComponent {
        /// Normalized archetype name
        archetype: String,
        /// Offending component name
        component: String,
    },

    /// A pipeline references a component that no archetype group stores
    #[error("component `{component}` is not stored in any archetype")]
    UnresolvedComponent {
        /// Missing component name
        component: String,
    },

    /// An archetype name was reused with a different component list
    #[error("archetype `{archetype}` was already declared with a different component set")]
    ArchetypeMismatch {
        /// Normalized archetype name
        archetype: String,
    },

    /// A value disagrees with the element type or shape already registered
    #[error("component `{component}` is registered as {expected}, found {found}")]
    TypeMismatch {
        /// Component name
        component: String,
        /// Registered element type and shape, e.g. `f64[7]`
        expected: String,
        /// Element type and shape of the rejected value
        found: String,
    },

    /// Attaching would give an entity a second copy of a component
    #[error("{entity} already holds component `{component}`")]
    ComponentAlreadyHeld {
        /// Entity receiving the attach
        entity: EntityId,
        /// Component it already holds
        component: String,
    },

    /// A bulk write supplied a different number of values than entities
    #[error("{values} values supplied for {entities} entities when writing `{component}`")]
    RowCountMismatch {
        /// Component being written
        component: String,
        /// Number of target entities
        entities: usize,
        /// Number of values supplied
        values: usize,
    },

    /// Spawn or attach after the store was bound to a pipeline
    #[error("store schema is frozen after build; cannot add rows to `{archetype}`")]
    Frozen {
        /// Archetype the caller tried to extend
        archetype: String,
    },
}

/// A write targeted a component the entity never held
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} has never held component `{component}`")]
pub struct MissingOutputError {
    /// First entity found without the output component
    pub entity: EntityId,
    /// Output component name
    pub component: String,
}

/// An entity id that was never handed out by the store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} was never spawned")]
pub struct IdentityError {
    /// The unknown id
    pub entity: EntityId,
}

/// A run was requested after the configured tick limit
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tick limit of {max_ticks} reached")]
pub struct TickLimitError {
    /// Configured limit
    pub max_ticks: u64,
}

/// Crate-level error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// See [`SchemaError`]
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// See [`MissingOutputError`]
    #[error(transparent)]
    MissingOutput(#[from] MissingOutputError),

    /// See [`IdentityError`]
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// See [`TickLimitError`]
    #[error(transparent)]
    TickLimit(#[from] TickLimitError),
}

/// Result alias used across the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err: Error = IdentityError { entity: EntityId::new(7) }.into();
        assert!(matches!(err, Error::Identity(_)));
        assert_eq!(err.to_string(), "Entity(7) was never spawned");
    }

    #[test]
    fn test_tick_limit_message() {
        let err: Error = TickLimitError { max_ticks: 3 }.into();
        assert_eq!(err.to_string(), "tick limit of 3 reached");
    }

    #[test]
    fn test_schema_error_message() {
        let err = SchemaError::DuplicateComponent {
            archetype: "body".to_string(),
            component: "world_pos".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "archetype `body` declares component `world_pos` more than once"
        );
    }
}
