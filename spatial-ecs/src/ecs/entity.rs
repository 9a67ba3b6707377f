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
//! Entity identifiers
//!
//! Entities are opaque ids that tie together component rows across archetype
//! groups. Ids are handed out in increasing order and are never reused.

use std::fmt;

/// Unique identifier for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

impl EntityId {
    /// Create a new EntityId from a raw u64 value
    pub fn new(id: u64) -> Self {
        EntityId(id)
    }

    /// Get the raw u64 value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Monotonic id source
///
/// There is no destroy operation, so an id below `next` is always live.
#[derive(Debug, Default, Clone)]
pub struct EntityAllocator {
    next: u64,
}

impl EntityAllocator {
    /// Create an allocator starting at id 0
    pub fn new() -> Self {
        EntityAllocator { next: 0 }
    }

    /// Hand out the next id
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Whether `id` has been handed out
    pub fn contains(&self, id: EntityId) -> bool {
        id.0 < self.next
    }

    /// Number of ids handed out so far
    pub fn len(&self) -> u64 {
        self.next
    }

    /// Whether no id has been handed out yet
    pub fn is_empty(&self) -> bool {
        self.next == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_monotonic() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_eq!(a.raw(), 0);
        assert_eq!(b.raw(), 1);
        assert!(a < b);
        assert_eq!(alloc.len(), 2);
    }

    #[test]
    fn test_allocator_contains() {
        let mut alloc = EntityAllocator::new();
        assert!(alloc.is_empty());
        let a = alloc.allocate();
        assert!(alloc.contains(a));
        assert!(!alloc.contains(EntityId::new(1)));
    }

    #[test]
    fn test_entity_display() {
        assert_eq!(EntityId::new(42).to_string(), "Entity(42)");
    }
}
