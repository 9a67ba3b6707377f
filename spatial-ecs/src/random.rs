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
//! Deterministic keyed random sampling
//!
//! An [`RngKey`] is a 64-bit key derived from a seed and any number of
//! fold-in values. Sampling from the same key always yields the same
//! numbers, so per-entity noise can be reproduced by folding in the entity
//! id and tick:
//!
//! ```
//! use spatial_ecs::random::RngKey;
//!
//! let key = RngKey::new(42).fold_in(7);
//! assert_eq!(key.uniform(4), RngKey::new(42).fold_in(7).uniform(4));
//! assert_ne!(key.uniform(4), RngKey::new(42).fold_in(8).uniform(4));
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

/// splitmix64 finalizer
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Reproducible sampling key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RngKey(u64);

impl RngKey {
    /// Key from an integer seed
    pub fn new(seed: u64) -> Self {
        RngKey(mix(seed))
    }

    /// Derive a new key from this key and a value
    pub fn fold_in(self, data: u64) -> Self {
        RngKey(mix(self.0 ^ mix(data)))
    }

    /// Get the raw u64 value
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Generator seeded from this key
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.0)
    }

    /// `n` samples uniform in `[0, 1)`
    pub fn uniform(&self, n: usize) -> Vec<f64> {
        let mut rng = self.rng();
        (0..n).map(|_| rng.gen::<f64>()).collect()
    }

    /// `n` samples uniform in `[low, high)`
    ///
    /// # Panics
    ///
    /// Panics if `low >= high`
    pub fn uniform_range(&self, low: f64, high: f64, n: usize) -> Vec<f64> {
        assert!(low < high, "uniform_range requires low < high");
        let mut rng = self.rng();
        (0..n).map(|_| rng.gen_range(low..high)).collect()
    }

    /// `n` standard normal samples (Box-Muller)
    pub fn normal(&self, n: usize) -> Vec<f64> {
        let mut rng = self.rng();
        (0..n)
            .map(|_| {
                // 1 - u keeps the log argument in (0, 1].
                let u1 = 1.0 - rng.gen::<f64>();
                let u2 = rng.gen::<f64>();
                (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
            })
            .collect()
    }
}
