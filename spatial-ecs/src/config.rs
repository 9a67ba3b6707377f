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
//! Execution configuration and target selection
//!
//! [`ExecConfig`] tunes how a tick is executed; [`Client`] is the opaque
//! execution-target handle passed to every `run`. Neither changes results:
//! sequential and parallel execution produce bit-identical stores.
//!
//! # Environment Configuration
//!
//! `SPATIAL_ECS_PARALLEL_THRESHOLD` overrides the minimum number of matched
//! entities before per-entity work fans out across the rayon pool:
//! ```bash
//! export SPATIAL_ECS_PARALLEL_THRESHOLD=4096
//! ```

/// Environment variable read by [`ExecConfig::from_env`]
pub const PARALLEL_THRESHOLD_ENV: &str = "SPATIAL_ECS_PARALLEL_THRESHOLD";

/// Tuning knobs for tick execution
#[derive(Debug, Clone, PartialEq)]
pub struct ExecConfig {
    /// Minimum matched entities before a map or fold is split across threads
    pub parallel_threshold: usize,
    /// Emit a debug event for every stage of every tick
    pub log_stages: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        ExecConfig {
            parallel_threshold: 1024,
            log_stages: false,
        }
    }
}

impl ExecConfig {
    /// Create a configuration with a custom parallel threshold
    pub fn new(parallel_threshold: usize) -> Self {
        ExecConfig {
            parallel_threshold,
            ..Self::default()
        }
    }

    /// Defaults, overridden by `SPATIAL_ECS_PARALLEL_THRESHOLD` when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(PARALLEL_THRESHOLD_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(threshold) => config.parallel_threshold = threshold,
                Err(_) => tracing::warn!(
                    value = %raw,
                    "ignoring unparsable {}", PARALLEL_THRESHOLD_ENV
                ),
            }
        }
        config
    }

    /// Enable per-stage debug events
    pub fn with_stage_logging(mut self) -> Self {
        self.log_stages = true;
        self
    }

    /// Set the parallel threshold
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

/// Where per-entity work executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecTarget {
    /// Single thread
    Cpu,
    /// Rayon pool (falls back to a single thread without the `parallel` feature)
    ParallelCpu,
}

/// Execution-target handle passed to `run`
#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    target: ExecTarget,
    config: ExecConfig,
}

impl Client {
    /// Sequential execution on the calling thread
    pub fn cpu() -> Self {
        Client {
            target: ExecTarget::Cpu,
            config: ExecConfig::default(),
        }
    }

    /// Per-entity work split across the rayon pool above the threshold
    pub fn parallel() -> Self {
        Client {
            target: ExecTarget::ParallelCpu,
            config: ExecConfig::default(),
        }
    }

    /// Replace the execution configuration
    pub fn with_config(mut self, config: ExecConfig) -> Self {
        self.config = config;
        self
    }

    /// Selected target
    pub fn target(&self) -> ExecTarget {
        self.target
    }

    /// Active configuration
    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Whether `len` items should be processed on the rayon pool
    pub fn should_parallelize(&self, len: usize) -> bool {
        cfg!(feature = "parallel")
            && self.target == ExecTarget::ParallelCpu
            && len >= self.config.parallel_threshold
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::cpu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExecConfig::default();
        assert_eq!(config.parallel_threshold, 1024);
        assert!(!config.log_stages);
    }

    #[test]
    fn test_config_builder() {
        let config = ExecConfig::new(16).with_stage_logging();
        assert_eq!(config.parallel_threshold, 16);
        assert!(config.log_stages);
    }

    #[test]
    fn test_cpu_client_never_parallelizes() {
        let client = Client::cpu().with_config(ExecConfig::new(0));
        assert!(!client.should_parallelize(1_000_000));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_client_respects_threshold() {
        let client = Client::parallel().with_config(ExecConfig::new(100));
        assert!(!client.should_parallelize(99));
        assert!(client.should_parallelize(100));
    }
}
