//! Merge configuration.
//!
//! [`MergeConfig`] collects the knobs that change how tiles are composited:
//! what to do with a caller-supplied background color and whether tiles are
//! processed on the calling thread or fanned out to a worker pool.
//!
//! The struct derives `serde` traits so it can be embedded in a larger
//! application config file.

use serde::{Deserialize, Serialize};

/// Default background handling.
pub const DEFAULT_BACKGROUND_POLICY: BackgroundPolicy = BackgroundPolicy::Ignore;

/// Default execution mode.
pub const DEFAULT_EXECUTION: Execution = Execution::Sequential;

/// How a supplied background color is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundPolicy {
    /// Accept the color but leave the canvas zero (fully transparent).
    ///
    /// Missing tiles and out-of-source crop areas stay transparent even when
    /// a background is supplied.
    #[default]
    Ignore,
    /// Paint missing tiles and out-of-source crop areas with the color.
    Fill,
}

/// How tiles are decoded and written to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    /// One tile after another, in input order, on the calling thread.
    #[default]
    Sequential,
    /// Decode on the rayon pool, then write disjoint canvas bands in parallel.
    Parallel,
}

/// Configuration for [`TileMerger`](crate::TileMerger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Background color handling
    pub background: BackgroundPolicy,
    /// Sequential or parallel compositing
    pub execution: Execution,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND_POLICY,
            execution: DEFAULT_EXECUTION,
        }
    }
}

impl MergeConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the background policy.
    pub fn with_background(mut self, background: BackgroundPolicy) -> Self {
        self.background = background;
        self
    }

    /// Set the execution mode.
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }
}
