//! Configuration parameters for slice analysis

use serde::{Deserialize, Serialize};

/// Slice analysis configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceOptions {
    /// Number of slices to find (default: 0)
    /// If 0, all detected onsets are returned.
    /// If > 0, the best N onsets ranked by local energy are selected.
    pub num_slices: u32,

    /// Refine onset positions with variance analysis (default: true)
    pub optimize: bool,

    /// Window size in milliseconds for onset position refinement (default: 100.0)
    pub optimize_window_ms: f64,

    /// Onset detection method (default: "hfc")
    /// Supported: "energy", "hfc", "complex", "phase", "wphase", "specdiff",
    /// "kl", "mkl", "specflux", "consensus". Empty string selects "hfc".
    /// The special "consensus" method runs every other method and merges
    /// their detections into consensus markers.
    pub method: String,

    /// Minimum number of onset markers required for a consensus cluster
    /// to be kept (default: 3). Only applies when method is "consensus".
    pub min_consensus_cluster_size: u32,

    /// Enforce minimum spacing between slices (default: true)
    /// When multiple slices fall within the spacing window, only the
    /// first is kept.
    pub use_minimum_spacing: bool,

    /// Minimum spacing in milliseconds between slices (default: 80.0)
    /// Only applies when `use_minimum_spacing` is true.
    pub minimum_spacing_ms: f64,
}

impl Default for SliceOptions {
    fn default() -> Self {
        Self {
            num_slices: 0,
            optimize: true,
            optimize_window_ms: 100.0,
            method: "hfc".to_string(),
            min_consensus_cluster_size: 3,
            use_minimum_spacing: true,
            minimum_spacing_ms: 80.0,
        }
    }
}
