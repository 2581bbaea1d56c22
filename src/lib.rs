//! # Slicer DSP
//!
//! An offline onset-detection and slicing engine for short-to-medium
//! audio material (drum loops, phrase samples, instrument recordings).
//!
//! ## Features
//!
//! - **Onset detection**: nine spectral novelty functions (energy, HFC,
//!   complex domain, phase deviation, weighted phase, spectral difference,
//!   KL, modified KL, spectral flux) over a phase-vocoder front-end
//! - **Adaptive peak picking**: median-biased thresholding with silence
//!   gating and a minimum inter-onset interval
//! - **Slice selection**: best-N ranking by local energy, cross-method
//!   consensus clustering, variance-based position refinement, and a
//!   minimum spacing filter
//!
//! ## Quick Start
//!
//! ```no_run
//! use slicer_dsp::{analyze_slices, SliceOptions};
//!
//! let options = SliceOptions {
//!     num_slices: 8,
//!     ..Default::default()
//! };
//! let result = analyze_slices("amen.wav", &options)?;
//!
//! println!("{} slices at {} Hz", result.onsets.len(), result.sample_rate);
//! for onset in &result.onsets {
//!     println!("  {:.4} s", onset);
//! }
//! # Ok::<(), slicer_dsp::SliceError>(())
//! ```
//!
//! ## Architecture
//!
//! The analysis pipeline follows this flow:
//!
//! ```text
//! Samples → Framer → FFT → (Whitening) → Novelty → Smoothing → Peak picking → Slicing
//! ```
//!
//! The low-level [`OnsetDetector`] is also public for streaming use: feed
//! it hop-sized buffers and poll [`OnsetDetector::last_onset_seconds`]
//! whenever `process` returns true. The core is single-threaded; run one
//! detector per thread if you parallelize.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod io;
pub mod onset;
pub mod slicing;
pub mod spectral;

// Re-export main types
pub use config::SliceOptions;
pub use error::SliceError;
pub use onset::{OnsetDetector, OnsetMethod};
pub use slicing::{analyze_samples, analyze_slices, SliceAnalysis};
