//! Slice analysis pipeline
//!
//! Drives one or more onset detectors over a whole channel buffer and
//! post-processes the detections into slice positions:
//! candidate generation (single method or consensus), optional best-N
//! selection by local energy, optional variance-based position
//! refinement, and an optional minimum-spacing filter, in that order.

use serde::{Deserialize, Serialize};

use crate::config::SliceOptions;
use crate::error::SliceError;
use crate::io::decoder::decode_channel;
use crate::onset::descriptors::OnsetMethod;
use crate::onset::detector::OnsetDetector;
use crate::slicing::consensus::cluster_onsets;
use crate::slicing::refine::{apply_minimum_spacing, refine_positions};

/// Analysis window length for candidate generation
const CANDIDATE_WIN: usize = 512;

/// Hop length for candidate generation
const CANDIDATE_HOP: usize = 256;

/// Relaxed detection threshold used to over-produce candidates
const CANDIDATE_THRESHOLD: f64 = 0.02;

/// Relaxed minimum inter-onset interval for candidate generation
const CANDIDATE_MIN_IOI_MS: f64 = 10.0;

/// Forward window over which onset energy is measured
const ENERGY_WINDOW_MS: f64 = 50.0;

/// Maximum distance between clustered consensus candidates
const CLUSTER_THRESHOLD_S: f64 = 0.05;

/// Fallback consensus cluster size when the configured one is zero
const DEFAULT_MIN_CLUSTER_SIZE: usize = 3;

/// Result of slice analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceAnalysis {
    /// Detected onset times in seconds, strictly increasing
    pub onsets: Vec<f64>,
    /// The analyzed channel samples (channel 0 for multi-channel files)
    pub samples: Vec<f64>,
    /// Sample rate of the audio in Hz
    pub sample_rate: u32,
}

/// Analyze an audio file and return slice positions
///
/// Decodes channel 0 of the file and delegates to [`analyze_samples`].
///
/// # Arguments
///
/// * `path` - Path to the audio file
/// * `options` - Slicing configuration
///
/// # Errors
///
/// Returns `SliceError::Io` if the file cannot be opened,
/// `SliceError::Decode` for invalid or unsupported audio, and
/// `SliceError::InvalidConfig` for bad options.
///
/// # Example
///
/// ```no_run
/// use slicer_dsp::{analyze_slices, SliceOptions};
///
/// let result = analyze_slices("loop.wav", &SliceOptions::default())?;
/// for onset in &result.onsets {
///     println!("slice at {:.3} s", onset);
/// }
/// # Ok::<(), slicer_dsp::SliceError>(())
/// ```
pub fn analyze_slices(path: &str, options: &SliceOptions) -> Result<SliceAnalysis, SliceError> {
    let (samples, sample_rate) = decode_channel(path)?;
    analyze_samples(&samples, sample_rate, options)
}

/// Analyze a channel buffer and return slice positions
///
/// # Arguments
///
/// * `samples` - Mono samples normalized to `[-1, 1]`
/// * `sample_rate` - Sample rate in Hz
/// * `options` - Slicing configuration
///
/// # Returns
///
/// [`SliceAnalysis`] with strictly increasing onset seconds and a copy
/// of the analyzed samples. Empty input yields an empty onset list, not
/// an error.
///
/// # Errors
///
/// Returns `SliceError::InvalidConfig` for an unknown method name, a
/// zero sample rate, or negative timing options.
pub fn analyze_samples(
    samples: &[f64],
    sample_rate: u32,
    options: &SliceOptions,
) -> Result<SliceAnalysis, SliceError> {
    validate_options(options)?;
    if sample_rate == 0 {
        return Err(SliceError::InvalidConfig(
            "Sample rate must be > 0".to_string(),
        ));
    }

    let consensus = options.method == "consensus";
    let method = if consensus {
        None
    } else {
        Some(options.method.parse::<OnsetMethod>()?)
    };

    log::debug!(
        "Analyzing {} samples at {} Hz: method={}, num_slices={}",
        samples.len(),
        sample_rate,
        if options.method.is_empty() { "hfc" } else { options.method.as_str() },
        options.num_slices
    );

    if samples.is_empty() {
        log::warn!("No usable samples to analyze, returning empty result");
        return Ok(SliceAnalysis {
            onsets: Vec::new(),
            samples: Vec::new(),
            sample_rate,
        });
    }

    let mut onsets = match method {
        None => consensus_onsets(samples, sample_rate, options)?,
        Some(m) if options.num_slices > 0 => {
            best_onsets(samples, sample_rate, options.num_slices as usize, m)?
        }
        Some(m) => detect_all(samples, sample_rate, m)?,
    };

    if options.optimize && !onsets.is_empty() {
        onsets = refine_positions(samples, sample_rate, &onsets, options.optimize_window_ms);
        // Refinement can move neighbors past each other; restore order
        // before spacing so every downstream guarantee holds.
        onsets.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        onsets.dedup();
    }

    if options.use_minimum_spacing && !onsets.is_empty() {
        onsets = apply_minimum_spacing(&onsets, options.minimum_spacing_ms);
    }

    log::debug!("Slice analysis produced {} onsets", onsets.len());

    Ok(SliceAnalysis {
        onsets,
        samples: samples.to_vec(),
        sample_rate,
    })
}

fn validate_options(options: &SliceOptions) -> Result<(), SliceError> {
    if options.optimize_window_ms < 0.0 {
        return Err(SliceError::InvalidConfig(format!(
            "Optimize window must be >= 0 ms, got {}",
            options.optimize_window_ms
        )));
    }
    if options.minimum_spacing_ms < 0.0 {
        return Err(SliceError::InvalidConfig(format!(
            "Minimum spacing must be >= 0 ms, got {}",
            options.minimum_spacing_ms
        )));
    }
    Ok(())
}

/// Detect every onset of one method with the relaxed candidate parameters
fn detect_all(
    samples: &[f64],
    sample_rate: u32,
    method: OnsetMethod,
) -> Result<Vec<f64>, SliceError> {
    let mut detector = OnsetDetector::new(method, CANDIDATE_WIN, CANDIDATE_HOP, sample_rate)?;
    detector.set_threshold(CANDIDATE_THRESHOLD);
    detector.set_min_ioi_ms(CANDIDATE_MIN_IOI_MS);

    let mut onsets = Vec::new();
    let mut pos = 0;
    while pos + CANDIDATE_HOP <= samples.len() {
        if detector.process(&samples[pos..pos + CANDIDATE_HOP]) {
            onsets.push(detector.last_onset_seconds());
        }
        pos += CANDIDATE_HOP;
    }

    // Drain the picker lookahead so onsets near the end are not lost
    let tail = [0.0f64; CANDIDATE_HOP];
    for _ in 0..(CANDIDATE_WIN / CANDIDATE_HOP + 2) {
        if detector.process(&tail) {
            onsets.push(detector.last_onset_seconds());
        }
    }

    log::debug!(
        "Method {} produced {} candidate onsets",
        method.as_str(),
        onsets.len()
    );

    Ok(onsets)
}

/// Onset with its measured local energy
struct RankedOnset {
    time: f64,
    energy: f64,
}

/// Detect candidates, rank by local energy, keep the top `target` slices
fn best_onsets(
    samples: &[f64],
    sample_rate: u32,
    target: usize,
    method: OnsetMethod,
) -> Result<Vec<f64>, SliceError> {
    let candidates = detect_all(samples, sample_rate, method)?;
    Ok(select_by_energy(samples, sample_rate, candidates, target))
}

/// Keep the `target` highest-energy onsets, reordered chronologically
fn select_by_energy(
    samples: &[f64],
    sample_rate: u32,
    candidates: Vec<f64>,
    target: usize,
) -> Vec<f64> {
    let mut ranked: Vec<RankedOnset> = candidates
        .into_iter()
        .map(|time| RankedOnset {
            time,
            energy: onset_energy(samples, sample_rate, time),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.energy
            .partial_cmp(&a.energy)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(target);

    let mut times: Vec<f64> = ranked.into_iter().map(|r| r.time).collect();
    times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    times
}

/// RMS energy in a short window starting at the onset
fn onset_energy(samples: &[f64], sample_rate: u32, onset_s: f64) -> f64 {
    let window = (ENERGY_WINDOW_MS * sample_rate as f64 / 1000.0) as usize;
    let start = ((onset_s * sample_rate as f64) as usize).min(samples.len());
    let end = (start + window).min(samples.len());
    if start >= end {
        return 0.0;
    }

    let sum_sq: f64 = samples[start..end].iter().map(|&x| x * x).sum();
    (sum_sq / (end - start) as f64).sqrt()
}

/// Run every method, merge the detections, and keep agreed clusters
fn consensus_onsets(
    samples: &[f64],
    sample_rate: u32,
    options: &SliceOptions,
) -> Result<Vec<f64>, SliceError> {
    let mut all = Vec::new();
    for method in OnsetMethod::ALL {
        let mut onsets = detect_all(samples, sample_rate, method)?;
        all.append(&mut onsets);
    }

    if all.is_empty() {
        return Ok(Vec::new());
    }

    all.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let min_size = if options.min_consensus_cluster_size == 0 {
        DEFAULT_MIN_CLUSTER_SIZE
    } else {
        options.min_consensus_cluster_size as usize
    };

    let merged = cluster_onsets(&all, CLUSTER_THRESHOLD_S, min_size);
    log::debug!(
        "Consensus merged {} raw onsets into {} markers",
        all.len(),
        merged.len()
    );

    let target = options.num_slices as usize;
    if target > 0 && merged.len() > target {
        return Ok(select_by_energy(samples, sample_rate, merged, target));
    }

    Ok(merged)
}
