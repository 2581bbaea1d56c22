//! Onset position refinement and spacing filter
//!
//! Detected onsets land on frame boundaries; refinement searches a small
//! window around each one for the sample where the signal statistics
//! change, picking the split point that maximizes the variance on the
//! right minus the variance on the left. The spacing filter then thins
//! the refined list to a minimum inter-slice distance.

/// Samples kept clear of each window edge when searching split points
const SPLIT_MARGIN: usize = 5;

/// Windows smaller than this many samples are left unrefined
const MIN_REFINE_WINDOW: usize = 10;

/// Refine every onset position with the variance-change criterion
pub fn refine_positions(
    samples: &[f64],
    sample_rate: u32,
    onsets: &[f64],
    window_ms: f64,
) -> Vec<f64> {
    onsets
        .iter()
        .map(|&t| optimal_position(samples, sample_rate, t, window_ms))
        .collect()
}

/// Find the sample near `onset_s` where variance jumps, as a time in seconds
///
/// A window of `window_ms` is centered on the onset (clipped to the
/// buffer). Every candidate split point inside it is scored with the
/// variance of the samples to its right minus the variance to its left;
/// the best-scoring split becomes the refined onset. Windows too small
/// to score return the original time.
fn optimal_position(samples: &[f64], sample_rate: u32, onset_s: f64, window_ms: f64) -> f64 {
    let onset_sample = (onset_s * sample_rate as f64) as usize;
    let window_samples = (window_ms * sample_rate as f64 / 1000.0) as usize;
    let half = window_samples / 2;

    let start = onset_sample.saturating_sub(half);
    let end = (onset_sample + half).min(samples.len());

    if end.saturating_sub(start) < MIN_REFINE_WINDOW {
        return onset_s;
    }

    let mut best_diff = f64::NEG_INFINITY;
    let mut best = onset_sample;

    for split in (start + SPLIT_MARGIN)..(end - SPLIT_MARGIN) {
        let left = variance(samples, start, split);
        let right = variance(samples, split, end);
        let diff = right - left;
        if diff > best_diff {
            best_diff = diff;
            best = split;
        }
    }

    best as f64 / sample_rate as f64
}

/// Thin onsets to a minimum spacing; the first onset is always kept
///
/// `onsets` must be sorted ascending. Any onset closer than
/// `minimum_spacing_ms` to the last kept one is dropped.
pub fn apply_minimum_spacing(onsets: &[f64], minimum_spacing_ms: f64) -> Vec<f64> {
    if onsets.is_empty() {
        return Vec::new();
    }

    let spacing_s = minimum_spacing_ms / 1000.0;
    let mut kept = vec![onsets[0]];

    for &t in &onsets[1..] {
        if t - *kept.last().expect("kept is never empty") >= spacing_s {
            kept.push(t);
        }
    }

    kept
}

/// Variance of `samples[start..end]` (0 for empty or invalid ranges)
fn variance(samples: &[f64], start: usize, end: usize) -> f64 {
    if start >= end || end > samples.len() {
        return 0.0;
    }
    let count = (end - start) as f64;

    let mean = samples[start..end].iter().sum::<f64>() / count;
    let sum_sq: f64 = samples[start..end]
        .iter()
        .map(|&x| {
            let d = x - mean;
            d * d
        })
        .sum();

    sum_sq / count
}
