//! Adaptive-threshold peak picker
//!
//! Decides, once per frame, whether the novelty stream just passed a
//! local maximum worth calling an onset. The picker looks at a short
//! window of recent values: the candidate sits two frames behind the
//! newest value so its right neighborhood is known, and a running median
//! of the window (smoothed over the last few frames) serves as an
//! adaptive bias that tracks the local novelty level.

use crate::spectral::vector::{is_peak, median};

/// Length of the sliding novelty window
const WINDOW_LEN: usize = 5;

/// Index of the candidate inside the window (two future values known)
const CANDIDATE: usize = 2;

/// Number of recent window medians averaged into the bias
const MEDIAN_LEN: usize = 3;

/// Default picker threshold above the adaptive bias
const DEFAULT_THRESHOLD: f64 = 0.1;

/// Local-maximum detector with median-tracking adaptive bias
#[derive(Debug)]
pub struct PeakPicker {
    threshold: f64,
    window: [f64; WINDOW_LEN],
    medians: [f64; MEDIAN_LEN],
    seen: usize,
}

impl Default for PeakPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl PeakPicker {
    /// Create a picker with the default threshold
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            window: [0.0; WINDOW_LEN],
            medians: [0.0; MEDIAN_LEN],
            seen: 0,
        }
    }

    /// Set the detection threshold above the adaptive bias
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    /// Detection threshold above the adaptive bias
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Push the newest filtered novelty value; true when the candidate
    /// two frames back is a confirmed peak
    pub fn process(&mut self, value: f64) -> bool {
        self.window.copy_within(1.., 0);
        self.window[WINDOW_LEN - 1] = value;

        self.medians.copy_within(1.., 0);
        self.medians[MEDIAN_LEN - 1] = median(&self.window);

        self.seen += 1;
        if self.seen < WINDOW_LEN {
            return false;
        }

        // Bias smoothed over the last few window medians
        let tracked = if self.seen - WINDOW_LEN + 1 < MEDIAN_LEN {
            &self.medians[MEDIAN_LEN - (self.seen - WINDOW_LEN + 1)..]
        } else {
            &self.medians[..]
        };
        let bias = tracked.iter().sum::<f64>() / tracked.len() as f64;

        let candidate = self.window[CANDIDATE];
        is_peak(&self.window, CANDIDATE) && candidate - bias > self.threshold
    }

    /// Zero the window and bias history
    pub fn reset(&mut self) {
        self.window = [0.0; WINDOW_LEN];
        self.medians = [0.0; MEDIAN_LEN];
        self.seen = 0;
    }
}
