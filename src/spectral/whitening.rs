//! Adaptive spectral whitening
//!
//! Per-bin peak follower that normalizes each magnitude by its tracked
//! recent maximum, flattening spectral tilt so that quiet high-frequency
//! transients weigh as much as loud low-frequency content. Disabled by
//! default; the onset detector enables it on request.

use crate::spectral::vector::Spectrum;

/// Default floor for the tracked per-bin peaks
const DEFAULT_FLOOR: f64 = 1e-4;

/// Default relaxation time in milliseconds
const DEFAULT_RELAX_TIME_MS: f64 = 250.0;

/// Per-bin adaptive magnitude normalizer
#[derive(Debug)]
pub struct SpectralWhitening {
    hop_size: usize,
    sample_rate: u32,
    relax_time_ms: f64,
    decay: f64,
    floor: f64,
    peaks: Vec<f64>,
}

impl SpectralWhitening {
    /// Create a whitening stage for `win_size`/`hop_size` analysis at `sample_rate`
    pub fn new(win_size: usize, hop_size: usize, sample_rate: u32) -> Self {
        let bins = win_size / 2 + 1;
        let mut w = Self {
            hop_size,
            sample_rate,
            relax_time_ms: DEFAULT_RELAX_TIME_MS,
            decay: 0.0,
            floor: DEFAULT_FLOOR,
            peaks: vec![DEFAULT_FLOOR; bins],
        };
        w.update_decay();
        w
    }

    /// Set the peak relaxation time in milliseconds
    pub fn set_relax_time(&mut self, relax_time_ms: f64) {
        self.relax_time_ms = relax_time_ms;
        self.update_decay();
    }

    /// Peak relaxation time in milliseconds
    pub fn relax_time(&self) -> f64 {
        self.relax_time_ms
    }

    /// Set the minimum tracked peak value
    pub fn set_floor(&mut self, floor: f64) {
        self.floor = floor;
    }

    /// Minimum tracked peak value
    pub fn floor(&self) -> f64 {
        self.floor
    }

    fn update_decay(&mut self) {
        let relax_samples = self.sample_rate as f64 * self.relax_time_ms / 1000.0;
        self.decay = if relax_samples > 0.0 {
            (-(self.hop_size as f64) / relax_samples).exp()
        } else {
            0.0
        };
    }

    /// Normalize the spectrum magnitudes in place by the tracked peaks
    pub fn apply(&mut self, spectrum: &mut Spectrum) {
        for (mag, peak) in spectrum.mag.iter_mut().zip(self.peaks.iter_mut()) {
            let m = *mag;
            let tracked = if m > *peak {
                m
            } else {
                m + (*peak - m) * self.decay
            };
            *peak = tracked.max(self.floor);
            *mag = m / *peak;
        }
    }

    /// Reset tracked peaks to the floor
    pub fn reset(&mut self) {
        self.peaks.fill(self.floor);
    }
}
