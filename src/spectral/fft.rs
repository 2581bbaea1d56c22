//! Hanning-windowed forward FFT producing polar-form spectra
//!
//! Wraps the rustfft planner behind the front-end contract used by the
//! onset pipeline: a length-`N` real frame goes in, `N/2 + 1` polar bins
//! come out. The FFT plan, window table, and scratch buffers are created
//! once at construction; per-frame processing does not allocate.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::SliceError;
use crate::spectral::vector::Spectrum;

/// Windowed real-to-polar forward transform
pub struct ForwardFft {
    win_size: usize,
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    work: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl std::fmt::Debug for ForwardFft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardFft")
            .field("win_size", &self.win_size)
            .finish()
    }
}

impl ForwardFft {
    /// Create a forward transform for analysis frames of `win_size` samples
    ///
    /// # Errors
    ///
    /// Returns `SliceError::InvalidConfig` if `win_size` is zero.
    pub fn new(win_size: usize) -> Result<Self, SliceError> {
        if win_size == 0 {
            return Err(SliceError::InvalidConfig(
                "FFT window size must be > 0".to_string(),
            ));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(win_size);
        let scratch_len = fft.get_inplace_scratch_len();

        Ok(Self {
            win_size,
            fft,
            window: hanning(win_size),
            work: vec![Complex::new(0.0, 0.0); win_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        })
    }

    /// Analysis frame length
    pub fn win_size(&self) -> usize {
        self.win_size
    }

    /// Transform a real frame into the polar spectrum
    ///
    /// The frame is multiplied by the Hanning window table, transformed,
    /// and bins `0..=N/2` are written to `spectrum` in polar form. Bin 0
    /// keeps the DC magnitude with phase 0.
    ///
    /// `frame.len()` and `spectrum.bins()` must match the construction
    /// size; this is guaranteed by the framer, which owns both.
    pub fn process(&mut self, frame: &[f64], spectrum: &mut Spectrum) {
        debug_assert_eq!(frame.len(), self.win_size);
        debug_assert_eq!(spectrum.bins(), self.win_size / 2 + 1);

        for (work, (&x, &w)) in self
            .work
            .iter_mut()
            .zip(frame.iter().zip(self.window.iter()))
        {
            *work = Complex::new(x * w, 0.0);
        }

        self.fft.process_with_scratch(&mut self.work, &mut self.scratch);

        // DC carries no meaningful phase
        spectrum.mag[0] = self.work[0].re.abs();
        spectrum.phase[0] = 0.0;

        for bin in 1..spectrum.bins() {
            let c = self.work[bin];
            spectrum.mag[bin] = c.norm();
            spectrum.phase[bin] = c.im.atan2(c.re);
        }
    }
}

/// Precompute a Hanning window table of length `n`
fn hanning(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectrum_layout() {
        let mut fft = ForwardFft::new(512).unwrap();
        let frame = vec![0.0; 512];
        let mut spec = Spectrum::new(512);
        fft.process(&frame, &mut spec);
        assert_eq!(spec.bins(), 257);
    }

    #[test]
    fn test_zero_window_size_rejected() {
        assert!(ForwardFft::new(0).is_err());
    }

    #[test]
    fn test_silence_yields_zero_magnitudes() {
        let mut fft = ForwardFft::new(512).unwrap();
        let frame = vec![0.0; 512];
        let mut spec = Spectrum::new(512);
        fft.process(&frame, &mut spec);
        assert!(
            spec.mag.iter().all(|&m| m == 0.0),
            "Silence should produce an all-zero spectrum"
        );
    }

    #[test]
    fn test_magnitudes_non_negative() {
        let win = 512;
        let mut fft = ForwardFft::new(win).unwrap();
        let frame: Vec<f64> = (0..win)
            .map(|i| (2.0 * std::f64::consts::PI * 13.0 * i as f64 / win as f64).sin())
            .collect();
        let mut spec = Spectrum::new(win);
        fft.process(&frame, &mut spec);
        assert!(spec.mag.iter().all(|&m| m >= 0.0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        // A windowed sine at exactly bin 13 must dominate its neighborhood
        let win = 512;
        let mut fft = ForwardFft::new(win).unwrap();
        let frame: Vec<f64> = (0..win)
            .map(|i| (2.0 * std::f64::consts::PI * 13.0 * i as f64 / win as f64).sin())
            .collect();
        let mut spec = Spectrum::new(win);
        fft.process(&frame, &mut spec);

        let peak_bin = spec
            .mag
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, 13, "Expected spectral peak at bin 13, got {}", peak_bin);
    }

    #[test]
    fn test_phases_in_principal_range() {
        let win = 256;
        let mut fft = ForwardFft::new(win).unwrap();
        let frame: Vec<f64> = (0..win).map(|i| ((i * 7919) % 101) as f64 / 101.0 - 0.5).collect();
        let mut spec = Spectrum::new(win);
        fft.process(&frame, &mut spec);
        assert!(
            spec.phase
                .iter()
                .all(|&p| p > -std::f64::consts::PI - 1e-12 && p <= std::f64::consts::PI + 1e-12),
            "Phases must lie in (-pi, pi]"
        );
    }
}
