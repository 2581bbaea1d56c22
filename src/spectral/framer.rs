//! Phase-vocoder style overlap framer
//!
//! Maintains an `N`-sample shift buffer and emits one polar spectrum per
//! hop. Each call shifts the buffer left by the hop size, appends the new
//! samples at the right, and runs the windowed FFT on the full window.
//! The first `ceil(N/H) - 1` calls see a partially-zero buffer; the
//! detector's silence gating keeps that warm-up from producing onsets.

use crate::error::SliceError;
use crate::spectral::fft::ForwardFft;
use crate::spectral::vector::Spectrum;

/// Overlap-add input framer feeding the FFT front-end
#[derive(Debug)]
pub struct SpectralFramer {
    win_size: usize,
    hop_size: usize,
    buffer: Vec<f64>,
    fft: ForwardFft,
}

impl SpectralFramer {
    /// Create a framer with window `win_size` and advance `hop_size`
    ///
    /// # Errors
    ///
    /// Returns `SliceError::InvalidConfig` if either size is zero or the
    /// hop exceeds the window.
    pub fn new(win_size: usize, hop_size: usize) -> Result<Self, SliceError> {
        if win_size == 0 || hop_size == 0 {
            return Err(SliceError::InvalidConfig(
                "Window and hop size must be > 0".to_string(),
            ));
        }
        if hop_size > win_size {
            return Err(SliceError::InvalidConfig(format!(
                "Hop size ({}) must not exceed window size ({})",
                hop_size, win_size
            )));
        }

        Ok(Self {
            win_size,
            hop_size,
            buffer: vec![0.0; win_size],
            fft: ForwardFft::new(win_size)?,
        })
    }

    /// Window length in samples
    pub fn win_size(&self) -> usize {
        self.win_size
    }

    /// Hop length in samples
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// The current raw (pre-window) analysis frame
    pub fn frame(&self) -> &[f64] {
        &self.buffer
    }

    /// Advance by one hop and emit the spectrum of the updated window
    ///
    /// `hop` must hold exactly `hop_size` samples and `spectrum` must have
    /// been created for this framer's window size.
    pub fn process(&mut self, hop: &[f64], spectrum: &mut Spectrum) {
        debug_assert_eq!(hop.len(), self.hop_size);

        let keep = self.win_size - self.hop_size;
        self.buffer.copy_within(self.hop_size.., 0);
        self.buffer[keep..].copy_from_slice(hop);

        self.fft.process(&self.buffer, spectrum);
    }

    /// Zero the shift buffer, restoring the construction state
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sizes_rejected() {
        assert!(SpectralFramer::new(0, 256).is_err());
        assert!(SpectralFramer::new(512, 0).is_err());
        assert!(SpectralFramer::new(256, 512).is_err(), "Hop larger than window");
    }

    #[test]
    fn test_hop_equal_window_allowed() {
        assert!(SpectralFramer::new(512, 512).is_ok());
    }

    #[test]
    fn test_shift_buffer_ordering() {
        let mut framer = SpectralFramer::new(8, 4).unwrap();
        let mut spec = Spectrum::new(8);

        framer.process(&[1.0, 2.0, 3.0, 4.0], &mut spec);
        assert_eq!(framer.frame(), &[0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);

        framer.process(&[5.0, 6.0, 7.0, 8.0], &mut spec);
        assert_eq!(framer.frame(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);

        framer.process(&[9.0, 10.0, 11.0, 12.0], &mut spec);
        assert_eq!(framer.frame(), &[5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_reset_zeroes_window() {
        let mut framer = SpectralFramer::new(8, 4).unwrap();
        let mut spec = Spectrum::new(8);
        framer.process(&[1.0, 2.0, 3.0, 4.0], &mut spec);
        framer.reset();
        assert!(framer.frame().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_warm_up_frames_are_quiet() {
        // With N/H = 2, the first call sees a half-zero window; its
        // spectral energy must be below that of the first full window.
        let win = 512;
        let hop = 256;
        let mut framer = SpectralFramer::new(win, hop).unwrap();
        let mut spec = Spectrum::new(win);

        let loud: Vec<f64> = (0..hop)
            .map(|i| (2.0 * std::f64::consts::PI * 20.0 * i as f64 / win as f64).sin())
            .collect();

        framer.process(&loud, &mut spec);
        let warm_up_energy: f64 = spec.mag.iter().map(|&m| m * m).sum();

        framer.process(&loud, &mut spec);
        let full_energy: f64 = spec.mag.iter().map(|&m| m * m).sum();

        assert!(
            warm_up_energy < full_energy,
            "Warm-up spectrum ({}) should carry less energy than a full window ({})",
            warm_up_energy,
            full_energy
        );
    }
}
