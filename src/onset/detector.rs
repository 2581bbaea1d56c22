//! Onset detector driver
//!
//! Wires the framer, optional whitening, novelty descriptor, smoothing
//! filter, and peak picker into a per-hop `process` call. The detector
//! owns every buffer for its lifetime; per-frame processing does not
//! allocate.

use crate::error::SliceError;
use crate::onset::descriptors::{OnsetMethod, SpectralDescriptor};
use crate::onset::filter::BiquadFilter;
use crate::onset::peak_picker::PeakPicker;
use crate::spectral::framer::SpectralFramer;
use crate::spectral::vector::{db_spl, Spectrum};
use crate::spectral::whitening::SpectralWhitening;

/// Frames of picker delay compensated in reported onset times
const LOOKAHEAD_FRAMES: u64 = 3;

/// Default detection threshold
const DEFAULT_THRESHOLD: f64 = 0.3;

/// Default silence floor in dB
const DEFAULT_SILENCE_DB: f64 = -70.0;

/// Default minimum inter-onset interval in milliseconds
const DEFAULT_MIN_IOI_MS: f64 = 20.0;

/// Streaming onset detector
///
/// Constructed for one `(method, win_size, hop_size, sample_rate)`
/// combination; feed it hop-sized sample buffers and poll the last onset
/// time after each call that returns true.
#[derive(Debug)]
pub struct OnsetDetector {
    method: OnsetMethod,
    win_size: usize,
    hop_size: usize,
    sample_rate: u32,
    framer: SpectralFramer,
    spectrum: Spectrum,
    descriptor: SpectralDescriptor,
    whitening: SpectralWhitening,
    apply_whitening: bool,
    compression: f64,
    smoother: BiquadFilter,
    picker: PeakPicker,
    silence_db: f64,
    // Per-frame silence flags aligned with the picker's candidate delay;
    // index 0 belongs to the frame currently up for confirmation.
    silence_ring: [bool; 3],
    min_ioi_samples: u64,
    total_samples: u64,
    last_onset: Option<u64>,
}

impl OnsetDetector {
    /// Create a detector
    ///
    /// # Arguments
    ///
    /// * `method` - Novelty function to drive the picker with
    /// * `win_size` - Analysis window length in samples
    /// * `hop_size` - Hop between successive windows in samples
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Errors
    ///
    /// Returns `SliceError::InvalidConfig` if either size is zero, the hop
    /// exceeds the window, or the sample rate is zero.
    pub fn new(
        method: OnsetMethod,
        win_size: usize,
        hop_size: usize,
        sample_rate: u32,
    ) -> Result<Self, SliceError> {
        if sample_rate == 0 {
            return Err(SliceError::InvalidConfig(
                "Sample rate must be > 0".to_string(),
            ));
        }

        let framer = SpectralFramer::new(win_size, hop_size)?;

        log::debug!(
            "Creating onset detector: method={}, win={}, hop={}, rate={} Hz",
            method.as_str(),
            win_size,
            hop_size,
            sample_rate
        );

        let mut detector = Self {
            method,
            win_size,
            hop_size,
            sample_rate,
            framer,
            spectrum: Spectrum::new(win_size),
            descriptor: SpectralDescriptor::new(method, win_size),
            whitening: SpectralWhitening::new(win_size, hop_size, sample_rate),
            apply_whitening: false,
            compression: 0.0,
            smoother: BiquadFilter::novelty_smoother(),
            picker: PeakPicker::new(),
            silence_db: DEFAULT_SILENCE_DB,
            silence_ring: [true; 3],
            min_ioi_samples: 0,
            total_samples: 0,
            last_onset: None,
        };
        detector.set_threshold(DEFAULT_THRESHOLD);
        detector.set_min_ioi_ms(DEFAULT_MIN_IOI_MS);
        Ok(detector)
    }

    /// Novelty method driving this detector
    pub fn method(&self) -> OnsetMethod {
        self.method
    }

    /// Analysis window length in samples
    pub fn win_size(&self) -> usize {
        self.win_size
    }

    /// Hop length in samples
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Set the peak-picking threshold
    pub fn set_threshold(&mut self, threshold: f64) {
        self.picker.set_threshold(threshold);
    }

    /// Peak-picking threshold
    pub fn threshold(&self) -> f64 {
        self.picker.threshold()
    }

    /// Set the silence floor in dB; frames quieter than this never fire
    pub fn set_silence(&mut self, db: f64) {
        self.silence_db = db;
    }

    /// Silence floor in dB
    pub fn silence(&self) -> f64 {
        self.silence_db
    }

    /// Set the minimum inter-onset interval in samples
    pub fn set_min_ioi_samples(&mut self, samples: u64) {
        self.min_ioi_samples = samples;
    }

    /// Minimum inter-onset interval in samples
    pub fn min_ioi_samples(&self) -> u64 {
        self.min_ioi_samples
    }

    /// Set the minimum inter-onset interval in milliseconds
    pub fn set_min_ioi_ms(&mut self, ms: f64) {
        let ms = ms.max(0.0);
        self.min_ioi_samples = (ms * self.sample_rate as f64 / 1000.0).round() as u64;
    }

    /// Minimum inter-onset interval in milliseconds
    pub fn min_ioi_ms(&self) -> f64 {
        self.min_ioi_samples as f64 * 1000.0 / self.sample_rate as f64
    }

    /// Enable or disable adaptive spectral whitening
    pub fn set_whitening(&mut self, enabled: bool) {
        self.apply_whitening = enabled;
    }

    /// Whether adaptive whitening is applied before the novelty function
    pub fn whitening(&self) -> bool {
        self.apply_whitening
    }

    /// Whitening stage, for relax-time and floor adjustment
    pub fn whitening_mut(&mut self) -> &mut SpectralWhitening {
        &mut self.whitening
    }

    /// Set the log-compression factor; 0 disables compression
    ///
    /// When `lambda > 0` every magnitude becomes `ln(1 + lambda * m)`
    /// before the novelty function. Negative values disable compression.
    pub fn set_compression(&mut self, lambda: f64) {
        if lambda < 0.0 {
            log::warn!("Ignoring negative compression factor {}", lambda);
            self.compression = 0.0;
        } else {
            self.compression = lambda;
        }
    }

    /// Log-compression factor (0 when disabled)
    pub fn compression(&self) -> f64 {
        self.compression
    }

    /// Consume one hop of samples; true when an onset fired on this call
    ///
    /// `hop` must hold exactly `hop_size` samples in `[-1, 1]`.
    pub fn process(&mut self, hop: &[f64]) -> bool {
        self.framer.process(hop, &mut self.spectrum);
        self.silence_ring.copy_within(1.., 0);
        self.silence_ring[2] = db_spl(self.framer.frame()) < self.silence_db;
        let candidate_silent = self.silence_ring[0];

        if self.apply_whitening {
            self.whitening.apply(&mut self.spectrum);
        }
        if self.compression > 0.0 {
            for m in self.spectrum.mag.iter_mut() {
                *m = (1.0 + self.compression * *m).ln();
            }
        }

        let novelty = self.descriptor.compute(&self.spectrum);
        let smoothed = self.smoother.process_sample(novelty);
        let picked = self.picker.process(smoothed);

        let mut fired = false;
        if picked && !candidate_silent {
            let lookahead = LOOKAHEAD_FRAMES * self.hop_size as u64;
            let onset_at = self.total_samples.saturating_sub(lookahead);
            let accepted = match self.last_onset {
                None => true,
                Some(last) => onset_at > last && onset_at - last >= self.min_ioi_samples,
            };
            if accepted {
                self.last_onset = Some(onset_at);
                fired = true;
            }
        }

        self.total_samples += self.hop_size as u64;
        fired
    }

    /// Total samples consumed so far
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Sample position of the last detected onset (0 before any onset)
    pub fn last_onset_samples(&self) -> u64 {
        self.last_onset.unwrap_or(0)
    }

    /// Last detected onset in seconds
    pub fn last_onset_seconds(&self) -> f64 {
        self.last_onset_samples() as f64 / self.sample_rate as f64
    }

    /// Last detected onset in milliseconds
    pub fn last_onset_ms(&self) -> f64 {
        self.last_onset_seconds() * 1000.0
    }

    /// Zero all history and counters, restoring the construction state
    ///
    /// Tuning parameters (threshold, silence, min-IOI, whitening,
    /// compression) are kept.
    pub fn reset(&mut self) {
        self.framer.reset();
        self.descriptor.reset();
        self.whitening.reset();
        self.smoother.reset();
        self.picker.reset();
        self.silence_ring = [true; 3];
        self.total_samples = 0;
        self.last_onset = None;
    }
}
