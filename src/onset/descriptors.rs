//! Spectral onset-detection functions
//!
//! Each descriptor reduces the current polar spectrum (plus whatever
//! history its method needs) to a single non-negative novelty scalar.
//! History is modeled as a tagged state carrying only the buffers the
//! method reads: none for energy/HFC, previous magnitudes for the
//! difference family, previous and previous-previous phases for the
//! phase family, and both for the complex domain.
//!
//! # Reference
//!
//! Bello, J. P., Daudet, L., Abdallah, S., Duxbury, C., Davies, M., & Sandler, M. B. (2005).
//! A Tutorial on Onset Detection in Music Signals.
//! *IEEE Transactions on Speech and Audio Processing*, 13(5), 1035-1047.

use std::str::FromStr;

use crate::error::SliceError;
use crate::spectral::vector::Spectrum;

/// Numerical stability epsilon for ratio-based descriptors
const EPSILON: f64 = 1e-10;

/// Onset detection method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnsetMethod {
    /// Local spectral energy
    Energy,
    /// High-frequency content (bin-weighted energy)
    Hfc,
    /// Complex-domain deviation from the phase-predicted spectrum
    Complex,
    /// Phase deviation
    Phase,
    /// Magnitude-weighted phase deviation
    WPhase,
    /// Half-wave rectified spectral difference
    SpecDiff,
    /// Kullback-Liebler divergence between successive spectra
    Kl,
    /// Modified Kullback-Liebler divergence
    Mkl,
    /// Normalized positive spectral flux
    SpecFlux,
}

impl OnsetMethod {
    /// Every concrete method, in the order the consensus mode runs them
    pub const ALL: [OnsetMethod; 9] = [
        OnsetMethod::Energy,
        OnsetMethod::Hfc,
        OnsetMethod::Complex,
        OnsetMethod::Phase,
        OnsetMethod::WPhase,
        OnsetMethod::SpecDiff,
        OnsetMethod::Kl,
        OnsetMethod::Mkl,
        OnsetMethod::SpecFlux,
    ];

    /// Canonical name accepted by [`OnsetMethod::from_str`]
    pub fn as_str(&self) -> &'static str {
        match self {
            OnsetMethod::Energy => "energy",
            OnsetMethod::Hfc => "hfc",
            OnsetMethod::Complex => "complex",
            OnsetMethod::Phase => "phase",
            OnsetMethod::WPhase => "wphase",
            OnsetMethod::SpecDiff => "specdiff",
            OnsetMethod::Kl => "kl",
            OnsetMethod::Mkl => "mkl",
            OnsetMethod::SpecFlux => "specflux",
        }
    }
}

impl FromStr for OnsetMethod {
    type Err = SliceError;

    /// Parse a method name; the empty string selects `hfc`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "hfc" => Ok(OnsetMethod::Hfc),
            "energy" => Ok(OnsetMethod::Energy),
            "complex" => Ok(OnsetMethod::Complex),
            "phase" => Ok(OnsetMethod::Phase),
            "wphase" => Ok(OnsetMethod::WPhase),
            "specdiff" => Ok(OnsetMethod::SpecDiff),
            "kl" => Ok(OnsetMethod::Kl),
            "mkl" => Ok(OnsetMethod::Mkl),
            "specflux" => Ok(OnsetMethod::SpecFlux),
            other => Err(SliceError::InvalidConfig(format!(
                "Unknown onset method: '{}'",
                other
            ))),
        }
    }
}

/// Spectrum history retained between frames, per method family
#[derive(Debug)]
enum History {
    /// Energy, HFC
    None,
    /// SpecDiff, KL, MKL, SpecFlux
    Magnitude { prev_mag: Vec<f64> },
    /// Phase, WPhase
    Phase { prev: Vec<f64>, prev2: Vec<f64> },
    /// Complex domain
    Complex {
        prev_mag: Vec<f64>,
        prev_phase: Vec<f64>,
        prev2_phase: Vec<f64>,
    },
}

/// Stateful novelty function over successive spectra
#[derive(Debug)]
pub struct SpectralDescriptor {
    method: OnsetMethod,
    history: History,
}

impl SpectralDescriptor {
    /// Create a descriptor for `method` over windows of `win_size` samples
    pub fn new(method: OnsetMethod, win_size: usize) -> Self {
        let bins = win_size / 2 + 1;
        let history = match method {
            OnsetMethod::Energy | OnsetMethod::Hfc => History::None,
            OnsetMethod::SpecDiff | OnsetMethod::Kl | OnsetMethod::Mkl | OnsetMethod::SpecFlux => {
                History::Magnitude {
                    prev_mag: vec![0.0; bins],
                }
            }
            OnsetMethod::Phase | OnsetMethod::WPhase => History::Phase {
                prev: vec![0.0; bins],
                prev2: vec![0.0; bins],
            },
            OnsetMethod::Complex => History::Complex {
                prev_mag: vec![0.0; bins],
                prev_phase: vec![0.0; bins],
                prev2_phase: vec![0.0; bins],
            },
        };
        Self { method, history }
    }

    /// Method this descriptor computes
    pub fn method(&self) -> OnsetMethod {
        self.method
    }

    /// Reduce the spectrum to one novelty scalar and push it into history
    ///
    /// Always returns a finite value >= 0; NaN spectra reduce to 0.
    pub fn compute(&mut self, spectrum: &Spectrum) -> f64 {
        let value = match self.method {
            OnsetMethod::Energy => energy(spectrum),
            OnsetMethod::Hfc => hfc(spectrum),
            OnsetMethod::SpecDiff => self.with_prev_mag(spectrum, spec_diff),
            OnsetMethod::SpecFlux => self.with_prev_mag(spectrum, spec_flux),
            OnsetMethod::Kl => self.with_prev_mag(spectrum, kl),
            OnsetMethod::Mkl => self.with_prev_mag(spectrum, mkl),
            OnsetMethod::Phase => self.phase_deviation(spectrum, false),
            OnsetMethod::WPhase => self.phase_deviation(spectrum, true),
            OnsetMethod::Complex => self.complex_domain(spectrum),
        };
        self.push(spectrum);

        if value.is_finite() {
            value.max(0.0)
        } else {
            0.0
        }
    }

    /// Zero all history buffers
    pub fn reset(&mut self) {
        match &mut self.history {
            History::None => {}
            History::Magnitude { prev_mag } => prev_mag.fill(0.0),
            History::Phase { prev, prev2 } => {
                prev.fill(0.0);
                prev2.fill(0.0);
            }
            History::Complex {
                prev_mag,
                prev_phase,
                prev2_phase,
            } => {
                prev_mag.fill(0.0);
                prev_phase.fill(0.0);
                prev2_phase.fill(0.0);
            }
        }
    }

    fn with_prev_mag(&self, spectrum: &Spectrum, f: fn(&[f64], &[f64]) -> f64) -> f64 {
        match &self.history {
            History::Magnitude { prev_mag } => f(&spectrum.mag, prev_mag),
            _ => unreachable!("magnitude history guaranteed by constructor"),
        }
    }

    fn phase_deviation(&self, spectrum: &Spectrum, weighted: bool) -> f64 {
        let History::Phase { prev, prev2 } = &self.history else {
            unreachable!("phase history guaranteed by constructor");
        };
        let mut total = 0.0;
        for k in 0..spectrum.bins() {
            let dev = princarg(spectrum.phase[k] - 2.0 * prev[k] + prev2[k]).abs();
            total += if weighted { spectrum.mag[k] * dev } else { dev };
        }
        total
    }

    fn complex_domain(&self, spectrum: &Spectrum) -> f64 {
        let History::Complex {
            prev_mag,
            prev_phase,
            prev2_phase,
        } = &self.history
        else {
            unreachable!("complex history guaranteed by constructor");
        };
        let mut total = 0.0;
        for k in 0..spectrum.bins() {
            // Distance between the observed bin and its phase-predicted
            // position m_prev * e^{i(2*phi_prev - phi_prev2)}
            let predicted_phase = 2.0 * prev_phase[k] - prev2_phase[k];
            let m = spectrum.mag[k];
            let mp = prev_mag[k];
            let d = (spectrum.phase[k] - predicted_phase).cos();
            let dist2 = m * m + mp * mp - 2.0 * m * mp * d;
            total += dist2.max(0.0).sqrt();
        }
        total
    }

    fn push(&mut self, spectrum: &Spectrum) {
        match &mut self.history {
            History::None => {}
            History::Magnitude { prev_mag } => prev_mag.copy_from_slice(&spectrum.mag),
            History::Phase { prev, prev2 } => {
                prev2.copy_from_slice(prev);
                prev.copy_from_slice(&spectrum.phase);
            }
            History::Complex {
                prev_mag,
                prev_phase,
                prev2_phase,
            } => {
                prev2_phase.copy_from_slice(prev_phase);
                prev_phase.copy_from_slice(&spectrum.phase);
                prev_mag.copy_from_slice(&spectrum.mag);
            }
        }
    }
}

fn energy(spectrum: &Spectrum) -> f64 {
    spectrum.mag.iter().map(|&m| m * m).sum()
}

fn hfc(spectrum: &Spectrum) -> f64 {
    spectrum
        .mag
        .iter()
        .enumerate()
        .map(|(k, &m)| (k + 1) as f64 * m * m)
        .sum()
}

fn spec_diff(mag: &[f64], prev: &[f64]) -> f64 {
    mag.iter()
        .zip(prev.iter())
        .map(|(&m, &p)| (m - p).max(0.0))
        .sum()
}

fn spec_flux(mag: &[f64], prev: &[f64]) -> f64 {
    let positive: f64 = mag
        .iter()
        .zip(prev.iter())
        .map(|(&m, &p)| (m - p).max(0.0))
        .sum();
    let norm: f64 = mag.iter().sum();
    if norm > 0.0 {
        positive / norm
    } else {
        0.0
    }
}

fn kl(mag: &[f64], prev: &[f64]) -> f64 {
    let total: f64 = mag
        .iter()
        .zip(prev.iter())
        .map(|(&m, &p)| m * ((m + EPSILON) / (p + EPSILON)).ln())
        .sum();
    total.max(0.0)
}

fn mkl(mag: &[f64], prev: &[f64]) -> f64 {
    mag.iter()
        .zip(prev.iter())
        .map(|(&m, &p)| (1.0 + m / (p + EPSILON)).ln())
        .sum()
}

/// Principal-value argument: map an angle to `(-pi, pi]`
fn princarg(phase: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    let wrapped = phase.rem_euclid(two_pi);
    if wrapped > std::f64::consts::PI {
        wrapped - two_pi
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PI: f64 = std::f64::consts::PI;

    fn spectrum_from_mags(mags: &[f64]) -> Spectrum {
        let win = (mags.len() - 1) * 2;
        let mut s = Spectrum::new(win);
        s.mag.copy_from_slice(mags);
        s
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("hfc".parse::<OnsetMethod>().unwrap(), OnsetMethod::Hfc);
        assert_eq!("".parse::<OnsetMethod>().unwrap(), OnsetMethod::Hfc);
        assert_eq!("wphase".parse::<OnsetMethod>().unwrap(), OnsetMethod::WPhase);
        assert!("unknown".parse::<OnsetMethod>().is_err());
        for method in OnsetMethod::ALL {
            assert_eq!(method.as_str().parse::<OnsetMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_princarg_range() {
        for p in [-10.0, -PI, -0.5, 0.0, 0.5, PI, 10.0, 100.0] {
            let w = princarg(p);
            assert!(w > -PI - 1e-12 && w <= PI + 1e-12, "princarg({}) = {}", p, w);
        }
        assert!((princarg(3.0 * PI) - PI).abs() < 1e-12);
        assert!((princarg(-0.5 * PI) + 0.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_energy_and_hfc() {
        let spec = spectrum_from_mags(&[1.0, 2.0, 3.0]);
        let mut energy = SpectralDescriptor::new(OnsetMethod::Energy, 4);
        assert!((energy.compute(&spec) - 14.0).abs() < 1e-12);

        let mut hfc = SpectralDescriptor::new(OnsetMethod::Hfc, 4);
        // 1*1 + 2*4 + 3*9 = 36
        assert!((hfc.compute(&spec) - 36.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_methods_zero_on_silence() {
        for method in OnsetMethod::ALL {
            let mut desc = SpectralDescriptor::new(method, 512);
            let spec = Spectrum::new(512);
            for _ in 0..4 {
                let v = desc.compute(&spec);
                assert!(
                    v.abs() < 1e-9,
                    "{:?} should report ~0 on silence, got {}",
                    method,
                    v
                );
            }
        }
    }

    #[test]
    fn test_spec_diff_rectifies() {
        let mut desc = SpectralDescriptor::new(OnsetMethod::SpecDiff, 4);
        let rising = spectrum_from_mags(&[1.0, 2.0, 3.0]);
        let first = desc.compute(&rising);
        assert!((first - 6.0).abs() < 1e-12, "First frame diffs against zeros");

        // Falling magnitudes contribute nothing
        let falling = spectrum_from_mags(&[0.5, 1.0, 1.5]);
        let second = desc.compute(&falling);
        assert!(second.abs() < 1e-12, "Negative diffs are rectified, got {}", second);
    }

    #[test]
    fn test_spec_flux_normalization() {
        let mut desc = SpectralDescriptor::new(OnsetMethod::SpecFlux, 4);
        let spec = spectrum_from_mags(&[1.0, 1.0, 2.0]);
        // positive diff = 4, norm = 4
        assert!((desc.compute(&spec) - 1.0).abs() < 1e-12);
        // Identical frame: no positive flux
        let again = spectrum_from_mags(&[1.0, 1.0, 2.0]);
        assert!(desc.compute(&again).abs() < 1e-12);
    }

    #[test]
    fn test_kl_and_mkl_react_to_growth() {
        for method in [OnsetMethod::Kl, OnsetMethod::Mkl] {
            let mut desc = SpectralDescriptor::new(method, 512);
            let quiet = spectrum_from_mags(&vec![0.01; 257]);
            desc.compute(&quiet);
            desc.compute(&quiet);
            let steady = desc.compute(&quiet);

            let mut desc2 = SpectralDescriptor::new(method, 512);
            desc2.compute(&quiet);
            desc2.compute(&quiet);
            let loud = spectrum_from_mags(&vec![1.0; 257]);
            let jump = desc2.compute(&loud);

            assert!(
                jump > steady,
                "{:?} should react to a magnitude jump: steady={}, jump={}",
                method,
                steady,
                jump
            );
        }
    }

    #[test]
    fn test_phase_deviation_detects_break() {
        let mut desc = SpectralDescriptor::new(OnsetMethod::Phase, 8);
        let mut spec = Spectrum::new(8);

        // Linear phase advance per frame: deviation stays zero
        for step in 0..3 {
            for (k, p) in spec.phase.iter_mut().enumerate() {
                *p = princarg(0.3 * k as f64 * step as f64);
            }
            desc.compute(&spec);
        }
        for (k, p) in spec.phase.iter_mut().enumerate() {
            *p = princarg(0.3 * k as f64 * 3.0);
        }
        let steady = desc.compute(&spec);

        // Random phase break
        for (k, p) in spec.phase.iter_mut().enumerate() {
            *p = princarg(1.7 * (k * k + 1) as f64);
        }
        let broken = desc.compute(&spec);
        assert!(
            broken > steady,
            "Phase break should raise the deviation: steady={}, broken={}",
            steady,
            broken
        );
    }

    #[test]
    fn test_wphase_scales_with_magnitude() {
        let mut quiet_desc = SpectralDescriptor::new(OnsetMethod::WPhase, 8);
        let mut loud_desc = SpectralDescriptor::new(OnsetMethod::WPhase, 8);

        let mut quiet = Spectrum::new(8);
        let mut loud = Spectrum::new(8);
        for k in 0..quiet.bins() {
            quiet.phase[k] = princarg(1.1 * k as f64);
            loud.phase[k] = princarg(1.1 * k as f64);
            quiet.mag[k] = 0.1;
            loud.mag[k] = 1.0;
        }
        let q = quiet_desc.compute(&quiet);
        let l = loud_desc.compute(&loud);
        assert!(l > q, "Weighted phase should scale with magnitude: {} vs {}", q, l);
    }

    #[test]
    fn test_complex_domain_steady_tone_is_quiet() {
        let mut desc = SpectralDescriptor::new(OnsetMethod::Complex, 8);
        let mut spec = Spectrum::new(8);
        spec.mag.fill(1.0);

        // Constant per-frame phase advance matches the prediction
        let mut values = Vec::new();
        for step in 0..6 {
            for (k, p) in spec.phase.iter_mut().enumerate() {
                *p = princarg(0.4 * k as f64 * step as f64);
            }
            values.push(desc.compute(&spec));
        }
        let steady = values[5];

        // Amplitude jump breaks the prediction
        spec.mag.fill(3.0);
        for (k, p) in spec.phase.iter_mut().enumerate() {
            *p = princarg(0.4 * k as f64 * 6.0);
        }
        let jump = desc.compute(&spec);
        assert!(
            jump > steady + 1.0,
            "Amplitude jump should raise the complex deviation: steady={}, jump={}",
            steady,
            jump
        );
    }

    #[test]
    fn test_nan_spectrum_reduces_to_zero() {
        for method in OnsetMethod::ALL {
            let mut desc = SpectralDescriptor::new(method, 8);
            let mut spec = Spectrum::new(8);
            spec.mag.fill(f64::NAN);
            spec.phase.fill(f64::NAN);
            let v = desc.compute(&spec);
            assert_eq!(v, 0.0, "{:?} must reduce NaN spectra to 0", method);
        }
    }

    #[test]
    fn test_reset_clears_history() {
        let mut desc = SpectralDescriptor::new(OnsetMethod::SpecDiff, 4);
        let spec = spectrum_from_mags(&[1.0, 2.0, 3.0]);
        let first = desc.compute(&spec);
        desc.reset();
        let after_reset = desc.compute(&spec);
        assert_eq!(
            first, after_reset,
            "Reset descriptor must repeat its first-frame output"
        );
    }
}
