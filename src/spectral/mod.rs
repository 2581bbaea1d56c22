//! Short-time spectral analysis front-end
//!
//! This module contains the building blocks that turn raw samples into
//! polar-form spectra at frame rate:
//! - Real-vector statistics and the polar spectrum container
//! - Hanning-windowed forward FFT
//! - Phase-vocoder style overlap framer
//! - Adaptive spectral whitening

pub mod fft;
pub mod framer;
pub mod vector;
pub mod whitening;
