//! # Fast Fourier Transform (FFT) Module
//!
//! Magnitude spectra for analysis windows. Windows are transformed without
//! a taper (rectangular) so every window of a recording shares one plan.
//!
//! ## Features
//! - FFT planning once per window length using RustFFT
//! - DC offset removal before the transform
//! - Real-input magnitude spectrum up to the Nyquist bin
//! - Bin-to-frequency pairing

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// A planned forward FFT for one window length.
///
/// Cloning is cheap; clones share the plan and can move to worker threads.
#[derive(Clone)]
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    len: usize,
    sample_rate: u32,
}

impl SpectrumAnalyzer {
    /// Plans a transform for windows of `len` samples.
    pub fn new(len: usize, sample_rate: u32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len);
        Self { fft, len, sample_rate }
    }

    /// Samples per window this plan accepts.
    pub fn window_len(&self) -> usize {
        self.len
    }

    /// Returns `(magnitude, frequency)` for bins `0..=len/2`.
    ///
    /// The window's mean is removed first. Only bin 0 depends on it, so
    /// every other bin is unchanged, while a constant window (a silent
    /// stretch of a normalised recording) transforms to exact zeros
    /// instead of rounding noise.
    ///
    /// # Arguments
    /// * `window` - Exactly `window_len()` normalised samples
    ///
    /// # Returns
    /// * `None` - the window has the wrong length
    pub fn magnitude_spectrum(&self, window: &[f32]) -> Option<Vec<(f32, f32)>> {
        if window.len() != self.len {
            return None;
        }

        let mut centred = window.to_vec();
        remove_dc_offset(&mut centred);

        let mut buffer: Vec<Complex<f32>> = centred
            .into_iter()
            .map(|sample| Complex { re: sample, im: 0.0 })
            .collect();

        self.fft.process(&mut buffer);

        Some(
            spectrum_to_magnitudes(&buffer)
                .into_iter()
                .enumerate()
                .map(|(bin, magnitude)| (magnitude, self.bin_frequency(bin)))
                .collect(),
        )
    }

    /// Centre frequency of `bin` in Hz.
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        (bin as f64 * f64::from(self.sample_rate) / self.len as f64) as f32
    }
}

/// Removes the DC offset (mean value) from a window.
///
/// The mean is accumulated in `f64`: for a window of identical samples it is
/// then exactly that sample, and the centred window is exactly zero.
fn remove_dc_offset(signal: &mut [f32]) {
    if signal.is_empty() {
        return;
    }
    let mean = signal.iter().map(|&s| f64::from(s)).sum::<f64>() / signal.len() as f64;
    for sample in signal.iter_mut() {
        *sample = (f64::from(*sample) - mean) as f32;
    }
}

/// Magnitudes of the non-negative frequency bins of a real signal's spectrum.
///
/// The upper half of a real input's spectrum mirrors the lower half, so only
/// bins up to and including Nyquist are kept.
pub fn spectrum_to_magnitudes(spectrum: &[Complex<f32>]) -> Vec<f32> {
    spectrum
        .iter()
        .take(spectrum.len() / 2 + 1)
        .map(|c| c.norm()) // .norm() is sqrt(re^2 + im^2)
        .collect()
}
