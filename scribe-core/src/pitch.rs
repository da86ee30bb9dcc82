//! # Spectral Peak Isolation
//!
//! Picks the few dominant frequencies of a window with a cascade of
//! percentile thresholds:
//!
//! 1. keep bins at or above the 99th percentile of the whole spectrum,
//!    never the DC bin (F1)
//! 2. keep F1 bins at or above the 99th percentile of F1 (F2)
//! 3. keep F1 bins at or above the 98th percentile of F2
//!
//! This favours a handful of strong, isolated peaks over broad harmonic
//! content. It is not a fundamental-frequency estimator: noisy or inharmonic
//! input can yield spurious or missing notes.

use serde::Serialize;

/// One isolated spectral peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    /// Bin centre frequency in Hz.
    pub frequency: f32,
    /// Linear FFT magnitude.
    pub magnitude: f32,
}

const FIRST_PERCENTILE: f32 = 99.0;
const SECOND_PERCENTILE: f32 = 99.0;
const FINAL_PERCENTILE: f32 = 98.0;

/// Magnitudes at or below this are rounding noise, not signal.
pub const SILENCE_FLOOR: f32 = 1.0;

/// The `q`th percentile of `values`, interpolating linearly between ranks.
///
/// Returns `None` for an empty slice.
pub fn percentile(values: &[f32], q: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);

    let rank = f64::from(q.clamp(0.0, 100.0)) / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = (rank - lower as f64) as f32;
    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// Isolates the dominant peaks of a `(magnitude, frequency)` spectrum.
///
/// An empty result means the window is treated as silence. Bins at or below
/// [`SILENCE_FLOOR`] never count as peaks, so digital silence stays silent
/// even though every bin then sits at the first threshold.
pub fn isolate_peaks(spectrum: &[(f32, f32)]) -> Vec<Peak> {
    let magnitudes: Vec<f32> = spectrum.iter().map(|&(magnitude, _)| magnitude).collect();
    let Some(threshold) = percentile(&magnitudes, FIRST_PERCENTILE) else {
        return Vec::new();
    };

    let first: Vec<Peak> = spectrum
        .iter()
        .filter(|&&(magnitude, frequency)| {
            frequency != 0.0 && magnitude > SILENCE_FLOOR && magnitude >= threshold
        })
        .map(|&(magnitude, frequency)| Peak { frequency, magnitude })
        .collect();

    let Some(threshold) = percentile(&magnitudes_of(&first), SECOND_PERCENTILE) else {
        return Vec::new();
    };
    let second: Vec<Peak> = first
        .iter()
        .copied()
        .filter(|peak| peak.magnitude >= threshold)
        .collect();

    // The last threshold comes from F2 but is applied to F1.
    let Some(threshold) = percentile(&magnitudes_of(&second), FINAL_PERCENTILE) else {
        return Vec::new();
    };
    let outliers: Vec<Peak> = first
        .iter()
        .copied()
        .filter(|peak| peak.magnitude >= threshold)
        .collect();

    log::trace!(
        "[PEAKS] cascade kept {} -> {} -> {} bins",
        first.len(),
        second.len(),
        outliers.len()
    );
    outliers
}

fn magnitudes_of(peaks: &[Peak]) -> Vec<f32> {
    peaks.iter().map(|peak| peak.magnitude).collect()
}
