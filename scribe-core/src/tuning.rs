//! # Musical Tuning Module
//!
//! Equal-temperament quantization between frequencies and note indices.
//!
//! A note index counts temperament steps from a fixed origin so that the
//! tuning reference (A4 at concert pitch) is index [`REFERENCE_NOTE`].
//! Indices are unbounded and may be negative for very low frequencies.
//!
//! ```text
//! n = round(T * (log2(f) - log2(tuning)) + 49)
//! f = tuning * 2^((n - 49) / T)
//! ```

use crate::pitch::Peak;
use std::collections::BTreeSet;

/// Note index of the tuning reference frequency.
pub const REFERENCE_NOTE: i32 = 49;

/// Distinct note indices sounding in one window, ascending. Empty is silence.
pub type NoteSet = BTreeSet<i32>;

/// Nearest note index to `freq`.
///
/// Exact halves round to the even index.
///
/// # Returns
/// * `None` - `freq` is not a positive, finite frequency
pub fn quantize_frequency(freq: f32, temperament: u32, tuning_hz: f32) -> Option<i32> {
    if !(freq.is_finite() && freq > 0.0) {
        return None;
    }
    let steps = f64::from(temperament) * (f64::from(freq).log2() - f64::from(tuning_hz).log2());
    let note = (steps + f64::from(REFERENCE_NOTE)).round_ties_even();
    if note.is_finite() && note.abs() < f64::from(i32::MAX) {
        Some(note as i32)
    } else {
        None
    }
}

/// Quantizes every peak of a window into a note set.
///
/// # Returns
/// * `Err(freq)` - the first frequency that could not be quantized
pub fn quantize_peaks(peaks: &[Peak], temperament: u32, tuning_hz: f32) -> Result<NoteSet, f32> {
    peaks
        .iter()
        .map(|peak| {
            quantize_frequency(peak.frequency, temperament, tuning_hz).ok_or(peak.frequency)
        })
        .collect()
}

/// Exact frequency of a note index in Hz.
///
/// Inverse of [`quantize_frequency`] for on-pitch notes.
///
/// # Arguments
/// * `note` - Note index (49 = reference note)
/// * `temperament` - Steps per octave
/// * `tuning_hz` - Frequency of the reference note
pub fn note_frequency(note: i32, temperament: u32, tuning_hz: f32) -> f32 {
    let power = f64::from(note - REFERENCE_NOTE) / f64::from(temperament);
    (f64::from(tuning_hz) * 2_f64.powf(power)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_frequency_is_the_reference_note() {
        assert_eq!(quantize_frequency(440.0, 12, 440.0), Some(REFERENCE_NOTE));
        assert_eq!(quantize_frequency(432.0, 12, 432.0), Some(REFERENCE_NOTE));
        assert_eq!(quantize_frequency(880.0, 12, 440.0), Some(61));
        assert_eq!(quantize_frequency(220.0, 12, 440.0), Some(37));
    }

    #[test]
    fn snaps_to_nearest_step() {
        // Middle C is 261.63 Hz, index 40.
        assert_eq!(quantize_frequency(261.63, 12, 440.0), Some(40));
        assert_eq!(quantize_frequency(268.0, 12, 440.0), Some(40));
        assert_eq!(quantize_frequency(272.0, 12, 440.0), Some(41));
    }

    #[test]
    fn very_low_frequencies_go_negative() {
        assert!(quantize_frequency(1.0, 12, 440.0).unwrap() < 0);
    }

    #[test]
    fn invalid_frequencies_are_rejected() {
        assert_eq!(quantize_frequency(0.0, 12, 440.0), None);
        assert_eq!(quantize_frequency(f32::NAN, 12, 440.0), None);
        assert_eq!(quantize_frequency(-3.0, 12, 440.0), None);
    }

    #[test]
    fn peaks_collapse_into_a_sorted_set() {
        let peaks = [
            Peak { frequency: 660.0, magnitude: 1.0 },
            Peak { frequency: 440.0, magnitude: 2.0 },
            Peak { frequency: 441.5, magnitude: 1.5 },
        ];
        let notes = quantize_peaks(&peaks, 12, 440.0).unwrap();
        assert_eq!(notes.into_iter().collect::<Vec<_>>(), vec![49, 56]);
    }

    #[test]
    fn quantization_inverts_note_frequency() {
        for note in -20..100 {
            let freq = note_frequency(note, 12, 440.0);
            assert_eq!(quantize_frequency(freq, 12, 440.0), Some(note));
        }
    }
}
