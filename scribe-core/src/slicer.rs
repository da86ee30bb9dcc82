//! Splits a normalised buffer into fixed-length, non-overlapping windows.
//!
//! One window lasts one subdivision of a beat:
//! `slice_size = floor(sample_rate / (60 / tempo) / subdivisions)`.
//! A tail shorter than one window is dropped.

use crate::error::{Error, Result};

/// Window length in samples for the given rate, tempo and grid.
///
/// # Arguments
/// * `sample_rate` - Sample rate in Hz
/// * `tempo_bpm` - Beats per minute
/// * `subdivisions` - Windows per beat
///
/// # Returns
/// * `floor(sample_rate / (60 / tempo_bpm) / subdivisions)`
///
/// # Errors
/// * `DegenerateSlice` - the result is below one sample
pub fn slice_size(sample_rate: u32, tempo_bpm: f32, subdivisions: u32) -> Result<usize> {
    let beat_seconds = 60.0 / f64::from(tempo_bpm);
    let size = (f64::from(sample_rate) / beat_seconds / f64::from(subdivisions)).floor();
    if !size.is_finite() || size < 1.0 {
        return Err(Error::DegenerateSlice {
            sample_rate,
            tempo_bpm,
            subdivisions,
        });
    }
    Ok(size as usize)
}

/// Borrows `samples` as consecutive windows of `slice_size` samples.
///
/// # Errors
/// * `TooShort` - not even one full window fits
pub fn slices(samples: &[f32], slice_size: usize) -> Result<std::slice::ChunksExact<'_, f32>> {
    if samples.len() < slice_size {
        return Err(Error::TooShort {
            samples: samples.len(),
            slice_size,
        });
    }
    Ok(samples.chunks_exact(slice_size))
}
