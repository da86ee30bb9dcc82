//! # Audio Input Module
//!
//! Holds decoded audio handed over by the caller. Multichannel input is
//! folded to mono by summing channels, then normalised so that the buffer's
//! amplitude range spans the signed 16-bit range.
//!
//! Decoding files is the caller's job; this module only accepts buffers.

use crate::error::{Error, Result};

/// A mono sample stream at a fixed sample rate.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<i64>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wraps mono samples.
    ///
    /// # Errors
    /// * `EmptyInput` - no samples
    /// * `InvalidConfig` - zero sample rate
    pub fn mono(samples: &[i32], sample_rate: u32) -> Result<Self> {
        Self::from_interleaved(samples, 1, sample_rate)
    }

    /// Downmixes interleaved frames by summing their channels.
    ///
    /// # Arguments
    /// * `samples` - Interleaved samples, `channels` per frame
    /// * `channels` - Channel count (1 = mono)
    /// * `sample_rate` - Sample rate in Hz
    pub fn from_interleaved(samples: &[i32], channels: u16, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidConfig {
                name: "sample_rate",
                value: sample_rate.to_string(),
                reason: "must be at least 1 Hz",
            });
        }
        if samples.is_empty() {
            return Err(Error::EmptyInput);
        }
        if channels == 0 || samples.len() % usize::from(channels) != 0 {
            return Err(Error::ChannelMismatch {
                samples: samples.len(),
                channels,
            });
        }

        // Summing in i64 keeps wide stereo from overflowing before normalisation.
        let samples = samples
            .chunks_exact(usize::from(channels))
            .map(|frame| frame.iter().map(|&s| i64::from(s)).sum())
            .collect();

        Ok(Self { samples, sample_rate })
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of mono samples (frames, after downmixing).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maps `[min, max]` linearly onto `[i16::MIN, i16::MAX]`.
    ///
    /// Raw zero lands mid-range only when the buffer's extremes are
    /// symmetric; any offset this leaves is removed per window before the
    /// FFT.
    ///
    /// # Returns
    /// * One `f32` per sample; all zeros for a constant buffer
    pub fn normalized(&self) -> Vec<f32> {
        let (Some(&min), Some(&max)) = (self.samples.iter().min(), self.samples.iter().max()) else {
            return Vec::new();
        };
        if min == max {
            return vec![0.0; self.samples.len()];
        }

        let lo = f64::from(i16::MIN);
        let hi = f64::from(i16::MAX);
        let span = (max - min) as f64;
        self.samples
            .iter()
            .map(|&s| (lo + (s - min) as f64 * (hi - lo) / span) as f32)
            .collect()
    }
}
