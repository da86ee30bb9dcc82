//! # Error Module
//!
//! Every fallible operation in the core returns [`Result`]. Configuration and
//! input-shape problems are raised before any window is analysed; per-window
//! silence is never an error.

use std::fmt;

/// Pipeline stage in which an analysis-time failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Spectrum,
    Quantize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Spectrum => "spectrum",
            Stage::Quantize => "quantization",
        };
        f.write_str(name)
    }
}

/// Crate-level error type for the transcription core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value is out of range.
    #[error("invalid configuration `{name}`: got {value}, {reason}")]
    InvalidConfig {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    /// No scale/key tables exist for this number of steps per octave.
    #[error("unsupported temperament: no scale or key tables for {0} steps per octave")]
    UnsupportedTemperament(u32),

    /// The sample buffer holds no samples.
    #[error("sample buffer is empty")]
    EmptyInput,

    /// Interleaved sample count does not divide into whole frames.
    #[error("{samples} interleaved samples cannot be split into {channels} channel(s)")]
    ChannelMismatch { samples: usize, channels: u16 },

    /// Sample rate, tempo and subdivisions produce a zero-length window.
    #[error("slice size is zero ({sample_rate} Hz, {tempo_bpm} BPM, {subdivisions} subdivisions)")]
    DegenerateSlice {
        sample_rate: u32,
        tempo_bpm: f32,
        subdivisions: u32,
    },

    /// The buffer is shorter than a single window.
    #[error("{samples} samples is shorter than one slice of {slice_size} samples")]
    TooShort { samples: usize, slice_size: usize },

    /// Analysis failed for one window.
    #[error("window {window}: {stage} failed: {reason}")]
    Analysis {
        window: usize,
        stage: Stage,
        reason: String,
    },
}

/// Convenience Result type for transcription operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_error_names_window_and_stage() {
        let err = Error::Analysis {
            window: 7,
            stage: Stage::Quantize,
            reason: "non-finite frequency".into(),
        };
        assert_eq!(err.to_string(), "window 7: quantization failed: non-finite frequency");
    }
}
