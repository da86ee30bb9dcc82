//! Configuration parameters for transcription

use crate::error::{Error, Result};
use crate::tables;
use serde::{Deserialize, Serialize};

/// Analysis configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Steps per octave (default: 12)
    pub temperament: u32,

    /// Frequency of the reference note, index 49 (default: 440.0 Hz)
    pub tuning_hz: f32,

    /// Fixed tempo in beats per minute (default: 155.0)
    pub tempo_bpm: f32,

    /// Windows per beat (default: 4, a sixteenth-note grid)
    pub subdivisions: u32,

    /// Threads used for per-window analysis (default: 1, 0 = all CPUs)
    pub workers: usize,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            temperament: 12,
            tuning_hz: 440.0,
            tempo_bpm: 155.0,
            subdivisions: 4,
            workers: 1,
        }
    }
}

impl TranscriptionConfig {
    /// Checks every field and returns the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.temperament == 0 {
            return Err(invalid("temperament", self.temperament, "must be at least 1"));
        }
        if !(self.tuning_hz.is_finite() && self.tuning_hz > 0.0) {
            return Err(invalid("tuning_hz", self.tuning_hz, "must be a positive frequency"));
        }
        if !(self.tempo_bpm.is_finite() && self.tempo_bpm > 0.0) {
            return Err(invalid("tempo_bpm", self.tempo_bpm, "must be a positive tempo"));
        }
        if self.subdivisions == 0 {
            return Err(invalid("subdivisions", self.subdivisions, "must be at least 1"));
        }
        tables::table_for(self.temperament)?;
        Ok(())
    }

    /// Number of worker threads to actually spawn.
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        }
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &'static str) -> Error {
    Error::InvalidConfig {
        name,
        value: value.to_string(),
        reason,
    }
}

/// Staff clef written into the rendered score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clef {
    #[default]
    Treble,
    Bass,
    Alto,
    Tenor,
}

impl Clef {
    pub fn as_lilypond(self) -> &'static str {
        match self {
            Clef::Treble => "treble",
            Clef::Bass => "bass",
            Clef::Alto => "alto",
            Clef::Tenor => "tenor",
        }
    }
}

/// Settings for the rendered LilyPond document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotationConfig {
    pub title: String,
    pub clef: Clef,
    pub lilypond_version: String,
}

impl Default for NotationConfig {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            clef: Clef::Treble,
            lilypond_version: "2.20.0".to_string(),
        }
    }
}
