// scribe-core/src/lib.rs

//! The core logic for the audio-to-score transcriber.
//! This crate slices a decoded recording into beat subdivisions, finds the
//! dominant pitches of each slice, infers the key and writes the result as
//! a LilyPond score. It is completely headless and does no file I/O.

pub mod audio;
pub mod config;
pub mod error;
pub mod fft;
pub mod grouping;
pub mod key;
pub mod notation;
pub mod pipeline;
pub mod pitch;
pub mod rhythm;
pub mod slicer;
pub mod tables;
pub mod tuning;

pub use audio::SampleBuffer;
pub use config::{Clef, NotationConfig, TranscriptionConfig};
pub use error::{Error, Result, Stage};
pub use pipeline::{Transcriber, WindowAnalysis};

use notation::PitchSpelling;
use rhythm::RhythmToken;
use serde::Serialize;
use tuning::NoteSet;

/// Represents the complete result of transcribing one recording.
#[derive(Debug, Clone, Serialize)]
pub struct Transcription {
    /// Tonic pitch class of the inferred major key.
    pub key: u32,
    /// LilyPond name of the key, e.g. `bf`.
    pub key_name: String,
    /// Keys still possible when inference stopped; more than one means the
    /// tie-break chose `key`.
    pub key_candidates: Vec<u32>,
    /// Per-window analysis, in window order.
    pub windows: Vec<WindowAnalysis>,
    /// Sustained events, in order.
    pub groups: Vec<RenderedGroup>,
    /// Recoverable problems found while notating.
    pub warnings: Vec<Warning>,
    /// The complete LilyPond document.
    pub lilypond: String,
}

/// One note group as it appears in the score.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedGroup {
    pub notes: NoteSet,
    pub window_count: usize,
    pub pitches: Vec<PitchSpelling>,
    pub rhythm: RhythmToken,
    /// The LilyPond token, e.g. `<a' e''>2~ <a' e''>8`.
    pub text: String,
}

/// Non-fatal findings attached to a transcription.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Warning {
    /// A group's length fell between sixteenths and was rounded; the grid
    /// (tempo and subdivisions) does not divide a whole note evenly.
    InexactRhythm {
        group: usize,
        window_count: usize,
        exact_sixteenths: f64,
        snapped_sixteenths: u32,
    },
}

/// Transcribes a buffer in one call.
///
/// # Example
/// ```no_run
/// use scribe_core::{transcribe, NotationConfig, SampleBuffer, TranscriptionConfig};
///
/// let samples: Vec<i32> = vec![0; 44_100];
/// let buffer = SampleBuffer::mono(&samples, 44_100)?;
/// let result = transcribe(&buffer, TranscriptionConfig::default(), NotationConfig::default())?;
/// println!("{}", result.lilypond);
/// # Ok::<(), scribe_core::Error>(())
/// ```
pub fn transcribe(
    buffer: &SampleBuffer,
    config: TranscriptionConfig,
    notation: NotationConfig,
) -> Result<Transcription> {
    Transcriber::new(config, notation)?.transcribe(buffer)
}
