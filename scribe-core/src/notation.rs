//! # Notation Rendering
//!
//! Spells note indices as LilyPond pitches (english note names, absolute
//! octaves) and assembles the final score.
//!
//! Octaves are `floor((note + 8) / T)`, which puts middle C (index 40) in
//! octave 4. LilyPond's unmarked octave is 3, so octave 4 gets one `'` and
//! octave 2 one `,`.

use crate::config::NotationConfig;
use crate::rhythm::RhythmToken;
use crate::tables::{ScaleDegree, TemperamentTable};
use serde::Serialize;

const OCTAVE_OFFSET: i32 = 8;

/// Octave written without marks.
pub const REFERENCE_OCTAVE: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Accidental {
    Natural,
    Sharp,
    Flat,
}

/// A note index resolved to a letter, accidental and octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PitchSpelling {
    pub letter: char,
    pub accidental: Accidental,
    pub octave: i32,
}

impl PitchSpelling {
    /// Pitch name without octave marks, e.g. `bf`.
    pub fn name(&self) -> String {
        let suffix = match self.accidental {
            Accidental::Natural => "",
            Accidental::Sharp => "s",
            Accidental::Flat => "f",
        };
        format!("{}{}", self.letter, suffix)
    }

    /// Absolute LilyPond pitch, e.g. `bf'` or `c,,`.
    pub fn to_lilypond(&self) -> String {
        let marks = if self.octave > REFERENCE_OCTAVE {
            "'".repeat((self.octave - REFERENCE_OCTAVE) as usize)
        } else {
            ",".repeat((REFERENCE_OCTAVE - self.octave) as usize)
        };
        format!("{}{}", self.name(), marks)
    }
}

/// Letter and accidental for a pitch class, biased by the key.
pub fn spell_pitch_class(
    pitch_class: u32,
    key: u32,
    table: &TemperamentTable,
) -> (char, Accidental) {
    match table.degree(pitch_class) {
        ScaleDegree::Natural(letter) => (letter, Accidental::Natural),
        ScaleDegree::Accidental { lower, upper } => {
            if table.prefers_sharps(key) {
                (lower, Accidental::Sharp)
            } else {
                (upper, Accidental::Flat)
            }
        }
    }
}

/// Spells a note index in `key`.
pub fn spell_note(note: i32, key: u32, table: &TemperamentTable) -> PitchSpelling {
    let steps = table.steps() as i32;
    let (letter, accidental) = spell_pitch_class(note.rem_euclid(steps) as u32, key, table);
    PitchSpelling {
        letter,
        accidental,
        octave: (note + OCTAVE_OFFSET).div_euclid(steps),
    }
}

/// LilyPond name of a key's tonic, spelled with the key's own bias.
pub fn key_name(key: u32, table: &TemperamentTable) -> String {
    let (letter, accidental) = spell_pitch_class(key, key, table);
    PitchSpelling { letter, accidental, octave: REFERENCE_OCTAVE }.name()
}

/// Renders one group: a rest, a note or a chord, with its rhythm.
///
/// Each tied segment repeats the pitch or chord; rests are never tied.
pub fn render_group(pitches: &[PitchSpelling], rhythm: &RhythmToken) -> String {
    let pitch = match pitches {
        _ if rhythm.is_rest || pitches.is_empty() => "r".to_string(),
        [single] => single.to_lilypond(),
        chord => {
            let names: Vec<String> = chord.iter().map(PitchSpelling::to_lilypond).collect();
            format!("<{}>", names.join(" "))
        }
    };

    let separator = if rhythm.is_rest || pitches.is_empty() { " " } else { "~ " };
    rhythm
        .symbols()
        .map(|symbol| format!("{pitch}{symbol}"))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Wraps rendered tokens in a complete LilyPond document.
///
/// # Arguments
/// * `tokens` - Rendered groups in order
/// * `key` - Inferred key (tonic pitch class)
/// * `table` - Tables used to name the key
/// * `notation` - Title, clef and version line
pub fn render_document(
    tokens: &[String],
    key: u32,
    table: &TemperamentTable,
    notation: &NotationConfig,
) -> String {
    format!(
        "\\version \"{version}\"\n\
         \\language \"english\"\n\
         \\header {{\n\
         \x20 title = \"{title}\"\n\
         }}\n\
         \\absolute {{\n\
         \x20 \\key {key} \\major\n\
         \x20 \\clef {clef}\n\
         \x20 {music}\n\
         }}\n",
        version = escape(&notation.lilypond_version),
        title = escape(&notation.title),
        key = key_name(key, table),
        clef = notation.clef.as_lilypond(),
        music = tokens.join(" "),
    )
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
