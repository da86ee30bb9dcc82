//! # Temperament Tables
//!
//! Static lookup data for each supported temperament: pitch-class names,
//! which keys contain a pitch class, and whether a key spells its
//! accidentals with sharps or flats.
//!
//! Pitch classes are numbered so that the reference note (index 49, A4 at
//! concert pitch) lands on class 1. Class 0 is therefore G#/Ab, class 4 is C
//! and class 11 is G.
//!
//! Only 12-tone equal temperament has tables. Microtonal temperaments are
//! reported as [`Error::UnsupportedTemperament`].

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::BTreeSet;

/// Name of one pitch class in the scale-name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDegree {
    /// A white-key degree with a single spelling, e.g. `c`.
    Natural(char),
    /// A degree with two spellings: `lower` sharpened or `upper` flattened.
    Accidental { lower: char, upper: char },
}

/// Lookup data for one temperament.
#[derive(Debug)]
pub struct TemperamentTable {
    steps: u32,
    scale: Vec<ScaleDegree>,
    keys_with_note: Vec<BTreeSet<u32>>,
    sharp_keys: Vec<bool>,
    default_key: u32,
}

impl TemperamentTable {
    /// Steps per octave.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Scale degree for a pitch class.
    ///
    /// # Arguments
    /// * `pitch_class` - Pitch class below `steps()`
    pub fn degree(&self, pitch_class: u32) -> ScaleDegree {
        self.scale[pitch_class as usize]
    }

    /// All major keys whose diatonic scale contains `pitch_class`.
    ///
    /// # Arguments
    /// * `pitch_class` - Pitch class below `steps()`
    ///
    /// # Returns
    /// * Tonic pitch classes, ascending
    pub fn keys_with(&self, pitch_class: u32) -> &BTreeSet<u32> {
        &self.keys_with_note[pitch_class as usize]
    }

    /// Accidental bias of a major key.
    ///
    /// # Arguments
    /// * `key` - Tonic pitch class
    ///
    /// # Returns
    /// * `true` - the key spells black-key pitch classes with sharps
    /// * `false` - it spells them with flats
    pub fn prefers_sharps(&self, key: u32) -> bool {
        self.sharp_keys[key as usize]
    }

    /// Key used when there is no pitched content to infer from.
    pub fn default_key(&self) -> u32 {
        self.default_key
    }
}

/// Semitone offsets of the major scale above its tonic.
const MAJOR_SCALE: [u32; 7] = [0, 2, 4, 5, 7, 9, 11];

static TWELVE_TONE: Lazy<TemperamentTable> = Lazy::new(|| {
    use ScaleDegree::{Accidental, Natural};

    const STEPS: u32 = 12;
    let scale = vec![
        Accidental { lower: 'g', upper: 'a' },
        Natural('a'),
        Accidental { lower: 'a', upper: 'b' },
        Natural('b'),
        Natural('c'),
        Accidental { lower: 'c', upper: 'd' },
        Natural('d'),
        Accidental { lower: 'd', upper: 'e' },
        Natural('e'),
        Natural('f'),
        Accidental { lower: 'f', upper: 'g' },
        Natural('g'),
    ];

    // A key contains pitch class p when p sits one of the scale intervals above its tonic.
    let keys_with_note = (0..STEPS)
        .map(|pitch_class| {
            MAJOR_SCALE
                .iter()
                .map(|interval| (pitch_class + STEPS - interval) % STEPS)
                .collect::<BTreeSet<u32>>()
        })
        .collect();

    let sharp_keys = vec![
        false, // Ab
        true,  // A
        false, // Bb
        true,  // B
        true,  // C
        false, // Db
        true,  // D
        false, // Eb
        true,  // E
        false, // F
        true,  // F#
        true,  // G
    ];

    TemperamentTable {
        steps: STEPS,
        scale,
        keys_with_note,
        sharp_keys,
        default_key: 4,
    }
});

/// Returns the tables for `steps` per octave.
pub fn table_for(steps: u32) -> Result<&'static TemperamentTable> {
    match steps {
        12 => Ok(&*TWELVE_TONE),
        other => Err(Error::UnsupportedTemperament(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_tone_membership_matches_major_scales() {
        let table = table_for(12).unwrap();
        // C is in C, Db, Eb, F, G, Ab and Bb major.
        let keys: Vec<u32> = table.keys_with(4).iter().copied().collect();
        assert_eq!(keys, vec![0, 2, 4, 5, 7, 9, 11]);
        // A is in A, Bb, C, D, E, F and G major.
        let keys: Vec<u32> = table.keys_with(1).iter().copied().collect();
        assert_eq!(keys, vec![1, 2, 4, 6, 8, 9, 11]);
        for pitch_class in 0..12 {
            assert_eq!(table.keys_with(pitch_class).len(), 7);
        }
    }

    #[test]
    fn names_and_bias() {
        let table = table_for(12).unwrap();
        assert_eq!(table.degree(4), ScaleDegree::Natural('c'));
        assert_eq!(table.degree(10), ScaleDegree::Accidental { lower: 'f', upper: 'g' });
        assert!(table.prefers_sharps(6)); // D major
        assert!(!table.prefers_sharps(9)); // F major
        assert_eq!(table.degree(table.default_key()), ScaleDegree::Natural('c'));
    }

    #[test]
    fn microtonal_tables_are_unsupported() {
        assert!(matches!(table_for(24), Err(Error::UnsupportedTemperament(24))));
    }
}
