//! # Rhythm Encoding
//!
//! Turns a group's length in windows into notated durations on a
//! sixteenth-note grid. Lengths of a whole note or more become tied whole
//! notes followed by the remainder from a fixed table; remainders with no
//! single symbol (5/16, 7/16, 9/16, ...) are themselves tie chains.
//!
//! Whether a token is a rest is part of the token, so the renderer can
//! separate rest segments instead of tying them.

use serde::Serialize;

/// A single notated duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoteValue {
    Whole,
    DottedHalf,
    Half,
    DottedQuarter,
    Quarter,
    DottedEighth,
    Eighth,
    Sixteenth,
}

impl NoteValue {
    /// Length in sixteenth notes.
    pub const fn sixteenths(self) -> u32 {
        match self {
            NoteValue::Whole => 16,
            NoteValue::DottedHalf => 12,
            NoteValue::Half => 8,
            NoteValue::DottedQuarter => 6,
            NoteValue::Quarter => 4,
            NoteValue::DottedEighth => 3,
            NoteValue::Eighth => 2,
            NoteValue::Sixteenth => 1,
        }
    }

    /// LilyPond duration suffix.
    pub const fn symbol(self) -> &'static str {
        match self {
            NoteValue::Whole => "1",
            NoteValue::DottedHalf => "2.",
            NoteValue::Half => "2",
            NoteValue::DottedQuarter => "4.",
            NoteValue::Quarter => "4",
            NoteValue::DottedEighth => "8.",
            NoteValue::Eighth => "8",
            NoteValue::Sixteenth => "16",
        }
    }
}

use NoteValue::{
    DottedEighth, DottedHalf, DottedQuarter, Eighth, Half, Quarter, Sixteenth, Whole,
};

/// Segments for 1/16 through 16/16 of a whole note, indexed by `sixteenths - 1`.
const FRACTIONS: [&[NoteValue]; 16] = [
    &[Sixteenth],
    &[Eighth],
    &[DottedEighth],
    &[Quarter],
    &[Quarter, Sixteenth],
    &[DottedQuarter],
    &[DottedQuarter, Sixteenth],
    &[Half],
    &[Half, Sixteenth],
    &[Half, Eighth],
    &[Half, DottedEighth],
    &[DottedHalf],
    &[DottedHalf, Sixteenth],
    &[DottedHalf, Eighth],
    &[DottedHalf, DottedEighth],
    &[Whole],
];

/// Segments for a fraction of a whole note, `1..=16` sixteenths.
pub fn fraction_segments(sixteenths: u32) -> Option<&'static [NoteValue]> {
    match sixteenths {
        1..=16 => Some(FRACTIONS[sixteenths as usize - 1]),
        _ => None,
    }
}

/// A group's length placed on the sixteenth grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridDuration {
    /// Length in sixteenths before snapping.
    pub exact: f64,
    /// Length in sixteenths after snapping, at least one.
    pub sixteenths: u32,
}

const GRID_EPSILON: f64 = 1e-9;

impl GridDuration {
    /// `window_count / (subdivisions * 4)` whole notes, in sixteenths.
    ///
    /// Off-grid lengths round to the nearest sixteenth; check [`Self::is_exact`].
    pub fn from_windows(window_count: usize, subdivisions: u32) -> Self {
        let exact = window_count as f64 * 16.0 / (f64::from(subdivisions) * 4.0);
        let sixteenths = exact.round().max(1.0) as u32;
        Self { exact, sixteenths }
    }

    /// Checks whether the group lands on the sixteenth grid.
    ///
    /// # Returns
    /// * `true` - `exact` is within `1e-9` of `sixteenths`
    /// * `false` - the duration was rounded and should be reported
    pub fn is_exact(&self) -> bool {
        (self.exact - f64::from(self.sixteenths)).abs() < GRID_EPSILON
    }
}

/// The notated duration of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RhythmToken {
    /// Durations in order; consecutive segments are tied for notes.
    pub segments: Vec<NoteValue>,
    pub is_rest: bool,
}

impl RhythmToken {
    /// Encodes `sixteenths` (at least one) as whole notes plus a table remainder.
    ///
    /// # Arguments
    /// * `sixteenths` - Snapped group length
    /// * `is_rest` - Whether the group is silence
    pub fn new(sixteenths: u32, is_rest: bool) -> Self {
        let wholes = sixteenths / 16;
        let mut segments = vec![Whole; wholes as usize];
        if let Some(remainder) = fraction_segments(sixteenths % 16) {
            segments.extend_from_slice(remainder);
        }
        Self { segments, is_rest }
    }

    /// Total length in sixteenths.
    pub fn sixteenths(&self) -> u32 {
        self.segments.iter().map(|value| value.sixteenths()).sum()
    }

    /// LilyPond duration symbols of the segments, in order.
    ///
    /// Ten sixteenths yield `["2", "8"]`; twenty yield `["1", "4"]`.
    /// Joining them (with ties for notes) is the renderer's job.
    ///
    /// # Returns
    /// * One symbol per segment, whole notes first
    pub fn symbols(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.segments.iter().map(|value| value.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_fraction_sums_back() {
        for sixteenths in 1..=16 {
            let segments = fraction_segments(sixteenths).unwrap();
            let total: u32 = segments.iter().map(|v| v.sixteenths()).sum();
            assert_eq!(total, sixteenths);
            assert_eq!(RhythmToken::new(sixteenths, false).sixteenths(), sixteenths);
        }
        assert!(fraction_segments(0).is_none());
        assert!(fraction_segments(17).is_none());
    }

    #[test]
    fn long_durations_tie_whole_notes() {
        let token = RhythmToken::new(16 * 2 + 4, false);
        assert_eq!(token.segments, vec![Whole, Whole, Quarter]);
        assert_eq!(token.sixteenths(), 36);

        // An exact number of whole notes leaves no trailing segment.
        let token = RhythmToken::new(32, true);
        assert_eq!(token.segments, vec![Whole, Whole]);
    }

    #[test]
    fn compound_remainders() {
        let token = RhythmToken::new(10, false);
        assert_eq!(token.symbols().collect::<Vec<_>>(), vec!["2", "8"]);
        let token = RhythmToken::new(15, false);
        assert_eq!(token.symbols().collect::<Vec<_>>(), vec!["2.", "8."]);
    }

    #[test]
    fn sixteenth_grid_windows_are_exact() {
        let grid = GridDuration::from_windows(4, 4);
        assert!(grid.is_exact());
        assert_eq!(grid.sixteenths, 4);
        assert_eq!(RhythmToken::new(grid.sixteenths, false).segments, vec![Quarter]);

        let grid = GridDuration::from_windows(3, 2);
        assert!(grid.is_exact());
        assert_eq!(grid.sixteenths, 6);
    }

    #[test]
    fn triplet_grid_is_snapped() {
        // One window of an eighth-note-triplet grid is 4/3 of a sixteenth.
        let grid = GridDuration::from_windows(1, 3);
        assert!(!grid.is_exact());
        assert_eq!(grid.sixteenths, 1);

        let grid = GridDuration::from_windows(2, 3);
        assert_eq!(grid.sixteenths, 3);
    }

    #[test]
    fn tiny_durations_snap_up_to_one_sixteenth() {
        let grid = GridDuration::from_windows(1, 16);
        assert_eq!(grid.sixteenths, 1);
        assert!(!grid.is_exact());
    }
}
