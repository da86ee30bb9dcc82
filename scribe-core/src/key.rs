//! # Key Inference
//!
//! Picks a major key from how often each pitch class is heard. The most
//! used pitch class seeds the candidate set with every key containing it;
//! each following pitch class narrows the set by intersection, unless the
//! intersection would be empty, in which case that pitch class is ignored.
//!
//! Ties are resolved deterministically:
//! - equal usage counts are visited in ascending pitch-class order
//! - several surviving candidates resolve to the lowest pitch class
//! - no pitched content at all yields the table's default key
//!
//! The result depends only on aggregate usage, never on window order.

use crate::tables::TemperamentTable;
use crate::tuning::NoteSet;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of key inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyEstimate {
    /// Tonic pitch class of the chosen major key.
    pub key: u32,
    /// Candidates left when narrowing stopped, ascending.
    pub candidates: Vec<u32>,
}

impl KeyEstimate {
    /// `true` when the tie-break had to choose among several keys.
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }
}

/// Pitch classes with their occurrence counts, most used first.
pub fn pitch_class_usage<'a>(
    note_sets: impl IntoIterator<Item = &'a NoteSet>,
    temperament: u32,
) -> Vec<(u32, usize)> {
    let steps = temperament as i32;
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for note in note_sets.into_iter().flatten() {
        *counts.entry(note.rem_euclid(steps) as u32).or_insert(0) += 1;
    }

    let mut usage: Vec<(u32, usize)> = counts.into_iter().collect();
    // Stable sort keeps ascending pitch class among equal counts.
    usage.sort_by(|a, b| b.1.cmp(&a.1));
    usage
}

/// Infers the key of a whole recording.
///
/// Pitch classes are visited from most to least used. Each one narrows the
/// candidate keys to those containing it, unless that would leave none.
///
/// # Arguments
/// * `note_sets` - Every window's notes, in any order
/// * `table` - Tables for the recording's temperament
///
/// # Returns
/// * The lowest surviving candidate, plus all survivors; the table's default
///   key when nothing was pitched
pub fn infer_key<'a>(
    note_sets: impl IntoIterator<Item = &'a NoteSet>,
    table: &TemperamentTable,
) -> KeyEstimate {
    let usage = pitch_class_usage(note_sets, table.steps());
    let mut usage = usage.into_iter();

    let Some((most_used, _)) = usage.next() else {
        log::info!("[KEY] No pitched content, using default key {}", table.default_key());
        return KeyEstimate {
            key: table.default_key(),
            candidates: vec![table.default_key()],
        };
    };

    let mut candidates: BTreeSet<u32> = table.keys_with(most_used).clone();
    for (pitch_class, count) in usage {
        if candidates.len() <= 1 {
            break;
        }
        let remaining: BTreeSet<u32> = candidates
            .intersection(table.keys_with(pitch_class))
            .copied()
            .collect();
        if remaining.is_empty() {
            log::debug!("[KEY] Pitch class {pitch_class} ({count} uses) fits no key, skipped");
        } else {
            candidates = remaining;
        }
    }

    let candidates: Vec<u32> = candidates.into_iter().collect();
    let estimate = KeyEstimate {
        key: candidates[0],
        candidates,
    };
    if estimate.is_ambiguous() {
        log::warn!(
            "[KEY] Key is ambiguous between {:?}, choosing lowest pitch class {}",
            estimate.candidates,
            estimate.key
        );
    }
    estimate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::table_for;

    fn sets(windows: &[&[i32]]) -> Vec<NoteSet> {
        windows.iter().map(|w| w.iter().copied().collect()).collect()
    }

    #[test]
    fn c_major_scale_is_c_major() {
        let table = table_for(12).unwrap();
        // C D E F G A B around middle C, tonic weighted.
        let windows = sets(&[&[40], &[40], &[42], &[44], &[45], &[47], &[49], &[51], &[40]]);
        let estimate = infer_key(&windows, table);
        assert_eq!(estimate.key, 4);
        assert!(!estimate.is_ambiguous());
    }

    #[test]
    fn d_major_needs_the_sharps() {
        let table = table_for(12).unwrap();
        // D E F# G A B C#
        let windows = sets(&[&[42, 46], &[44], &[46], &[47], &[49], &[51], &[53], &[42]]);
        assert_eq!(infer_key(&windows, table).key, 6);
    }

    #[test]
    fn usage_is_counted_per_occurrence_and_sorted() {
        let windows = sets(&[&[49, 61], &[37], &[40]]);
        let usage = pitch_class_usage(&windows, 12);
        assert_eq!(usage, vec![(1, 3), (4, 1)]);
    }

    #[test]
    fn window_order_does_not_matter() {
        let table = table_for(12).unwrap();
        let mut windows = sets(&[&[40], &[44, 47], &[45], &[42], &[49], &[40, 44]]);
        let forward = infer_key(&windows, table);
        windows.reverse();
        assert_eq!(infer_key(&windows, table), forward);
    }

    #[test]
    fn pitch_class_outside_every_candidate_is_skipped() {
        let table = table_for(12).unwrap();
        // C then B leave C and G major. Eb fits neither and is ignored; F settles on C.
        let windows = sets(&[&[40], &[40], &[40], &[51], &[51], &[43], &[45]]);
        let estimate = infer_key(&windows, table);
        assert_eq!(estimate.candidates, vec![4]);
        assert_eq!(estimate.key, 4);
    }

    #[test]
    fn single_pitch_class_breaks_tie_on_lowest_key() {
        let table = table_for(12).unwrap();
        let windows = sets(&[&[49], &[49]]);
        let estimate = infer_key(&windows, table);
        assert!(estimate.is_ambiguous());
        assert_eq!(estimate.candidates, vec![1, 2, 4, 6, 8, 9, 11]);
        assert_eq!(estimate.key, 1);
    }

    #[test]
    fn silence_falls_back_to_default_key() {
        let table = table_for(12).unwrap();
        let windows = sets(&[&[], &[]]);
        assert_eq!(infer_key(&windows, table).key, table.default_key());
    }
}
