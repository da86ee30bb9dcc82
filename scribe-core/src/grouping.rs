//! Run-length grouping of per-window note sets into sustained events.

use crate::tuning::NoteSet;
use serde::Serialize;

/// A maximal run of consecutive windows sharing one note set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteGroup {
    pub notes: NoteSet,
    pub window_count: usize,
}

impl NoteGroup {
    /// A group with no notes is silence.
    pub fn is_rest(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Collapses consecutive equal note sets. Equality is on the whole set,
/// so two different chords of the same size stay separate groups.
pub fn group_runs<'a>(note_sets: impl IntoIterator<Item = &'a NoteSet>) -> Vec<NoteGroup> {
    let mut groups: Vec<NoteGroup> = Vec::new();
    for notes in note_sets {
        match groups.last_mut() {
            Some(group) if group.notes == *notes => group.window_count += 1,
            _ => groups.push(NoteGroup {
                notes: notes.clone(),
                window_count: 1,
            }),
        }
    }
    groups
}
