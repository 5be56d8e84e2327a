//! Per-record approval state for one reconciliation session.
//!
//! Every diff record starts selected. The user can flip single records,
//! whole fields, or whole sections; group queries report the tri-state
//! rollup the review UI renders (checked, unchecked, indeterminate).
//! The model is scoped to one session and discarded on cancel.

use pfl_diff::{DiffPath, DiffSet};

/// Tri-state rollup of a group of records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionState {
    /// Every record in the group is selected.
    Full,
    /// Some but not all records are selected.
    Partial,
    /// No record is selected (or the group has no records).
    Empty,
}

/// A selectable group: one section, or one field within a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKey<'a> {
    Section(&'a str),
    Field(&'a str, &'a str),
}

#[derive(Clone, Debug)]
struct SelectionEntry {
    path: DiffPath,
    section: String,
    field: String,
    selected: bool,
}

impl SelectionEntry {
    fn in_group(&self, group: GroupKey<'_>) -> bool {
        match group {
            GroupKey::Section(section) => self.section == section,
            GroupKey::Field(section, field) => self.section == section && self.field == field,
        }
    }
}

/// Approval flags for every record of a diff set, keyed by path.
#[derive(Clone, Debug, Default)]
pub struct SelectionModel {
    entries: Vec<SelectionEntry>,
}

impl SelectionModel {
    /// All records start selected.
    pub fn new(diffs: &DiffSet) -> Self {
        let entries = diffs
            .iter()
            .map(|record| SelectionEntry {
                path: record.path.clone(),
                section: record.section.clone(),
                field: record.field.clone(),
                selected: true,
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the record at `path` is approved. Unknown paths are not.
    pub fn is_selected(&self, path: &DiffPath) -> bool {
        self.entries
            .iter()
            .any(|e| e.selected && &e.path == path)
    }

    /// Flip a single record. Unknown paths are ignored.
    pub fn toggle_item(&mut self, path: &DiffPath) {
        if let Some(entry) = self.entries.iter_mut().find(|e| &e.path == path) {
            entry.selected = !entry.selected;
        }
    }

    pub fn set_item(&mut self, path: &DiffPath, selected: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| &e.path == path) {
            entry.selected = selected;
        }
    }

    /// Set every record under `section.field`. With `checked` absent the
    /// group flips checkbox-style: a fully selected group unselects, any
    /// other state selects everything.
    pub fn toggle_field(&mut self, section: &str, field: &str, checked: Option<bool>) {
        self.toggle_group(GroupKey::Field(section, field), checked);
    }

    /// Set every record under `section`, cascading across its fields.
    pub fn toggle_section(&mut self, section: &str, checked: Option<bool>) {
        self.toggle_group(GroupKey::Section(section), checked);
    }

    fn toggle_group(&mut self, group: GroupKey<'_>, checked: Option<bool>) {
        let target =
            checked.unwrap_or_else(|| self.group_state(group) != SelectionState::Full);
        for entry in self.entries.iter_mut().filter(|e| e.in_group(group)) {
            entry.selected = target;
        }
    }

    /// The tri-state rollup for a group.
    pub fn group_state(&self, group: GroupKey<'_>) -> SelectionState {
        let mut total = 0usize;
        let mut selected = 0usize;
        for entry in self.entries.iter().filter(|e| e.in_group(group)) {
            total += 1;
            if entry.selected {
                selected += 1;
            }
        }
        if total == 0 || selected == 0 {
            SelectionState::Empty
        } else if selected == total {
            SelectionState::Full
        } else {
            SelectionState::Partial
        }
    }

    /// True iff the group has records and every one is selected.
    pub fn is_fully_selected(&self, group: GroupKey<'_>) -> bool {
        self.group_state(group) == SelectionState::Full
    }

    /// True iff some but not all of the group's records are selected.
    pub fn is_partially_selected(&self, group: GroupKey<'_>) -> bool {
        self.group_state(group) == SelectionState::Partial
    }

    pub fn select_all(&mut self) {
        for entry in &mut self.entries {
            entry.selected = true;
        }
    }

    pub fn clear_all(&mut self) {
        for entry in &mut self.entries {
            entry.selected = false;
        }
    }

    pub fn selected_count(&self) -> usize {
        self.entries.iter().filter(|e| e.selected).count()
    }

    pub fn selected_paths(&self) -> impl Iterator<Item = &DiffPath> {
        self.entries.iter().filter(|e| e.selected).map(|e| &e.path)
    }
}
