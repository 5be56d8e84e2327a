//! Interactive reconciliation of a proposed state onto a baseline.

use std::sync::Arc;

use tracing::{debug, info};

use pfl_diff::{compute, DiffPath, DiffSet};
use pfl_merge::{apply, GroupKey, SelectionModel, SelectionState};
use pfl_state::{ensure_valid, FinancialState, Snapshot};
use pfl_store::PersistentStore;
use pfl_types::{CanonicalDate, UserId};

use crate::error::SdkResult;

/// One in-flight selective merge.
///
/// Owns the baseline, the computed change set, and the user's approval
/// flags. `preview` shows the merged result without touching storage;
/// `commit` validates it and files it as the snapshot on the session
/// date; `cancel` (or a plain drop) discards everything.
pub struct ReconcileSession {
    store: Arc<dyn PersistentStore>,
    user: UserId,
    date: CanonicalDate,
    baseline: FinancialState,
    diffs: DiffSet,
    selection: SelectionModel,
}

impl ReconcileSession {
    pub(crate) fn new(
        store: Arc<dyn PersistentStore>,
        user: UserId,
        date: CanonicalDate,
        baseline: FinancialState,
        proposed: &FinancialState,
    ) -> Self {
        let diffs = compute(&baseline, proposed);
        let selection = SelectionModel::new(&diffs);
        debug!(user = %user, date = %date, records = diffs.len(), "reconcile session opened");
        Self {
            store,
            user,
            date,
            baseline,
            diffs,
            selection,
        }
    }

    /// Date the committed result will be filed under.
    pub fn date(&self) -> CanonicalDate {
        self.date
    }

    pub fn baseline(&self) -> &FinancialState {
        &self.baseline
    }

    /// The change set, for display grouping.
    pub fn diffs(&self) -> &DiffSet {
        &self.diffs
    }

    /// `true` when baseline and proposed already agree.
    pub fn is_clean(&self) -> bool {
        self.diffs.is_empty()
    }

    // ---- Selection ----

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn toggle_item(&mut self, path: &DiffPath) {
        self.selection.toggle_item(path);
    }

    pub fn set_item(&mut self, path: &DiffPath, selected: bool) {
        self.selection.set_item(path, selected);
    }

    pub fn toggle_field(&mut self, section: &str, field: &str, checked: Option<bool>) {
        self.selection.toggle_field(section, field, checked);
    }

    pub fn toggle_section(&mut self, section: &str, checked: Option<bool>) {
        self.selection.toggle_section(section, checked);
    }

    pub fn select_all(&mut self) {
        self.selection.select_all();
    }

    pub fn clear_all(&mut self) {
        self.selection.clear_all();
    }

    pub fn group_state(&self, group: GroupKey<'_>) -> SelectionState {
        self.selection.group_state(group)
    }

    // ---- Resolution ----

    /// The merged state under the current selection, without persisting.
    pub fn preview(&self) -> FinancialState {
        apply(&self.baseline, &self.diffs, &self.selection)
    }

    /// Apply the approved records, validate the result, and file it as
    /// the snapshot on the session date.
    pub fn commit(self) -> SdkResult<Snapshot> {
        let merged = apply(&self.baseline, &self.diffs, &self.selection);
        ensure_valid(&merged)?;
        let snapshot = Snapshot::new(self.date, merged);
        self.store.append_or_replace_snapshot(&self.user, &snapshot)?;
        info!(
            user = %self.user,
            date = %self.date,
            approved = self.selection.selected_count(),
            "reconciliation committed"
        );
        Ok(snapshot)
    }

    /// Discard the session without writing anything.
    pub fn cancel(self) {}
}
