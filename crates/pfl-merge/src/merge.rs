//! Application of an approved diff subset onto a baseline state.
//!
//! `apply` is a pure fold: the baseline is never mutated, unselected
//! records change nothing, and re-applying the same records is
//! idempotent. Unexpected shapes degrade to coarser writes instead of
//! failing.

use serde_json::{Map, Value};

use pfl_diff::{canonical_eq, DiffAction, DiffRecord, DiffSet};
use pfl_state::{find_by_id, find_by_id_mut, item_id, FinancialState};
use pfl_types::ItemId;

use crate::selection::SelectionModel;

/// Fold the selected records of `diffs` onto a copy of `baseline`.
///
/// Merging disjoint selections of the same diff set composes: applying
/// subset A then subset B reaches the same state as applying their
/// union in one pass.
pub fn apply(
    baseline: &FinancialState,
    diffs: &DiffSet,
    selection: &SelectionModel,
) -> FinancialState {
    let mut merged = baseline.clone();
    for record in diffs {
        if !selection.is_selected(&record.path) {
            continue;
        }
        apply_record(&mut merged, record);
    }
    merged
}

fn apply_record(state: &mut FinancialState, record: &DiffRecord) {
    if record.is_whole_section() {
        apply_whole_section(state, record);
        return;
    }
    match &record.item_id {
        None => apply_field(state, record),
        Some(id) => apply_item(state, record, id),
    }
}

fn apply_whole_section(state: &mut FinancialState, record: &DiffRecord) {
    match record.action {
        DiffAction::Remove => {
            state.remove_section(&record.section);
        }
        DiffAction::Add | DiffAction::Modify => {
            if let Some(proposed) = &record.proposed {
                state.set_section(record.section.clone(), proposed.clone());
            }
        }
    }
}

fn apply_field(state: &mut FinancialState, record: &DiffRecord) {
    match record.action {
        DiffAction::Remove => {
            state.remove_field(&record.section, &record.field);
        }
        DiffAction::Add | DiffAction::Modify => {
            let Some(proposed) = &record.proposed else {
                return;
            };
            if !state.set_field(&record.section, &record.field, proposed.clone()) {
                // The section slot holds a non-object; the approved field
                // write wins and the section becomes an object around it.
                let mut obj = Map::new();
                obj.insert(record.field.clone(), proposed.clone());
                state.set_section(record.section.clone(), Value::Object(obj));
            }
        }
    }
}

fn apply_item(state: &mut FinancialState, record: &DiffRecord, id: &ItemId) {
    let Some(items) = state.collection_mut(&record.section, &record.field) else {
        // A non-array slot is a shape conflict; leave it untouched.
        return;
    };
    match record.action {
        DiffAction::Add => {
            let Some(proposed) = &record.proposed else {
                return;
            };
            // Idempotence is keyed on persisted ids. Synthetic ids are
            // never stored, so nothing in the array can match one and
            // those records always append.
            if id.is_synthetic() || find_by_id(items, id.as_str()).is_none() {
                items.push(proposed.clone());
            }
        }
        DiffAction::Remove => {
            if id.is_synthetic() {
                // Id-less items are matched by content.
                let Some(baseline) = &record.baseline else {
                    return;
                };
                if let Some(pos) = items.iter().position(|item| canonical_eq(item, baseline)) {
                    items.remove(pos);
                }
            } else {
                items.retain(|item| item_id(item) != Some(id.as_str()));
            }
        }
        DiffAction::Modify => {
            let Some(proposed) = &record.proposed else {
                return;
            };
            match find_by_id_mut(items, id.as_str()) {
                Some(existing) => shallow_merge(existing, proposed),
                // The target vanished from this baseline; the approved
                // value still lands.
                None => items.push(proposed.clone()),
            }
        }
    }
}

/// Overlay the proposed item's keys onto the existing one so fields the
/// diff never saw survive the merge.
fn shallow_merge(existing: &mut Value, proposed: &Value) {
    match (existing.is_object(), proposed.as_object()) {
        (true, Some(po)) => {
            if let Some(eo) = existing.as_object_mut() {
                for (k, v) in po {
                    eo.insert(k.clone(), v.clone());
                }
            }
        }
        _ => *existing = proposed.clone(),
    }
}
