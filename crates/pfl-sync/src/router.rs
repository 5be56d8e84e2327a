//! Edit propagation from generated entries back to their schedules.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use pfl_state::{field, find_by_id_mut, section, FinancialState, GeneratedCashflowEntry};
use pfl_types::{AssetKind, CanonicalDate, CashflowKind, Frequency, ItemId};

/// An edit to a generated entry, addressed by the entry's routing
/// metadata. Patch fields set to `None` leave the stored value alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryEdit {
    /// Id of the generated entry being edited.
    pub entry_id: ItemId,
    /// Owning asset, as recorded on the entry.
    pub asset_id: ItemId,
    /// Raw collection tag; resolved through the alias table, with a
    /// full scan as the fallback for unrecognized spellings.
    pub asset_kind: String,
    /// The source schedule inside the asset.
    pub cashflow_id: ItemId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    /// Entry-level classification; a change does not move the entry
    /// between collections, and the schedule keeps its own kind.
    #[serde(default)]
    pub kind: Option<CashflowKind>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub start_date: Option<CanonicalDate>,
    #[serde(default)]
    pub auto_generate: Option<bool>,
}

impl EntryEdit {
    /// Start an edit addressed at `entry`, with no patches yet.
    pub fn addressing(entry: &GeneratedCashflowEntry) -> Self {
        Self {
            entry_id: entry.id.clone(),
            asset_id: entry.source_asset_id.clone(),
            asset_kind: entry.source_asset_kind.canonical_tag().to_string(),
            cashflow_id: entry.source_cashflow_id.clone(),
            label: None,
            amount: None,
            kind: None,
            frequency: None,
            start_date: None,
            auto_generate: None,
        }
    }
}

/// What a propagation reached.
#[derive(Clone, Debug, PartialEq)]
pub struct PropagateOutcome {
    pub state: FinancialState,
    /// The source schedule was found and patched.
    pub schedule_patched: bool,
    /// The generated entry was found and patched in at least one
    /// collection.
    pub entry_patched: bool,
    /// Set when no schedule target exists; the entry was still updated
    /// standalone.
    pub orphan: Option<OrphanWarning>,
}

/// A generated entry whose source schedule cannot be found. Non-fatal:
/// the entry remains editable on its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanWarning {
    pub entry_id: ItemId,
    pub asset_id: ItemId,
    pub asset_kind: String,
    pub cashflow_id: ItemId,
}

impl fmt::Display for OrphanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entry {} references missing schedule {} on asset {} ({})",
            self.entry_id, self.cashflow_id, self.asset_id, self.asset_kind
        )
    }
}

/// Deliver `edit` to the source schedule and to the generated entry.
///
/// The schedule is located through the asset-kind alias table; an
/// unrecognized tag degrades to scanning every known collection. The
/// entry is patched wherever its id appears in the income and expense
/// generated collections, since an earlier kind change may have left it
/// in either. A missing schedule never fails the call: the entry is
/// updated standalone and the outcome carries an [`OrphanWarning`].
pub fn propagate(state: &FinancialState, edit: &EntryEdit) -> PropagateOutcome {
    let mut next = state.clone();
    let schedule_patched = patch_schedule(&mut next, edit);
    let entry_patched = patch_generated_entry(&mut next, edit);

    let orphan = if schedule_patched {
        None
    } else {
        let warning = OrphanWarning {
            entry_id: edit.entry_id.clone(),
            asset_id: edit.asset_id.clone(),
            asset_kind: edit.asset_kind.clone(),
            cashflow_id: edit.cashflow_id.clone(),
        };
        warn!(%warning, "edit did not reach a schedule");
        Some(warning)
    };
    PropagateOutcome {
        state: next,
        schedule_patched,
        entry_patched,
        orphan,
    }
}

fn patch_schedule(state: &mut FinancialState, edit: &EntryEdit) -> bool {
    match AssetKind::resolve(&edit.asset_kind) {
        Ok(kind) => patch_schedule_in(state, &[kind], edit),
        Err(_) => {
            debug!(tag = %edit.asset_kind, "unrecognized asset kind; scanning all collections");
            patch_schedule_in(state, &AssetKind::ALL, edit)
        }
    }
}

fn patch_schedule_in(state: &mut FinancialState, kinds: &[AssetKind], edit: &EntryEdit) -> bool {
    for kind in kinds {
        let Some(assets) = state
            .section_mut(section::PATRIMONIO)
            .and_then(Value::as_object_mut)
            .and_then(|patrimonio| patrimonio.get_mut(kind.canonical_tag()))
            .and_then(Value::as_array_mut)
        else {
            continue;
        };
        let Some(flow) = find_by_id_mut(assets, edit.asset_id.as_str())
            .and_then(|asset| asset.get_mut(field::CASHFLOWS))
            .and_then(Value::as_array_mut)
            .and_then(|flows| find_by_id_mut(flows, edit.cashflow_id.as_str()))
            .and_then(Value::as_object_mut)
        else {
            continue;
        };
        apply_schedule_patch(flow, edit);
        return true;
    }
    false
}

// Patches write into the raw item so keys outside the schedule contract
// survive. The schedule's kind is deliberately not patchable here.
fn apply_schedule_patch(item: &mut Map<String, Value>, edit: &EntryEdit) {
    if let Some(label) = &edit.label {
        item.insert(field::LABEL.to_string(), Value::String(label.clone()));
    }
    if let Some(amount) = edit.amount {
        item.insert(field::AMOUNT.to_string(), Value::from(amount));
    }
    if let Some(frequency) = &edit.frequency {
        item.insert(
            field::FREQUENCY.to_string(),
            Value::String(frequency.label().to_string()),
        );
    }
    if let Some(start) = edit.start_date {
        item.insert(field::START_DATE.to_string(), Value::String(start.to_string()));
    }
    if let Some(auto) = edit.auto_generate {
        item.insert(field::AUTO_GENERATE.to_string(), Value::Bool(auto));
    }
}

fn patch_generated_entry(state: &mut FinancialState, edit: &EntryEdit) -> bool {
    let mut patched = false;
    for name in [section::ENTRATE, section::USCITE] {
        let Some(entry) = state
            .section_mut(name)
            .and_then(Value::as_object_mut)
            .and_then(|sect| sect.get_mut(field::GENERATED))
            .and_then(Value::as_array_mut)
            .and_then(|items| find_by_id_mut(items, edit.entry_id.as_str()))
            .and_then(Value::as_object_mut)
        else {
            continue;
        };
        apply_entry_patch(entry, edit);
        patched = true;
    }
    patched
}

fn apply_entry_patch(item: &mut Map<String, Value>, edit: &EntryEdit) {
    if let Some(label) = &edit.label {
        item.insert(field::LABEL.to_string(), Value::String(label.clone()));
    }
    if let Some(amount) = edit.amount {
        item.insert(field::AMOUNT.to_string(), Value::from(amount));
    }
    if let Some(kind) = edit.kind {
        item.insert(field::KIND.to_string(), Value::String(kind.as_str().to_string()));
    }
}
