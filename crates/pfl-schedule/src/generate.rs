//! The due-occurrence state transition.
//!
//! `generate` walks every known asset collection, realizes each schedule
//! whose next occurrence has arrived, and returns the advanced state
//! together with the materialized entries. Failures are isolated per
//! schedule: a malformed record is reported and skipped, never advanced,
//! and never aborts the run.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

use pfl_state::{field, item_id, section, CashflowSchedule, FinancialState, GeneratedCashflowEntry};
use pfl_types::{AssetKind, CanonicalDate, CashflowKind, ItemId};

/// Outcome of one generation pass.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRun {
    /// The input state with schedules advanced and entries routed in.
    pub state: FinancialState,
    /// Entries realized by this pass, in collection-walk order.
    pub entries: Vec<GeneratedCashflowEntry>,
    /// Schedules that were due but could not be realized.
    pub skipped: Vec<SkippedSchedule>,
}

/// A schedule that was passed over this cycle. Skipped schedules are
/// left exactly as stored so a later fix makes them fire again.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedSchedule {
    pub asset_id: Option<ItemId>,
    pub schedule_id: Option<ItemId>,
    pub reason: SkipReason,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    /// The stored `nextOccurrence` value does not parse.
    MalformedDate(String),
    /// The schedule item does not deserialize as a schedule.
    MalformedSchedule(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedDate(detail) => write!(f, "malformed date: {detail}"),
            Self::MalformedSchedule(detail) => write!(f, "malformed schedule: {detail}"),
        }
    }
}

enum Outcome {
    Realized(GeneratedCashflowEntry),
    NotDue,
    Skipped(SkippedSchedule),
}

/// Realize every due occurrence in `state` as of `now`.
///
/// A schedule is due when `autoGenerate` is set, `nextOccurrence` is
/// non-null, and the occurrence is at or before `now`. Each due schedule
/// yields one entry dated at the occurrence itself, then advances by one
/// period (`once` goes dormant; an unrecognized frequency advances like
/// monthly). At most one occurrence is realized per schedule per call,
/// even when several periods have elapsed; the remainder surface on
/// later calls.
pub fn generate(state: &FinancialState, now: DateTime<Utc>) -> GenerationRun {
    let mut next = state.clone();
    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for kind in AssetKind::ALL {
        scan_collection(&mut next, kind, now, &mut entries, &mut skipped);
    }
    for entry in &entries {
        route_entry(&mut next, entry);
    }

    GenerationRun {
        state: next,
        entries,
        skipped,
    }
}

fn scan_collection(
    state: &mut FinancialState,
    kind: AssetKind,
    now: DateTime<Utc>,
    entries: &mut Vec<GeneratedCashflowEntry>,
    skipped: &mut Vec<SkippedSchedule>,
) {
    // Visit only existing arrays; generation must not create collections.
    let Some(assets) = state
        .section_mut(section::PATRIMONIO)
        .and_then(Value::as_object_mut)
        .and_then(|patrimonio| patrimonio.get_mut(kind.canonical_tag()))
        .and_then(Value::as_array_mut)
    else {
        return;
    };
    for asset in assets.iter_mut() {
        scan_asset(asset, kind, now, entries, skipped);
    }
}

fn scan_asset(
    asset: &mut Value,
    kind: AssetKind,
    now: DateTime<Utc>,
    entries: &mut Vec<GeneratedCashflowEntry>,
    skipped: &mut Vec<SkippedSchedule>,
) {
    let asset_id = item_id(asset).map(ItemId::from);
    let asset_label = asset
        .get(field::LABEL)
        .and_then(Value::as_str)
        .map(str::to_string);
    let Some(flows) = asset.get_mut(field::CASHFLOWS).and_then(Value::as_array_mut) else {
        return;
    };
    for flow in flows.iter_mut() {
        match realize(flow, asset_id.as_ref(), kind, asset_label.as_deref(), now) {
            Outcome::Realized(entry) => {
                debug!(
                    schedule = entry.source_cashflow_id.as_str(),
                    date = %entry.date,
                    amount = entry.amount,
                    "realized cashflow occurrence"
                );
                entries.push(entry);
            }
            Outcome::NotDue => {}
            Outcome::Skipped(skip) => {
                warn!(
                    asset = skip.asset_id.as_ref().map_or("?", ItemId::as_str),
                    schedule = skip.schedule_id.as_ref().map_or("?", ItemId::as_str),
                    reason = %skip.reason,
                    "schedule skipped this cycle"
                );
                skipped.push(skip);
            }
        }
    }
}

fn realize(
    flow: &mut Value,
    asset_id: Option<&ItemId>,
    kind: AssetKind,
    asset_label: Option<&str>,
    now: DateTime<Utc>,
) -> Outcome {
    // Cheap raw gates first: a schedule that is disabled or dormant is
    // not due, whatever else its shape looks like.
    let enabled = flow
        .get(field::AUTO_GENERATE)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let dormant = flow
        .get(field::NEXT_OCCURRENCE)
        .map_or(true, Value::is_null);
    if !enabled || dormant {
        return Outcome::NotDue;
    }

    let schedule: CashflowSchedule = match serde_json::from_value(flow.clone()) {
        Ok(schedule) => schedule,
        Err(err) => {
            return Outcome::Skipped(skip_of(
                flow,
                asset_id,
                SkipReason::MalformedSchedule(err.to_string()),
            ));
        }
    };
    let occurrence = match schedule.next_occurrence_instant() {
        Some(Ok(at)) => at,
        Some(Err(err)) => {
            return Outcome::Skipped(skip_of(
                flow,
                asset_id,
                SkipReason::MalformedDate(err.to_string()),
            ));
        }
        None => return Outcome::NotDue,
    };
    if occurrence > now {
        return Outcome::NotDue;
    }

    let date = CanonicalDate::from_datetime(occurrence);
    let Some(asset_id) = asset_id else {
        return Outcome::Skipped(SkippedSchedule {
            asset_id: None,
            schedule_id: Some(schedule.id.clone()),
            reason: SkipReason::MalformedSchedule("owning asset has no id".to_string()),
        });
    };
    let entry =
        GeneratedCashflowEntry::from_schedule(&schedule, asset_id.clone(), kind, asset_label, date);

    // Advance one period from the occurrence just realized, patching the
    // raw item so keys outside the schedule contract survive.
    let advanced = match schedule.frequency.advance_date(date) {
        Some(next) => Value::String(next.to_string()),
        None => Value::Null,
    };
    if let Some(item) = flow.as_object_mut() {
        item.insert(field::NEXT_OCCURRENCE.to_string(), advanced);
    }
    Outcome::Realized(entry)
}

fn skip_of(flow: &Value, asset_id: Option<&ItemId>, reason: SkipReason) -> SkippedSchedule {
    SkippedSchedule {
        asset_id: asset_id.cloned(),
        schedule_id: item_id(flow).map(ItemId::from),
        reason,
    }
}

/// Append `entry` to the generated collection of the section its kind
/// selects, creating the collection on first use.
fn route_entry(state: &mut FinancialState, entry: &GeneratedCashflowEntry) {
    let target = match entry.kind {
        CashflowKind::Income => section::ENTRATE,
        CashflowKind::Expense => section::USCITE,
    };
    let Some(items) = state.collection_mut(target, field::GENERATED) else {
        warn!(section = target, "generated slot is not an array; entry not routed");
        return;
    };
    match serde_json::to_value(entry) {
        Ok(value) => items.push(value),
        Err(err) => warn!(error = %err, "generated entry did not serialize"),
    }
}
