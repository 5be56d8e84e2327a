//! Structural comparison of two financial state trees.
//!
//! The engine walks the union of sections, then the union of fields,
//! then (for array fields) the union of item identities, and emits one
//! [`DiffRecord`] per difference at the finest granularity the shapes
//! allow. It is a total function: unexpected shapes degrade to a
//! coarser record, never to a failure.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use pfl_state::{item_id, FinancialState};
use pfl_types::ItemId;

use crate::canonical::canonical_eq;
use crate::record::{DiffAction, DiffRecord, DiffSet};

/// Compare `baseline` against `proposed`.
///
/// A section absent (or `null`) in `baseline` but present in `proposed`
/// is handled in bulk-add mode: every field and item of the proposed
/// section becomes an add record, with synthetic ids assigned to items
/// lacking one. Sections absent in `proposed` yield per-field removals.
pub fn compute(baseline: &FinancialState, proposed: &FinancialState) -> DiffSet {
    let mut set = DiffSet::new();
    let names: BTreeSet<&String> = baseline
        .section_names()
        .chain(proposed.section_names())
        .collect();

    for name in names {
        // An explicit null section counts as absent.
        let b = baseline.section(name).filter(|v| !v.is_null());
        let p = proposed.section(name).filter(|v| !v.is_null());
        match (b, p) {
            (None, None) => {}
            (None, Some(pv)) => bulk_add_section(&mut set, name, pv),
            (Some(bv), None) => remove_section(&mut set, name, bv),
            (Some(bv), Some(pv)) => diff_section(&mut set, name, bv, pv),
        }
    }

    set
}

fn diff_section(set: &mut DiffSet, section: &str, bv: &Value, pv: &Value) {
    match (bv.as_object(), pv.as_object()) {
        (Some(bo), Some(po)) => {
            let fields: BTreeSet<&String> = bo.keys().chain(po.keys()).collect();
            for field in fields {
                diff_field(set, section, field, bo.get(field), po.get(field));
            }
        }
        // A non-object side defeats the field walk; fall back to one
        // record covering the whole section.
        _ => {
            if !canonical_eq(bv, pv) {
                set.push(DiffRecord::whole_section(
                    section,
                    DiffAction::Modify,
                    Some(bv.clone()),
                    Some(pv.clone()),
                ));
            }
        }
    }
}

/// Bulk-add mode: the section is new relative to baseline.
fn bulk_add_section(set: &mut DiffSet, section: &str, pv: &Value) {
    let po = match pv.as_object() {
        Some(po) => po,
        None => {
            set.push(DiffRecord::whole_section(
                section,
                DiffAction::Add,
                None,
                Some(pv.clone()),
            ));
            return;
        }
    };

    for (field, fv) in po {
        match fv {
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    let id = match item_id(item) {
                        Some(id) => ItemId::new(id),
                        None => ItemId::synthetic(field, idx),
                    };
                    set.push(DiffRecord::item(
                        section,
                        field,
                        id,
                        DiffAction::Add,
                        None,
                        Some(item.clone()),
                    ));
                }
            }
            Value::Null => {}
            other => set.push(DiffRecord::field(
                section,
                field,
                DiffAction::Add,
                None,
                Some(other.clone()),
            )),
        }
    }
}

fn remove_section(set: &mut DiffSet, section: &str, bv: &Value) {
    match bv.as_object() {
        Some(bo) => {
            for (field, fv) in bo {
                diff_field(set, section, field, Some(fv), None);
            }
        }
        None => set.push(DiffRecord::whole_section(
            section,
            DiffAction::Remove,
            Some(bv.clone()),
            None,
        )),
    }
}

fn diff_field(
    set: &mut DiffSet,
    section: &str,
    field: &str,
    bf: Option<&Value>,
    pf: Option<&Value>,
) {
    if let (Some(Value::Array(b_items)), Some(Value::Array(p_items))) = (bf, pf) {
        diff_items(set, section, field, b_items, p_items);
        return;
    }

    if canonical_eq(bf.unwrap_or(&Value::Null), pf.unwrap_or(&Value::Null)) {
        return;
    }
    let action = match (bf, pf) {
        (None, _) => DiffAction::Add,
        (_, None) => DiffAction::Remove,
        _ => DiffAction::Modify,
    };
    set.push(DiffRecord::field(
        section,
        field,
        action,
        bf.cloned(),
        pf.cloned(),
    ));
}

/// Identity-aware comparison of two item arrays.
///
/// Items carrying an id are matched by id across sides. Id-less items
/// cannot be matched by identity; canonically equal ones pair up and
/// drop out, the rest become removals (baseline side) and additions
/// (proposed side) under synthetic ids.
fn diff_items(
    set: &mut DiffSet,
    section: &str,
    field: &str,
    b_items: &[Value],
    p_items: &[Value],
) {
    let b_ids: BTreeMap<&str, &Value> = b_items
        .iter()
        .filter_map(|item| item_id(item).map(|id| (id, item)))
        .collect();
    let p_ids: BTreeMap<&str, &Value> = p_items
        .iter()
        .filter_map(|item| item_id(item).map(|id| (id, item)))
        .collect();

    let ids: BTreeSet<&str> = b_ids.keys().chain(p_ids.keys()).copied().collect();
    for id in ids {
        match (b_ids.get(id), p_ids.get(id)) {
            (None, Some(p)) => set.push(DiffRecord::item(
                section,
                field,
                ItemId::new(id),
                DiffAction::Add,
                None,
                Some((*p).clone()),
            )),
            (Some(b), None) => set.push(DiffRecord::item(
                section,
                field,
                ItemId::new(id),
                DiffAction::Remove,
                Some((*b).clone()),
                None,
            )),
            (Some(b), Some(p)) => {
                if !canonical_eq(b, p) {
                    set.push(DiffRecord::item(
                        section,
                        field,
                        ItemId::new(id),
                        DiffAction::Modify,
                        Some((*b).clone()),
                        Some((*p).clone()),
                    ));
                }
            }
            (None, None) => unreachable!("id came from one of the maps"),
        }
    }

    let mut leftover: Vec<(usize, &Value)> = p_items
        .iter()
        .enumerate()
        .filter(|(_, item)| item_id(item).is_none())
        .collect();
    for (idx, b_item) in b_items
        .iter()
        .enumerate()
        .filter(|(_, item)| item_id(item).is_none())
    {
        if let Some(pos) = leftover
            .iter()
            .position(|(_, p_item)| canonical_eq(b_item, p_item))
        {
            leftover.remove(pos);
        } else {
            set.push(DiffRecord::item(
                section,
                field,
                ItemId::synthetic_baseline(field, idx),
                DiffAction::Remove,
                Some(b_item.clone()),
                None,
            ));
        }
    }
    for (idx, p_item) in leftover {
        set.push(DiffRecord::item(
            section,
            field,
            ItemId::synthetic(field, idx),
            DiffAction::Add,
            None,
            Some(p_item.clone()),
        ));
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::{json, Map};

    use super::*;

    fn state(value: Value) -> FinancialState {
        FinancialState::from_value(value).unwrap()
    }

    // ---- section and field level ----

    #[test]
    fn identical_states_no_diff() {
        let s = state(json!({
            "entrate": { "stipendio": 2500.0, "generated": [] },
            "patrimonio": {
                "immobili": [{ "id": "casa-1", "value": 250000.0 }]
            }
        }));
        assert!(compute(&s, &s).is_empty());
    }

    #[test]
    fn scalar_field_modification() {
        let b = state(json!({ "entrate": { "stipendio": 2500.0 } }));
        let p = state(json!({ "entrate": { "stipendio": 2700.0 } }));
        let set = compute(&b, &p);
        assert_eq!(set.len(), 1);
        assert_eq!(set.modifications(), 1);
        let record = &set.records[0];
        assert_eq!(record.path.as_str(), "entrate/stipendio");
        assert_eq!(record.baseline, Some(json!(2500.0)));
        assert_eq!(record.proposed, Some(json!(2700.0)));
    }

    #[test]
    fn field_action_inferred_from_presence() {
        let b = state(json!({ "liquidita": { "contante": 100.0 } }));
        let p = state(json!({ "liquidita": { "saldoMedio": 900.0 } }));
        let set = compute(&b, &p);
        assert_eq!(set.len(), 2);
        assert_eq!(set.additions(), 1);
        assert_eq!(set.removals(), 1);
    }

    #[test]
    fn integer_and_float_spellings_are_equal() {
        let b = state(json!({ "entrate": { "stipendio": 2500 } }));
        let p = state(json!({ "entrate": { "stipendio": 2500.0 } }));
        assert!(compute(&b, &p).is_empty());
    }

    #[test]
    fn null_and_empty_array_are_equal() {
        let b = state(json!({ "patrimonio": { "conti": null } }));
        let p = state(json!({ "patrimonio": { "conti": [] } }));
        assert!(compute(&b, &p).is_empty());
        assert!(compute(&p, &b).is_empty());
    }

    #[test]
    fn section_removal_yields_field_removals() {
        let b = state(json!({
            "progetti": { "side": 100.0, "vuoto": null }
        }));
        let p = state(json!({}));
        let set = compute(&b, &p);
        assert_eq!(set.len(), 1);
        assert_eq!(set.removals(), 1);
        assert_eq!(set.records[0].path.as_str(), "progetti/side");
    }

    #[test]
    fn non_object_section_degrades_to_whole_section_record() {
        let b = state(json!({ "entrate": 42 }));
        let p = state(json!({ "entrate": { "stipendio": 2500.0 } }));
        let set = compute(&b, &p);
        assert_eq!(set.len(), 1);
        let record = &set.records[0];
        assert!(record.is_whole_section());
        assert_eq!(record.action, DiffAction::Modify);
        assert_eq!(record.path.as_str(), "entrate");
    }

    // ---- bulk-add mode ----

    #[test]
    fn new_section_bulk_adds_fields_and_items() {
        let b = state(json!({}));
        let p = state(json!({
            "patrimonio": {
                "totale": 250000.0,
                "immobili": [
                    {
                        "id": "casa-1",
                        "label": "Casa",
                        "cashflows": [
                            { "id": "cf-1", "amount": 1200.0, "kind": "income", "frequency": "monthly" },
                            { "id": "cf-2", "amount": 150.0, "kind": "expense", "frequency": "monthly" }
                        ]
                    }
                ]
            }
        }));
        let set = compute(&b, &p);
        assert_eq!(set.len(), 2);
        assert_eq!(set.additions(), 2);

        let item = set
            .iter()
            .find(|r| r.path.as_str() == "patrimonio/immobili/casa-1")
            .unwrap();
        let cashflows = item.proposed.as_ref().unwrap()["cashflows"]
            .as_array()
            .unwrap();
        assert_eq!(cashflows.len(), 2);

        assert!(set.iter().any(|r| r.path.as_str() == "patrimonio/totale"));
    }

    #[test]
    fn null_baseline_section_is_bulk_add() {
        let b = state(json!({ "patrimonio": null }));
        let p = state(json!({ "patrimonio": { "totale": 1.0 } }));
        let set = compute(&b, &p);
        assert_eq!(set.len(), 1);
        assert_eq!(set.additions(), 1);
    }

    #[test]
    fn bulk_add_assigns_synthetic_ids_to_idless_items() {
        let b = state(json!({}));
        let p = state(json!({
            "uscite": { "varie": [{ "amount": 10.0 }, { "id": "u-1", "amount": 20.0 }] }
        }));
        let set = compute(&b, &p);
        assert_eq!(set.len(), 2);
        let ids: Vec<_> = set
            .iter()
            .map(|r| r.item_id.as_ref().unwrap().as_str().to_string())
            .collect();
        assert!(ids.contains(&"~varie#0".to_string()));
        assert!(ids.contains(&"u-1".to_string()));
    }

    #[test]
    fn bulk_add_skips_empty_fields() {
        let b = state(json!({}));
        let p = state(json!({ "uscite": { "generated": [], "note": null } }));
        assert!(compute(&b, &p).is_empty());
    }

    // ---- item-level matching ----

    #[test]
    fn item_add_remove_modify() {
        let b = state(json!({
            "patrimonio": {
                "conti": [
                    { "id": "keep", "saldo": 1.0 },
                    { "id": "change", "saldo": 10.0 },
                    { "id": "drop", "saldo": 5.0 }
                ]
            }
        }));
        let p = state(json!({
            "patrimonio": {
                "conti": [
                    { "id": "keep", "saldo": 1.0 },
                    { "id": "change", "saldo": 12.0 },
                    { "id": "new", "saldo": 7.0 }
                ]
            }
        }));
        let set = compute(&b, &p);
        assert_eq!(set.len(), 3);
        assert_eq!(set.additions(), 1);
        assert_eq!(set.removals(), 1);
        assert_eq!(set.modifications(), 1);

        let modified = set
            .iter()
            .find(|r| r.action == DiffAction::Modify)
            .unwrap();
        assert_eq!(modified.path.as_str(), "patrimonio/conti/change");
        assert_eq!(modified.baseline.as_ref().unwrap()["saldo"], json!(10.0));
        assert_eq!(modified.proposed.as_ref().unwrap()["saldo"], json!(12.0));
    }

    #[test]
    fn reordering_identified_items_is_not_a_change() {
        let b = state(json!({
            "patrimonio": { "conti": [{ "id": "a" }, { "id": "b" }] }
        }));
        let p = state(json!({
            "patrimonio": { "conti": [{ "id": "b" }, { "id": "a" }] }
        }));
        assert!(compute(&b, &p).is_empty());
    }

    #[test]
    fn idless_items_pair_by_equality() {
        let b = state(json!({
            "uscite": { "varie": [{ "amount": 1.0 }, { "amount": 2.0 }] }
        }));
        let p = state(json!({
            "uscite": { "varie": [{ "amount": 2.0 }, { "amount": 3.0 }] }
        }));
        let set = compute(&b, &p);
        assert_eq!(set.len(), 2);
        let removal = set.iter().find(|r| r.action == DiffAction::Remove).unwrap();
        assert_eq!(removal.path.as_str(), "uscite/varie/~varie@0");
        assert_eq!(removal.baseline, Some(json!({ "amount": 1.0 })));
        let addition = set.iter().find(|r| r.action == DiffAction::Add).unwrap();
        assert_eq!(addition.path.as_str(), "uscite/varie/~varie#1");
        assert_eq!(addition.proposed, Some(json!({ "amount": 3.0 })));
    }

    #[test]
    fn idless_items_never_match_by_identity() {
        // Same position, different content: one removal plus one addition,
        // never a modify.
        let b = state(json!({ "uscite": { "varie": [{ "amount": 1.0 }] } }));
        let p = state(json!({ "uscite": { "varie": [{ "amount": 9.0 }] } }));
        let set = compute(&b, &p);
        assert_eq!(set.len(), 2);
        assert_eq!(set.modifications(), 0);
    }

    #[test]
    fn array_against_scalar_degrades_to_field_record() {
        let b = state(json!({ "patrimonio": { "conti": 3 } }));
        let p = state(json!({ "patrimonio": { "conti": [{ "id": "a" }] } }));
        let set = compute(&b, &p);
        assert_eq!(set.len(), 1);
        assert_eq!(set.records[0].item_id, None);
        assert_eq!(set.records[0].action, DiffAction::Modify);
    }

    // ---- properties ----

    fn scalar_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            (-1000i64..1000).prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::from),
        ]
    }

    fn item_array() -> impl Strategy<Value = Value> {
        prop::collection::vec((any::<bool>(), scalar_value()), 0..4).prop_map(|specs| {
            let items: Vec<Value> = specs
                .into_iter()
                .enumerate()
                .map(|(i, (has_id, v))| {
                    let mut m = Map::new();
                    if has_id {
                        m.insert("id".into(), Value::from(format!("it-{i}")));
                    }
                    m.insert("v".into(), v);
                    Value::Object(m)
                })
                .collect();
            Value::Array(items)
        })
    }

    fn section_value() -> impl Strategy<Value = Value> {
        prop::collection::btree_map(
            "[a-d]",
            prop_oneof![scalar_value(), item_array()],
            0..4,
        )
        .prop_map(|fields| Value::Object(fields.into_iter().collect()))
    }

    fn arb_state() -> impl Strategy<Value = FinancialState> {
        prop::collection::btree_map("[a-e]", section_value(), 0..4).prop_map(|sections| {
            FinancialState::from_value(Value::Object(sections.into_iter().collect()))
                .expect("object root")
        })
    }

    proptest! {
        #[test]
        fn comparing_a_state_with_itself_is_empty(s in arb_state()) {
            prop_assert!(compute(&s, &s).is_empty());
        }

        #[test]
        fn compute_is_deterministic(b in arb_state(), p in arb_state()) {
            prop_assert_eq!(compute(&b, &p), compute(&b, &p));
        }

        #[test]
        fn record_paths_are_unique(b in arb_state(), p in arb_state()) {
            let set = compute(&b, &p);
            let mut paths: Vec<_> = set.iter().map(|r| r.path.clone()).collect();
            let total = paths.len();
            paths.sort();
            paths.dedup();
            prop_assert_eq!(paths.len(), total);
        }
    }
}
