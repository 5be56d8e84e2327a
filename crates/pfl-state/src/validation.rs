use std::collections::HashSet;

use serde_json::Value;

use crate::error::{StateError, StateResult};
use crate::state::{item_id, json_type_name, FinancialState};

/// Result of structural validation over a state tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateReport {
    pub sections_checked: usize,
    pub violations: Vec<StateViolation>,
}

impl StateReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific structural violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateViolation {
    /// Slash-joined location (`section` or `section/field`).
    pub path: String,
    pub kind: StateViolationKind,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateViolationKind {
    NonObjectSection,
    DuplicateItemId,
    InvalidAmount,
}

/// Check the invariants a caller can break by handing in raw state:
/// sections are JSON objects, item ids are unique within each
/// collection, and `amount` fields hold numbers.
pub fn check_state(state: &FinancialState) -> StateReport {
    let mut violations = Vec::new();
    let mut sections_checked = 0;

    for (name, value) in state.sections() {
        sections_checked += 1;
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => {
                violations.push(StateViolation {
                    path: name.clone(),
                    kind: StateViolationKind::NonObjectSection,
                    description: format!("expected object, got {}", json_type_name(value)),
                });
                continue;
            }
        };

        for (field, field_value) in obj {
            let items = match field_value.as_array() {
                Some(items) => items,
                None => continue,
            };
            let path = format!("{name}/{field}");
            let mut seen = HashSet::new();
            for item in items {
                if let Some(id) = item_id(item) {
                    if !seen.insert(id) {
                        violations.push(StateViolation {
                            path: path.clone(),
                            kind: StateViolationKind::DuplicateItemId,
                            description: format!("duplicate item id {id}"),
                        });
                    }
                }
                check_amount(item, &path, &mut violations);
            }
        }
    }

    StateReport {
        sections_checked,
        violations,
    }
}

fn check_amount(item: &Value, path: &str, violations: &mut Vec<StateViolation>) {
    let Some(amount) = item.get("amount") else {
        return;
    };
    if !amount.is_number() {
        let id = item_id(item).unwrap_or("<no id>");
        violations.push(StateViolation {
            path: path.to_string(),
            kind: StateViolationKind::InvalidAmount,
            description: format!("item {id}: amount is {}", json_type_name(amount)),
        });
    }
}

/// Strict form: the first violation becomes a [`StateError::Validation`].
pub fn ensure_valid(state: &FinancialState) -> StateResult<()> {
    let report = check_state(state);
    match report.violations.into_iter().next() {
        None => Ok(()),
        Some(v) => Err(StateError::Validation {
            path: v.path,
            message: v.description,
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn state(value: serde_json::Value) -> FinancialState {
        FinancialState::from_value(value).unwrap()
    }

    #[test]
    fn well_formed_state_passes() {
        let report = check_state(&state(json!({
            "entrate": { "stipendio": 2500.0, "generated": [] },
            "patrimonio": {
                "immobili": [
                    { "id": "casa-1", "cashflows": [{ "id": "cf-1", "amount": 1200.0 }] }
                ]
            }
        })));
        assert!(report.is_valid());
        assert_eq!(report.sections_checked, 2);
    }

    #[test]
    fn empty_state_is_valid() {
        assert!(check_state(&FinancialState::new()).is_valid());
    }

    #[test]
    fn non_object_section_is_flagged() {
        let report = check_state(&state(json!({ "entrate": [1, 2, 3] })));
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, StateViolationKind::NonObjectSection);
        assert_eq!(report.violations[0].path, "entrate");
    }

    #[test]
    fn duplicate_item_ids_are_flagged() {
        let report = check_state(&state(json!({
            "patrimonio": {
                "conti": [
                    { "id": "c-1" },
                    { "id": "c-2" },
                    { "id": "c-1" }
                ]
            }
        })));
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, StateViolationKind::DuplicateItemId);
        assert_eq!(report.violations[0].path, "patrimonio/conti");
    }

    #[test]
    fn id_less_items_never_collide() {
        let report = check_state(&state(json!({
            "patrimonio": { "conti": [{ "saldo": 1 }, { "saldo": 2 }] }
        })));
        assert!(report.is_valid());
    }

    #[test]
    fn non_numeric_amount_is_flagged() {
        let report = check_state(&state(json!({
            "uscite": { "generated": [{ "id": "g-1", "amount": "1200" }] }
        })));
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, StateViolationKind::InvalidAmount);
    }

    #[test]
    fn ensure_valid_surfaces_first_violation() {
        let err = ensure_valid(&state(json!({ "entrate": "nope" }))).unwrap_err();
        match err {
            StateError::Validation { path, .. } => assert_eq!(path, "entrate"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
