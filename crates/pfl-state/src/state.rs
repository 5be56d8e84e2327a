use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StateError, StateResult};

/// Top-level section names the engines interpret.
pub mod section {
    /// Income: salaries, rents, and the generated income collection.
    pub const ENTRATE: &str = "entrate";
    /// Assets: the collections named by `AssetKind`.
    pub const PATRIMONIO: &str = "patrimonio";
    /// Liquidity: cash positions and balances.
    pub const LIQUIDITA: &str = "liquidita";
    /// Expenses: outflows and the generated expense collection.
    pub const USCITE: &str = "uscite";
    /// Side projects.
    pub const PROGETTI: &str = "progetti";
}

/// Field names the engines interpret inside sections and items.
///
/// Schedule keys are spelled as stored (camelCase): the scheduler and
/// the sync router patch raw items in place rather than re-serializing
/// typed records, so unknown keys survive.
pub mod field {
    /// The line-item identity key.
    pub const ID: &str = "id";
    /// Embedded cashflow schedules on an asset item.
    pub const CASHFLOWS: &str = "cashflows";
    /// Generated-entry collection inside the income/expense sections.
    pub const GENERATED: &str = "generated";
    pub const LABEL: &str = "label";
    pub const AMOUNT: &str = "amount";
    pub const KIND: &str = "kind";
    pub const FREQUENCY: &str = "frequency";
    pub const START_DATE: &str = "startDate";
    pub const AUTO_GENERATE: &str = "autoGenerate";
    pub const NEXT_OCCURRENCE: &str = "nextOccurrence";
    /// Routing metadata on a generated entry.
    pub const SOURCE_ASSET_ID: &str = "sourceAssetId";
    pub const SOURCE_ASSET_KIND: &str = "sourceAssetKind";
    pub const SOURCE_CASHFLOW_ID: &str = "sourceCashflowId";
}

/// The per-user ledger state tree.
///
/// Sections are JSON objects keyed by name; inside a section, a field
/// holds either a scalar value or an array of line items. The map is
/// ordered so serialization (and therefore hashing) is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinancialState(BTreeMap<String, Value>);

impl FinancialState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value. The root must be an object.
    pub fn from_value(value: Value) -> StateResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            other => Err(StateError::NotAnObject(json_type_name(&other))),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0.into_iter().collect())
    }

    pub fn to_value(&self) -> Value {
        self.clone().into_value()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_section(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.0.get_mut(name)
    }

    pub fn set_section(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn remove_section(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Iterate sections in key order.
    pub fn sections(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// The scalar or collection value at `section.field`.
    pub fn field_value(&self, section: &str, field: &str) -> Option<&Value> {
        self.0.get(section)?.as_object()?.get(field)
    }

    /// Set `section.field`, creating the section object when absent.
    /// Returns `false` when an existing section is not an object.
    pub fn set_field(&mut self, section: &str, field: &str, value: Value) -> bool {
        let sect = self
            .0
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match sect.as_object_mut() {
            Some(obj) => {
                obj.insert(field.to_string(), value);
                true
            }
            None => false,
        }
    }

    pub fn remove_field(&mut self, section: &str, field: &str) -> Option<Value> {
        self.0.get_mut(section)?.as_object_mut()?.remove(field)
    }

    /// The item array at `section.field`, if present and an array.
    pub fn collection(&self, section: &str, field: &str) -> Option<&Vec<Value>> {
        self.field_value(section, field)?.as_array()
    }

    /// Mutable access to the item array at `section.field`, creating the
    /// section object and the array when absent. An existing `null` is
    /// promoted to an empty array (the two are canonically equivalent).
    /// Returns `None` when an existing value at either position has the
    /// wrong shape.
    pub fn collection_mut(&mut self, section: &str, field: &str) -> Option<&mut Vec<Value>> {
        let sect = self
            .0
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let obj = sect.as_object_mut()?;
        let slot = obj
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }
        slot.as_array_mut()
    }
}

/// The identity of a line item, when it carries one.
pub fn item_id(item: &Value) -> Option<&str> {
    item.get(field::ID)?.as_str()
}

pub fn find_by_id<'a>(items: &'a [Value], id: &str) -> Option<&'a Value> {
    items.iter().find(|item| item_id(item) == Some(id))
}

pub fn find_by_id_mut<'a>(items: &'a mut [Value], id: &str) -> Option<&'a mut Value> {
    items.iter_mut().find(|item| item_id(item) == Some(id))
}

pub fn position_of_id(items: &[Value], id: &str) -> Option<usize> {
    items.iter().position(|item| item_id(item) == Some(id))
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
