use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pfl_types::ItemId;

/// What a diff record asks the merge engine to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAction {
    Add,
    Remove,
    Modify,
}

/// Unique key of one mergeable unit.
///
/// Slash-joined: `section` for a whole-section record, `section/field`
/// for a field record, `section/field/item-id` for an item record. The
/// selection model keys its booleans by this path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiffPath(String);

impl DiffPath {
    pub fn section(section: &str) -> Self {
        Self(section.to_string())
    }

    pub fn field(section: &str, field: &str) -> Self {
        Self(format!("{section}/{field}"))
    }

    pub fn item(section: &str, field: &str, id: &ItemId) -> Self {
        Self(format!("{section}/{field}/{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DiffPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single structural difference between two states.
///
/// `baseline` and `proposed` carry the full values the diff saw on each
/// side; `None` means the value was absent there. A whole-section record
/// (shape degradation) has an empty `field`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    pub section: String,
    pub field: String,
    pub item_id: Option<ItemId>,
    pub action: DiffAction,
    pub baseline: Option<Value>,
    pub proposed: Option<Value>,
    pub path: DiffPath,
}

impl DiffRecord {
    /// A record covering a scalar or whole-array field.
    pub fn field(
        section: &str,
        field: &str,
        action: DiffAction,
        baseline: Option<Value>,
        proposed: Option<Value>,
    ) -> Self {
        Self {
            path: DiffPath::field(section, field),
            section: section.to_string(),
            field: field.to_string(),
            item_id: None,
            action,
            baseline,
            proposed,
        }
    }

    /// A record covering one item of an array field.
    pub fn item(
        section: &str,
        field: &str,
        id: ItemId,
        action: DiffAction,
        baseline: Option<Value>,
        proposed: Option<Value>,
    ) -> Self {
        Self {
            path: DiffPath::item(section, field, &id),
            section: section.to_string(),
            field: field.to_string(),
            item_id: Some(id),
            action,
            baseline,
            proposed,
        }
    }

    /// A record covering an entire section whose shape defeated the
    /// field walk.
    pub fn whole_section(
        section: &str,
        action: DiffAction,
        baseline: Option<Value>,
        proposed: Option<Value>,
    ) -> Self {
        Self {
            path: DiffPath::section(section),
            section: section.to_string(),
            field: String::new(),
            item_id: None,
            action,
            baseline,
            proposed,
        }
    }

    /// Whether this record targets a single array item.
    pub fn is_item(&self) -> bool {
        self.item_id.is_some()
    }

    /// Whether this record covers an entire section.
    pub fn is_whole_section(&self) -> bool {
        self.field.is_empty()
    }
}

/// The result of comparing two states.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSet {
    /// The list of change records.
    pub records: Vec<DiffRecord>,
}

impl DiffSet {
    /// Create an empty diff set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Number of add records.
    pub fn additions(&self) -> usize {
        self.count(DiffAction::Add)
    }

    /// Number of remove records.
    pub fn removals(&self) -> usize {
        self.count(DiffAction::Remove)
    }

    /// Number of modify records.
    pub fn modifications(&self) -> usize {
        self.count(DiffAction::Modify)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiffRecord> {
        self.records.iter()
    }

    pub fn push(&mut self, record: DiffRecord) {
        self.records.push(record);
    }

    /// Records grouped by `(section, field)`, in key order. Output order
    /// of [`compute`](crate::compute) is unspecified; consumers group.
    pub fn grouped(&self) -> BTreeMap<(String, String), Vec<&DiffRecord>> {
        let mut groups: BTreeMap<(String, String), Vec<&DiffRecord>> = BTreeMap::new();
        for record in &self.records {
            groups
                .entry((record.section.clone(), record.field.clone()))
                .or_default()
                .push(record);
        }
        groups
    }

    fn count(&self, action: DiffAction) -> usize {
        self.records.iter().filter(|r| r.action == action).count()
    }
}

impl<'a> IntoIterator for &'a DiffSet {
    type Item = &'a DiffRecord;
    type IntoIter = std::slice::Iter<'a, DiffRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn paths_identify_mergeable_units() {
        assert_eq!(DiffPath::section("entrate").as_str(), "entrate");
        assert_eq!(DiffPath::field("entrate", "stipendio").as_str(), "entrate/stipendio");
        assert_eq!(
            DiffPath::item("patrimonio", "immobili", &ItemId::new("casa-1")).as_str(),
            "patrimonio/immobili/casa-1"
        );
    }

    #[test]
    fn counters_by_action() {
        let mut set = DiffSet::new();
        set.push(DiffRecord::field("a", "x", DiffAction::Add, None, Some(json!(1))));
        set.push(DiffRecord::field("a", "y", DiffAction::Remove, Some(json!(2)), None));
        set.push(DiffRecord::item(
            "a",
            "z",
            ItemId::new("i"),
            DiffAction::Modify,
            Some(json!({ "id": "i", "v": 1 })),
            Some(json!({ "id": "i", "v": 2 })),
        ));
        assert_eq!(set.len(), 3);
        assert_eq!(set.additions(), 1);
        assert_eq!(set.removals(), 1);
        assert_eq!(set.modifications(), 1);
    }

    #[test]
    fn grouping_by_section_and_field() {
        let mut set = DiffSet::new();
        set.push(DiffRecord::item(
            "patrimonio",
            "immobili",
            ItemId::new("a"),
            DiffAction::Add,
            None,
            Some(json!({ "id": "a" })),
        ));
        set.push(DiffRecord::item(
            "patrimonio",
            "immobili",
            ItemId::new("b"),
            DiffAction::Add,
            None,
            Some(json!({ "id": "b" })),
        ));
        set.push(DiffRecord::field("entrate", "stipendio", DiffAction::Modify, Some(json!(1)), Some(json!(2))));

        let groups = set.grouped();
        assert_eq!(groups.len(), 2);
        let key = ("patrimonio".to_string(), "immobili".to_string());
        assert_eq!(groups[&key].len(), 2);
    }

    #[test]
    fn whole_section_record_shape() {
        let record = DiffRecord::whole_section("entrate", DiffAction::Modify, Some(json!(1)), Some(json!({})));
        assert!(record.is_whole_section());
        assert!(!record.is_item());
        assert_eq!(record.path.as_str(), "entrate");
    }
}
