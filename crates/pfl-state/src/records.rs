use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pfl_types::{
    parse_timestamp, AssetKind, CanonicalDate, CashflowKind, Frequency, ItemId, TypeError,
};

/// A recurring cashflow attached to an asset.
///
/// Lives inside the asset item's `cashflows` array. This is the typed
/// view used for reading; writers patch the raw JSON item in place so
/// fields outside this contract survive a load/store round-trip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowSchedule {
    pub id: ItemId,
    #[serde(default)]
    pub label: Option<String>,
    pub amount: f64,
    pub kind: CashflowKind,
    pub frequency: Frequency,
    #[serde(default)]
    pub start_date: Option<CanonicalDate>,
    #[serde(default)]
    pub auto_generate: bool,
    /// Raw next-occurrence timestamp. Kept as the stored string so a
    /// malformed value is a per-schedule condition, not a parse failure
    /// for the whole asset.
    #[serde(default)]
    pub next_occurrence: Option<String>,
}

impl CashflowSchedule {
    /// The parsed next occurrence: `None` when dormant, `Some(Err)` when
    /// the stored string does not parse.
    pub fn next_occurrence_instant(&self) -> Option<Result<DateTime<Utc>, TypeError>> {
        self.next_occurrence.as_deref().map(parse_timestamp)
    }

    /// The label a generated entry should carry: the schedule's own
    /// label, else the owning asset's, else a generic fallback.
    pub fn entry_label(&self, asset_label: Option<&str>) -> String {
        if let Some(label) = &self.label {
            if !label.is_empty() {
                return label.clone();
            }
        }
        match asset_label {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => "Cashflow".to_string(),
        }
    }
}

/// A concrete ledger entry materialized from a schedule occurrence.
///
/// Routed into the generated collection of the income or expense section
/// by its kind. Carries enough source metadata for an edit to find its
/// way back to the owning schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCashflowEntry {
    pub id: ItemId,
    pub label: String,
    pub amount: f64,
    pub kind: CashflowKind,
    /// The occurrence date, not the generation time.
    pub date: CanonicalDate,
    pub source_asset_id: ItemId,
    pub source_asset_kind: AssetKind,
    pub source_cashflow_id: ItemId,
}

impl GeneratedCashflowEntry {
    /// Materialize one occurrence of `schedule` on `date`.
    pub fn from_schedule(
        schedule: &CashflowSchedule,
        asset_id: ItemId,
        asset_kind: AssetKind,
        asset_label: Option<&str>,
        date: CanonicalDate,
    ) -> Self {
        Self {
            id: ItemId::generate(),
            label: schedule.entry_label(asset_label),
            amount: schedule.amount,
            kind: schedule.kind,
            date,
            source_asset_id: asset_id,
            source_asset_kind: asset_kind,
            source_cashflow_id: schedule.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn schedule_deserializes_from_camel_case() {
        let schedule: CashflowSchedule = serde_json::from_value(json!({
            "id": "cf-1",
            "label": "Affitto",
            "amount": 1200.0,
            "kind": "income",
            "frequency": "monthly",
            "startDate": "2024-01-15",
            "autoGenerate": true,
            "nextOccurrence": "2024-01-15T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(schedule.id.as_str(), "cf-1");
        assert!(schedule.auto_generate);
        assert_eq!(schedule.frequency, Frequency::Monthly);
        let instant = schedule.next_occurrence_instant().unwrap().unwrap();
        assert_eq!(CanonicalDate::from_datetime(instant).to_string(), "2024-01-15");
    }

    #[test]
    fn schedule_optional_fields_default() {
        let schedule: CashflowSchedule = serde_json::from_value(json!({
            "id": "cf-2",
            "amount": 50.0,
            "kind": "expense",
            "frequency": "once"
        }))
        .unwrap();
        assert_eq!(schedule.label, None);
        assert!(!schedule.auto_generate);
        assert_eq!(schedule.next_occurrence, None);
        assert!(schedule.next_occurrence_instant().is_none());
    }

    #[test]
    fn schedule_with_bad_kind_is_malformed() {
        let res = serde_json::from_value::<CashflowSchedule>(json!({
            "id": "cf-3",
            "amount": 10.0,
            "kind": "transfer",
            "frequency": "monthly"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn malformed_next_occurrence_is_per_schedule() {
        let schedule: CashflowSchedule = serde_json::from_value(json!({
            "id": "cf-4",
            "amount": 10.0,
            "kind": "income",
            "frequency": "monthly",
            "nextOccurrence": "soon"
        }))
        .unwrap();
        assert!(schedule.next_occurrence_instant().unwrap().is_err());
    }

    #[test]
    fn entry_label_fallback_chain() {
        let mut schedule: CashflowSchedule = serde_json::from_value(json!({
            "id": "cf-5",
            "amount": 10.0,
            "kind": "income",
            "frequency": "monthly"
        }))
        .unwrap();
        assert_eq!(schedule.entry_label(Some("Casa")), "Casa");
        assert_eq!(schedule.entry_label(None), "Cashflow");
        schedule.label = Some("Affitto".to_string());
        assert_eq!(schedule.entry_label(Some("Casa")), "Affitto");
    }

    #[test]
    fn entry_serializes_with_camel_case_wire_names() {
        let schedule: CashflowSchedule = serde_json::from_value(json!({
            "id": "cf-1",
            "label": "Affitto",
            "amount": 1200.0,
            "kind": "income",
            "frequency": "monthly"
        }))
        .unwrap();
        let entry = GeneratedCashflowEntry::from_schedule(
            &schedule,
            ItemId::new("casa-1"),
            AssetKind::Immobili,
            Some("Casa"),
            CanonicalDate::parse("2024-01-15").unwrap(),
        );
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["sourceAssetId"], json!("casa-1"));
        assert_eq!(value["sourceAssetKind"], json!("immobili"));
        assert_eq!(value["sourceCashflowId"], json!("cf-1"));
        assert_eq!(value["date"], json!("2024-01-15"));
        assert_eq!(value["label"], json!("Affitto"));
    }
}
