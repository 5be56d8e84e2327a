//! Orphan sweep over the generated collections.

use serde_json::Value;
use tracing::warn;

use pfl_state::{field, find_by_id, item_id, section, FinancialState};
use pfl_types::{AssetKind, ItemId};

use crate::router::OrphanWarning;

/// Scan both generated collections for entries whose source schedule no
/// longer exists.
///
/// Entries without complete source metadata are ignored; they never
/// claimed a schedule. Unrecognized kind tags degrade to scanning every
/// known collection, mirroring [`crate::propagate`].
pub fn find_orphans(state: &FinancialState) -> Vec<OrphanWarning> {
    let mut orphans = Vec::new();
    for name in [section::ENTRATE, section::USCITE] {
        let Some(items) = state.collection(name, field::GENERATED) else {
            continue;
        };
        for item in items {
            if let Some(warning) = check_entry(state, item) {
                warn!(%warning, "orphaned generated entry");
                orphans.push(warning);
            }
        }
    }
    orphans
}

fn check_entry(state: &FinancialState, item: &Value) -> Option<OrphanWarning> {
    let entry_id = item_id(item)?;
    let asset_id = item.get(field::SOURCE_ASSET_ID)?.as_str()?;
    let asset_kind = item.get(field::SOURCE_ASSET_KIND)?.as_str()?;
    let cashflow_id = item.get(field::SOURCE_CASHFLOW_ID)?.as_str()?;

    if schedule_exists(state, asset_kind, asset_id, cashflow_id) {
        return None;
    }
    Some(OrphanWarning {
        entry_id: ItemId::from(entry_id),
        asset_id: ItemId::from(asset_id),
        asset_kind: asset_kind.to_string(),
        cashflow_id: ItemId::from(cashflow_id),
    })
}

fn schedule_exists(state: &FinancialState, tag: &str, asset_id: &str, cashflow_id: &str) -> bool {
    let kinds = match AssetKind::resolve(tag) {
        Ok(kind) => vec![kind],
        Err(_) => AssetKind::ALL.to_vec(),
    };
    kinds.into_iter().any(|kind| {
        state
            .collection(section::PATRIMONIO, kind.canonical_tag())
            .and_then(|assets| find_by_id(assets, asset_id))
            .and_then(|asset| asset.get(field::CASHFLOWS))
            .and_then(Value::as_array)
            .and_then(|flows| find_by_id(flows, cashflow_id))
            .is_some()
    })
}
