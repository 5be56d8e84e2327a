use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Prefix marking a synthetic item id. Synthetic ids are assigned by the
/// diff engine to id-less collection items so they can be selected
/// individually; they are never written back into persisted state.
pub const SYNTHETIC_PREFIX: char = '~';

/// Partitioning key for per-user ledger state.
///
/// Every store operation is scoped to a `UserId`. The value is opaque to
/// the ledger; the embedding host decides what it encodes (an account id,
/// a device id, a session subject).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create an ephemeral (random) UserId for tests and demos.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; 8];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(format!("user-{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identity of a line item within a collection.
///
/// Item ids are unique within their collection and stable across
/// snapshots. Generated entries carry time-ordered UUID v7 ids; items
/// that arrive without an id are assigned a synthetic id (see
/// [`SYNTHETIC_PREFIX`]) for the duration of a diff.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new time-ordered item id (UUID v7).
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Synthetic id for the id-less proposed item at `ordinal` in the
    /// collection `field`.
    ///
    /// Deterministic for a given diff input, so re-computing the same diff
    /// yields the same selectable paths.
    pub fn synthetic(field: &str, ordinal: usize) -> Self {
        Self(format!("{SYNTHETIC_PREFIX}{field}#{ordinal}"))
    }

    /// Synthetic id for the id-less baseline item at `ordinal`.
    ///
    /// Uses a different separator than [`ItemId::synthetic`]: id-less items
    /// are never matched across sides, so the two sides must never collide
    /// on a path.
    pub fn synthetic_baseline(field: &str, ordinal: usize) -> Self {
        Self(format!("{SYNTHETIC_PREFIX}{field}@{ordinal}"))
    }

    /// Returns `true` if this id was assigned by the diff engine rather
    /// than carried by the item itself.
    pub fn is_synthetic(&self) -> bool {
        self.0.starts_with(SYNTHETIC_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_user_ids_are_unique() {
        let a = UserId::ephemeral();
        let b = UserId::ephemeral();
        assert_ne!(a, b);
    }

    #[test]
    fn ephemeral_user_id_format() {
        let id = UserId::ephemeral();
        assert!(id.as_str().starts_with("user-"));
        assert_eq!(id.as_str().len(), 5 + 16); // "user-" + 16 hex chars
    }

    #[test]
    fn generated_item_ids_are_unique_and_ordered() {
        let a = ItemId::generate();
        let b = ItemId::generate();
        assert_ne!(a, b);
        assert!(a < b); // UUID v7 is time-ordered
    }

    #[test]
    fn synthetic_id_is_deterministic() {
        let a = ItemId::synthetic("immobili", 2);
        let b = ItemId::synthetic("immobili", 2);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "~immobili#2");
    }

    #[test]
    fn synthetic_sides_never_collide() {
        let proposed = ItemId::synthetic("conti", 0);
        let baseline = ItemId::synthetic_baseline("conti", 0);
        assert_ne!(proposed, baseline);
        assert_eq!(baseline.as_str(), "~conti@0");
    }

    #[test]
    fn synthetic_detection() {
        assert!(ItemId::synthetic("conti", 0).is_synthetic());
        assert!(ItemId::synthetic_baseline("conti", 1).is_synthetic());
        assert!(!ItemId::new("cf-1").is_synthetic());
        assert!(!ItemId::generate().is_synthetic());
    }

    #[test]
    fn serde_roundtrip_as_plain_string() {
        let id = ItemId::new("cf-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"cf-1\"");
        let parsed: ItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
