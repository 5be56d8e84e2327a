use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The asset collections the scheduler and sync router know how to walk.
///
/// A closed set: the collection tags under the assets section are part of
/// the state contract, not free-form data. Legacy spellings resolve
/// through [`AssetKind::resolve`]; a tag outside the set is an error the
/// caller handles (typically by falling back to a full scan).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Real estate holdings.
    Immobili,
    /// Current and deposit accounts.
    Conti,
    /// Investment positions.
    Investimenti,
    /// Pension and retirement funds.
    Previdenza,
}

impl AssetKind {
    /// Every known kind, in collection-walk order.
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Immobili,
        AssetKind::Conti,
        AssetKind::Investimenti,
        AssetKind::Previdenza,
    ];

    /// The collection key under the assets section.
    pub fn canonical_tag(&self) -> &'static str {
        match self {
            Self::Immobili => "immobili",
            Self::Conti => "conti",
            Self::Investimenti => "investimenti",
            Self::Previdenza => "previdenza",
        }
    }

    /// Resolve a raw tag, normalizing legacy spellings.
    pub fn resolve(tag: &str) -> Result<Self, TypeError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "immobili" | "immobile" => Ok(Self::Immobili),
            "conti" | "conto" | "depositi" | "deposito" => Ok(Self::Conti),
            "investimenti" | "investimento" => Ok(Self::Investimenti),
            "previdenza" | "fondi" | "pensione" => Ok(Self::Previdenza),
            _ => Err(TypeError::UnknownAssetKind(tag.to_string())),
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_tag())
    }
}
