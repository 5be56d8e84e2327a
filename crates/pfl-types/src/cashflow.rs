use std::fmt;

use serde::{Deserialize, Serialize};

use crate::temporal::CanonicalDate;

/// Recurrence of a cashflow schedule.
///
/// Frequencies arrive as free-form strings from stored state. Recognized
/// labels map to a closed set; anything else is preserved verbatim in
/// [`Frequency::Unknown`] so an unrecognized spelling survives a
/// load/store round-trip. An unknown frequency advances like a monthly
/// one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Semiannual,
    Yearly,
    /// Fires a single time, then the schedule goes dormant.
    Once,
    /// Unrecognized label, kept verbatim.
    Unknown(String),
}

impl Frequency {
    /// The canonical label, or the verbatim label for unknown values.
    pub fn label(&self) -> &str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Semiannual => "semiannual",
            Self::Yearly => "yearly",
            Self::Once => "once",
            Self::Unknown(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// The next occurrence date after one firing on `from`.
    ///
    /// `Once` yields `None`: the schedule never fires again. Unknown
    /// frequencies fall back to monthly advancement.
    pub fn advance_date(&self, from: CanonicalDate) -> Option<CanonicalDate> {
        match self {
            Self::Monthly | Self::Unknown(_) => from.plus_months(1),
            Self::Quarterly => from.plus_months(3),
            Self::Semiannual => from.plus_months(6),
            Self::Yearly => from.plus_months(12),
            Self::Once => None,
        }
    }
}

impl From<String> for Frequency {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Self::Monthly,
            "quarterly" => Self::Quarterly,
            "semiannual" | "semiannually" => Self::Semiannual,
            "yearly" | "annual" | "annually" => Self::Yearly,
            "once" | "one-time" => Self::Once,
            _ => Self::Unknown(s),
        }
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        match f {
            Frequency::Unknown(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Income or expense classification of a cashflow.
///
/// Strict on the wire: an unrecognized kind makes the embedding record
/// malformed, unlike [`Frequency`] which degrades gracefully.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashflowKind {
    Income,
    Expense,
}

impl CashflowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for CashflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
