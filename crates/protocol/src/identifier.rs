use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw CIK as a caller supplies it: either a native integer or a string
/// that still needs normalizing.
///
/// Dispatch happens by pattern match on this union; callers never branch on
/// runtime type inspection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CikQuery {
    Number(u64),
    Text(String),
}

impl From<u64> for CikQuery {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CikQuery {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CikQuery {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for CikQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Normalize a raw CIK to its integer form.
///
/// Native integers pass through unchanged; 0 is a legitimate CIK when it
/// arrives as `Number(0)`. Strings have leading zeros stripped and must leave
/// a non-empty run of ASCII digits, so `"0"` (and `"000"`) strip down to
/// nothing and fail. The integer/string asymmetry around zero is intentional,
/// preserved behavior.
#[must_use]
pub fn normalize_cik(raw: &CikQuery) -> Option<u64> {
    match raw {
        CikQuery::Number(value) => Some(*value),
        CikQuery::Text(text) => {
            let stripped = text.trim_start_matches('0');
            if stripped.is_empty() || !stripped.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            stripped.parse().ok()
        }
    }
}
