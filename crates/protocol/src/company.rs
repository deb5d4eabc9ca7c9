use crate::identifier::{normalize_cik, CikQuery};
use serde::{Deserialize, Serialize};

/// One resolved company record: the unit every lookup returns.
///
/// Multiple records may share a CIK (distinct share classes) or a display
/// name (distinct legal entities); tickers are expected unique per snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Company {
    pub cik: u64,
    pub ticker: String,
    pub name: String,
}

impl Company {
    /// Dedup key used by ranked search when merging result tiers.
    #[must_use]
    pub fn dedup_key(&self) -> (u64, String) {
        (self.cik, self.ticker.clone())
    }
}

/// A raw company entry as it appears in the upstream dataset, before
/// validation. Field names follow the SEC `company_tickers.json` layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyDescriptor {
    #[serde(rename = "cik_str")]
    pub cik: CikQuery,
    pub ticker: String,
    #[serde(rename = "title")]
    pub name: String,
}

impl CompanyDescriptor {
    /// Validate and canonicalize into a `Company`.
    ///
    /// Returns `None` when the CIK does not normalize or when ticker or name
    /// is blank after trimming; such descriptors are silently dropped during
    /// index and store construction.
    #[must_use]
    pub fn normalize(&self) -> Option<Company> {
        let cik = normalize_cik(&self.cik)?;
        let ticker = self.ticker.trim();
        let name = self.name.trim();
        if ticker.is_empty() || name.is_empty() {
            return None;
        }
        Some(Company {
            cik,
            ticker: ticker.to_uppercase(),
            name: name.to_string(),
        })
    }
}

/// One immutable generation of the full corpus, loaded at a point in time.
///
/// Descriptor order is whatever order the source iterates; index construction
/// relies on it only for deterministic tie-breaking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSnapshot {
    pub descriptors: Vec<CompanyDescriptor>,
    pub fetched_unix_ms: u64,
}

impl CorpusSnapshot {
    #[must_use]
    pub fn new(descriptors: Vec<CompanyDescriptor>, fetched_unix_ms: u64) -> Self {
        Self {
            descriptors,
            fetched_unix_ms,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
