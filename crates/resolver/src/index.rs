use secmap_protocol::{Company, CorpusSnapshot};
use std::collections::HashMap;

/// In-memory lookup cache built once per corpus snapshot.
///
/// Each company is stored once in `records` and referenced by its insertion
/// position; the three maps point back into that store. The index is
/// read-only after construction, so concurrent readers share it freely.
#[derive(Debug, Default)]
pub struct EntityIndex {
    records: Vec<Company>,
    by_ticker: HashMap<String, usize>,
    by_cik: HashMap<u64, Vec<usize>>,
    by_name: HashMap<String, Vec<usize>>,
}

impl EntityIndex {
    /// Build the index from a snapshot, silently dropping descriptors that
    /// fail validation.
    #[must_use]
    pub fn build(snapshot: &CorpusSnapshot) -> Self {
        let mut index = Self::default();

        for descriptor in &snapshot.descriptors {
            let Some(company) = descriptor.normalize() else {
                continue;
            };
            let id = index.records.len();

            // One-to-one: a colliding ticker silently points at the last
            // descriptor carrying it.
            index.by_ticker.insert(company.ticker.clone(), id);
            index.by_cik.entry(company.cik).or_default().push(id);
            index
                .by_name
                .entry(company.name.to_lowercase())
                .or_default()
                .push(id);
            index.records.push(company);
        }

        let multi_cik = index.by_cik.values().filter(|ids| ids.len() > 1).count();
        let multi_name = index.by_name.values().filter(|ids| ids.len() > 1).count();
        log::info!(
            "Indexed {} companies ({multi_cik} CIKs and {multi_name} names with multiple listings)",
            index.records.len()
        );

        index
    }

    /// Exact ticker lookup, case-insensitive on the input.
    #[must_use]
    pub fn lookup_by_ticker(&self, ticker: &str) -> Option<&Company> {
        let id = self.by_ticker.get(&ticker.trim().to_uppercase())?;
        Some(&self.records[*id])
    }

    /// All records filed under a CIK, in insertion order.
    #[must_use]
    pub fn lookup_by_cik(&self, cik: u64) -> Vec<&Company> {
        self.by_cik
            .get(&cik)
            .map(|ids| ids.iter().map(|id| &self.records[*id]).collect())
            .unwrap_or_default()
    }

    /// Case-insensitive exact name lookup, in insertion order.
    #[must_use]
    pub fn lookup_by_name_exact(&self, name: &str) -> Vec<&Company> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .map(|ids| ids.iter().map(|id| &self.records[*id]).collect())
            .unwrap_or_default()
    }

    /// All records in insertion order, for substring scans.
    #[must_use]
    pub(crate) fn records(&self) -> &[Company] {
        &self.records
    }

    /// Indexed (lowercased name, record ids) entries, for the fuzzy scan.
    pub(crate) fn name_entries(&self) -> impl Iterator<Item = (&String, &Vec<usize>)> {
        self.by_name.iter()
    }

    pub(crate) fn record(&self, id: usize) -> &Company {
        &self.records[id]
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn tickers_indexed(&self) -> usize {
        self.by_ticker.len()
    }

    #[must_use]
    pub fn ciks_indexed(&self) -> usize {
        self.by_cik.len()
    }

    #[must_use]
    pub fn names_indexed(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
