#![allow(dead_code)]

use async_trait::async_trait;
use secmap_fetcher::{CompanyFetcher, FetchError};
use secmap_protocol::{CikQuery, Company, CompanyDescriptor, CorpusSnapshot};
use secmap_store::{SearchStore, StoreError, StoreStats};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub fn descriptor(cik: u64, ticker: &str, name: &str) -> CompanyDescriptor {
    CompanyDescriptor {
        cik: CikQuery::Number(cik),
        ticker: ticker.to_string(),
        name: name.to_string(),
    }
}

pub fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// Snapshot stamped "now", so it reads as fresh under any sane horizon.
pub fn snapshot(entries: &[(u64, &str, &str)]) -> CorpusSnapshot {
    CorpusSnapshot::new(
        entries
            .iter()
            .map(|(cik, ticker, name)| descriptor(*cik, ticker, name))
            .collect(),
        unix_ms_now(),
    )
}

pub enum FetchPlan {
    Snapshot(CorpusSnapshot),
    Transient,
    Misconfigured,
}

/// Scriptable fetcher double. `load_cached` always misses, so every load
/// goes through `fetch` and the `fetches` counter observes it.
pub struct StubFetcher {
    plan: Mutex<FetchPlan>,
    pub fetches: AtomicUsize,
}

impl StubFetcher {
    pub fn with_snapshot(snapshot: CorpusSnapshot) -> Self {
        Self {
            plan: Mutex::new(FetchPlan::Snapshot(snapshot)),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn misconfigured() -> Self {
        Self {
            plan: Mutex::new(FetchPlan::Misconfigured),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set_plan(&self, plan: FetchPlan) {
        *self.plan.lock().unwrap() = plan;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompanyFetcher for StubFetcher {
    async fn fetch(&self) -> secmap_fetcher::Result<CorpusSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &*self.plan.lock().unwrap() {
            FetchPlan::Snapshot(snapshot) => Ok(snapshot.clone()),
            FetchPlan::Transient => Err(FetchError::IoError(std::io::Error::other(
                "network unreachable",
            ))),
            FetchPlan::Misconfigured => {
                Err(FetchError::Configuration("contact e-mail missing".into()))
            }
        }
    }

    async fn load_cached(&self, _max_age: Duration) -> Option<CorpusSnapshot> {
        None
    }

    async fn clear(&self) -> secmap_fetcher::Result<()> {
        Ok(())
    }
}

/// In-memory store double with a failure switch and a query counter.
///
/// Query semantics are deliberately simple: case-insensitive substring for
/// ranked queries (ties by ticker), exact keys for bulk queries. That is
/// enough to observe tiering, dedup, and fallback behavior.
#[derive(Default)]
pub struct StubStore {
    companies: Mutex<Vec<Company>>,
    pub fail: AtomicBool,
    pub queries: AtomicUsize,
}

impl StubStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn companies(&self) -> Result<Vec<Company>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::IoError(std::io::Error::other("store offline")));
        }
        Ok(self.companies.lock().unwrap().clone())
    }
}

#[async_trait]
impl SearchStore for StubStore {
    async fn rebuild(&self, snapshot: &CorpusSnapshot) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::IoError(std::io::Error::other("store offline")));
        }
        *self.companies.lock().unwrap() = snapshot
            .descriptors
            .iter()
            .filter_map(|descriptor| descriptor.normalize())
            .collect();
        Ok(())
    }

    async fn query_ranked(
        &self,
        query: &str,
        limit: usize,
        _fuzzy: bool,
    ) -> Result<Vec<Company>, StoreError> {
        let query_lower = query.to_lowercase();
        let mut matches: Vec<Company> = self
            .companies()?
            .into_iter()
            .filter(|c| {
                c.ticker.to_lowercase().contains(&query_lower)
                    || c.name.to_lowercase().contains(&query_lower)
            })
            .collect();
        matches.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn query_ranked_names(
        &self,
        query: &str,
        limit: usize,
        _fuzzy: bool,
    ) -> Result<Vec<Company>, StoreError> {
        let query_lower = query.to_lowercase();
        let mut matches: Vec<Company> = self
            .companies()?
            .into_iter()
            .filter(|c| c.name.to_lowercase().contains(&query_lower))
            .collect();
        matches.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn ciks_bulk(&self, ciks: &[u64]) -> Result<HashMap<u64, Vec<Company>>, StoreError> {
        let companies = self.companies()?;
        let mut results: HashMap<u64, Vec<Company>> =
            ciks.iter().map(|cik| (*cik, Vec::new())).collect();
        for company in companies {
            if let Some(matches) = results.get_mut(&company.cik) {
                matches.push(company);
            }
        }
        Ok(results)
    }

    async fn tickers_bulk(
        &self,
        tickers: &[String],
    ) -> Result<HashMap<String, Vec<Company>>, StoreError> {
        let companies = self.companies()?;
        let mut results: HashMap<String, Vec<Company>> = tickers
            .iter()
            .map(|ticker| (ticker.clone(), Vec::new()))
            .collect();
        for company in companies {
            if let Some(matches) = results.get_mut(&company.ticker) {
                matches.push(company);
            }
        }
        Ok(results)
    }

    async fn names_bulk(
        &self,
        names: &[String],
        fuzzy: bool,
    ) -> Result<HashMap<String, Vec<Company>>, StoreError> {
        let companies = self.companies()?;
        let mut results = HashMap::new();
        for name in names {
            let name_lower = name.trim().to_lowercase();
            let mut matches: Vec<Company> = companies
                .iter()
                .filter(|c| {
                    let indexed = c.name.to_lowercase();
                    if fuzzy {
                        indexed.contains(&name_lower)
                    } else {
                        indexed == name_lower
                    }
                })
                .cloned()
                .collect();
            matches.sort_by(|a, b| a.ticker.cmp(&b.ticker));
            results.insert(name.clone(), matches);
        }
        Ok(results)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let companies = self.companies()?;
        Ok(StoreStats {
            exists: true,
            companies: companies.len(),
        })
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.companies.lock().unwrap().clear();
        Ok(())
    }
}
