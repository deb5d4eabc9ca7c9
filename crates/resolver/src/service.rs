use crate::batch;
use crate::error::{ResolveError, Result};
use crate::index::EntityIndex;
use crate::resolve;
use crate::search;
use arc_swap::ArcSwapOption;
use secmap_fetcher::{CompanyFetcher, FetchError};
use secmap_protocol::{CikQuery, Company, CorpusSnapshot, LookupOutcome};
use secmap_store::{SearchStore, StoreStats};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// How long a loaded snapshot stays fresh before `ensure_loaded` refreshes.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// Cache introspection for operators.
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub companies_cached: usize,
    pub tickers_indexed: usize,
    pub ciks_indexed: usize,
    pub names_indexed: usize,
    pub loaded_unix_ms: u64,
    pub age_ms: u64,
    pub expired: bool,
    pub store: StoreStats,
}

struct LoadedIndex {
    index: EntityIndex,
    loaded_unix_ms: u64,
}

/// Cache lifecycle owner and public resolution surface.
///
/// Readers take a lock-free reference to the current index; refreshes
/// serialize behind a mutex and install a fully built replacement in one
/// atomic swap, so a reader never observes a half-built index. A failed
/// refresh keeps the previous snapshot in service and surfaces only to the
/// explicit [`CompanyService::refresh`] caller.
pub struct CompanyService {
    fetcher: Arc<dyn CompanyFetcher>,
    store: Arc<dyn SearchStore>,
    current: ArcSwapOption<LoadedIndex>,
    refresh_lock: Mutex<()>,
    expiry: Duration,
}

impl CompanyService {
    pub fn new(fetcher: Arc<dyn CompanyFetcher>, store: Arc<dyn SearchStore>) -> Self {
        Self::with_expiry(fetcher, store, DEFAULT_EXPIRY)
    }

    pub fn with_expiry(
        fetcher: Arc<dyn CompanyFetcher>,
        store: Arc<dyn SearchStore>,
        expiry: Duration,
    ) -> Self {
        Self {
            fetcher,
            store,
            current: ArcSwapOption::empty(),
            refresh_lock: Mutex::new(()),
            expiry,
        }
    }

    /// Sole gate every entry point passes: loads on first use, refreshes
    /// when stale, and keeps serving the prior snapshot if a refresh fails.
    async fn ensure_loaded(&self) -> Result<Arc<LoadedIndex>> {
        if let Some(current) = self.current.load_full() {
            if !is_expired(current.loaded_unix_ms, unix_ms_now(), self.expiry) {
                return Ok(current);
            }
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited on the lock.
        if let Some(current) = self.current.load_full() {
            if !is_expired(current.loaded_unix_ms, unix_ms_now(), self.expiry) {
                return Ok(current);
            }
        }

        match self.load_snapshot().await {
            Ok(loaded) => Ok(loaded),
            Err(err @ ResolveError::Configuration(_)) => Err(err),
            Err(err) => match self.current.load_full() {
                Some(current) => {
                    log::warn!("Refresh failed, serving stale snapshot: {err}");
                    Ok(current)
                }
                None => Err(err),
            },
        }
    }

    /// Load path behind the refresh lock: a fresh on-disk snapshot wins
    /// over a download.
    async fn load_snapshot(&self) -> Result<Arc<LoadedIndex>> {
        if let Some(snapshot) = self.fetcher.load_cached(self.expiry).await {
            log::info!("Loaded company snapshot from disk cache");
            return Ok(self.install(snapshot));
        }
        self.update().await
    }

    /// Full refresh: fetch, rebuild the persistent store, swap the index.
    async fn update(&self) -> Result<Arc<LoadedIndex>> {
        let snapshot = self.fetcher.fetch().await.map_err(map_fetch_error)?;
        if let Err(err) = self.store.rebuild(&snapshot).await {
            // The memory index still answers everything; only the
            // persistent tier is degraded until the next rebuild.
            log::warn!("Persistent store rebuild failed: {err}");
        }
        Ok(self.install(snapshot))
    }

    fn install(&self, snapshot: CorpusSnapshot) -> Arc<LoadedIndex> {
        let loaded = Arc::new(LoadedIndex {
            index: EntityIndex::build(&snapshot),
            loaded_unix_ms: snapshot.fetched_unix_ms,
        });
        self.current.store(Some(Arc::clone(&loaded)));
        loaded
    }

    /// Single ticker lookup, collapsed to an optional record.
    pub async fn resolve_ticker(&self, ticker: &str) -> Result<Option<Company>> {
        Ok(self.lookup_ticker(ticker).await?.into_data())
    }

    /// Single ticker lookup with the structured outcome retained.
    pub async fn lookup_ticker(&self, ticker: &str) -> Result<LookupOutcome<Company>> {
        let loaded = self.ensure_loaded().await?;
        Ok(resolve::resolve_ticker(&loaded.index, ticker))
    }

    /// Single CIK lookup: every record filed under the CIK, or empty.
    pub async fn resolve_cik(&self, cik: impl Into<CikQuery>) -> Result<Vec<Company>> {
        Ok(self.lookup_cik(cik).await?.into_data().unwrap_or_default())
    }

    /// Single CIK lookup with the structured outcome retained.
    pub async fn lookup_cik(&self, cik: impl Into<CikQuery>) -> Result<LookupOutcome<Vec<Company>>> {
        let loaded = self.ensure_loaded().await?;
        Ok(resolve::resolve_cik(&loaded.index, &cik.into()))
    }

    /// Single name lookup, collapsed to an optional best match.
    pub async fn resolve_name(&self, name: &str, fuzzy: bool) -> Result<Option<Company>> {
        Ok(self.lookup_name(name, fuzzy).await?.into_data())
    }

    /// Single name lookup with the structured outcome retained.
    pub async fn lookup_name(&self, name: &str, fuzzy: bool) -> Result<LookupOutcome<Company>> {
        let loaded = self.ensure_loaded().await?;
        Ok(resolve::resolve_name(&loaded.index, name, fuzzy))
    }

    /// Type-inferring lookup across the CIK, ticker, and name paths.
    pub async fn resolve_any(&self, identifier: impl Into<CikQuery>) -> Result<Vec<Company>> {
        let loaded = self.ensure_loaded().await?;
        Ok(resolve::resolve_any(&loaded.index, &identifier.into()))
    }

    /// Ranked search across tickers and names.
    pub async fn search(&self, query: &str, limit: usize, fuzzy: bool) -> Result<Vec<Company>> {
        let loaded = self.ensure_loaded().await?;
        Ok(search::search_companies(&loaded.index, self.store.as_ref(), query, limit, fuzzy).await)
    }

    /// Ranked search restricted to company names.
    pub async fn search_names(
        &self,
        query: &str,
        limit: usize,
        fuzzy: bool,
    ) -> Result<Vec<Company>> {
        let loaded = self.ensure_loaded().await?;
        Ok(
            search::search_companies_by_name(
                &loaded.index,
                self.store.as_ref(),
                query,
                limit,
                fuzzy,
            )
            .await,
        )
    }

    /// Batch ticker resolution. Empty input returns an empty map without
    /// touching the store.
    pub async fn resolve_tickers_batch(
        &self,
        tickers: &[String],
    ) -> Result<HashMap<String, LookupOutcome<Company>>> {
        if tickers.is_empty() {
            return Ok(HashMap::new());
        }
        let loaded = self.ensure_loaded().await?;
        Ok(batch::tickers_batch(&loaded.index, self.store.as_ref(), tickers).await)
    }

    /// Batch CIK resolution, multiplicity preserved per key.
    pub async fn resolve_ciks_batch(
        &self,
        ciks: &[CikQuery],
    ) -> Result<HashMap<CikQuery, LookupOutcome<Vec<Company>>>> {
        if ciks.is_empty() {
            return Ok(HashMap::new());
        }
        let loaded = self.ensure_loaded().await?;
        Ok(batch::ciks_batch(&loaded.index, self.store.as_ref(), ciks).await)
    }

    /// Batch name resolution, one best match per name.
    pub async fn resolve_names_batch(
        &self,
        names: &[String],
        fuzzy: bool,
    ) -> Result<HashMap<String, LookupOutcome<Company>>> {
        if names.is_empty() {
            return Ok(HashMap::new());
        }
        let loaded = self.ensure_loaded().await?;
        Ok(batch::names_batch(&loaded.index, self.store.as_ref(), names, fuzzy).await)
    }

    /// Explicit refresh: always downloads, regardless of snapshot age.
    /// This is the one caller that sees a transient refresh failure.
    pub async fn refresh(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;
        self.update().await.map(|_| ())
    }

    /// Drop the in-memory index and both persisted artifacts. The next
    /// lookup starts from an empty cache.
    pub async fn invalidate(&self) {
        let _guard = self.refresh_lock.lock().await;
        self.current.store(None);
        if let Err(err) = self.fetcher.clear().await {
            log::warn!("Failed to remove snapshot cache: {err}");
        }
        if let Err(err) = self.store.clear().await {
            log::warn!("Failed to clear persistent store: {err}");
        }
        log::info!("Cache cleared");
    }

    /// Counts, age, and staleness of the current cache generation.
    pub async fn cache_info(&self) -> Result<CacheInfo> {
        let loaded = self.ensure_loaded().await?;
        let now = unix_ms_now();
        let store = match self.store.stats().await {
            Ok(stats) => stats,
            Err(err) => {
                log::warn!("Store stats unavailable: {err}");
                StoreStats {
                    exists: false,
                    companies: 0,
                }
            }
        };
        Ok(CacheInfo {
            companies_cached: loaded.index.record_count(),
            tickers_indexed: loaded.index.tickers_indexed(),
            ciks_indexed: loaded.index.ciks_indexed(),
            names_indexed: loaded.index.names_indexed(),
            loaded_unix_ms: loaded.loaded_unix_ms,
            age_ms: now.saturating_sub(loaded.loaded_unix_ms),
            expired: is_expired(loaded.loaded_unix_ms, now, self.expiry),
            store,
        })
    }
}

fn map_fetch_error(err: FetchError) -> ResolveError {
    match err {
        FetchError::Configuration(message) => ResolveError::Configuration(message),
        other => ResolveError::Unavailable(other.to_string()),
    }
}

/// Staleness is a pure function of the snapshot's age against the horizon.
fn is_expired(loaded_unix_ms: u64, now_unix_ms: u64, horizon: Duration) -> bool {
    let age_ms = now_unix_ms.saturating_sub(loaded_unix_ms);
    age_ms > u64::try_from(horizon.as_millis()).unwrap_or(u64::MAX)
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_flips_only_past_the_horizon() {
        let horizon = Duration::from_secs(3600);
        let loaded = 1_000_000;
        let ms = |secs: u64| secs * 1000;

        assert!(!is_expired(loaded, loaded, horizon));
        assert!(!is_expired(loaded, loaded + ms(3599), horizon));
        assert!(!is_expired(loaded, loaded + ms(3600), horizon));
        assert!(is_expired(loaded, loaded + ms(3600) + 1, horizon));
    }

    #[test]
    fn clock_going_backwards_reads_as_fresh() {
        assert!(!is_expired(2_000, 1_000, Duration::from_secs(1)));
    }
}
