use crate::error::{Result, StoreError};
use crate::ranked::rank_companies;
use async_trait::async_trait;
use secmap_protocol::{Company, CorpusSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const COMPANY_STORE_SCHEMA_VERSION: u32 = 1;

/// Contract the resolver consumes for the persistent query path.
///
/// Any method may fail with a recoverable [`StoreError`]; callers are
/// expected to fall back to their in-memory paths, never to treat a store
/// failure as fatal.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Replace the store contents with the companies of `snapshot`.
    async fn rebuild(&self, snapshot: &CorpusSnapshot) -> Result<()>;

    /// Ranked ticker-or-name search: exact, then prefix, then substring,
    /// ties by ascending ticker. Non-fuzzy keeps the exact tier only.
    async fn query_ranked(&self, query: &str, limit: usize, fuzzy: bool) -> Result<Vec<Company>>;

    /// Ranked search restricted to company names.
    async fn query_ranked_names(
        &self,
        query: &str,
        limit: usize,
        fuzzy: bool,
    ) -> Result<Vec<Company>>;

    /// Bulk CIK lookup. Every requested key is present in the result,
    /// mapped to an empty list when nothing matches.
    async fn ciks_bulk(&self, ciks: &[u64]) -> Result<HashMap<u64, Vec<Company>>>;

    /// Bulk ticker lookup; keys are expected pre-uppercased.
    async fn tickers_bulk(&self, tickers: &[String]) -> Result<HashMap<String, Vec<Company>>>;

    /// Bulk name lookup, exact or fuzzy per name, best matches first.
    async fn names_bulk(
        &self,
        names: &[String],
        fuzzy: bool,
    ) -> Result<HashMap<String, Vec<Company>>>;

    async fn stats(&self) -> Result<StoreStats>;

    /// Drop the persisted contents entirely.
    async fn clear(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub exists: bool,
    pub companies: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCompanies {
    schema_version: u32,
    companies: Vec<Company>,
}

/// JSON-file-backed [`SearchStore`].
///
/// Contents are read per query, so the store always answers from the last
/// durably written generation no matter which process rebuilt it.
pub struct CompanyStore {
    path: PathBuf,
}

impl CompanyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_companies(&self) -> Result<Vec<Company>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let persisted: PersistedCompanies = serde_json::from_slice(&bytes)?;
        if persisted.schema_version != COMPANY_STORE_SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                found: persisted.schema_version,
                expected: COMPANY_STORE_SCHEMA_VERSION,
            });
        }
        Ok(persisted.companies)
    }

    async fn save_companies(&self, companies: Vec<Company>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let persisted = PersistedCompanies {
            schema_version: COMPANY_STORE_SCHEMA_VERSION,
            companies,
        };
        let bytes = serde_json::to_vec(&persisted)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SearchStore for CompanyStore {
    async fn rebuild(&self, snapshot: &CorpusSnapshot) -> Result<()> {
        let companies: Vec<Company> = snapshot
            .descriptors
            .iter()
            .filter_map(|descriptor| descriptor.normalize())
            .collect();
        let count = companies.len();
        self.save_companies(companies).await?;
        log::info!(
            "Rebuilt company store at {} with {count} companies",
            self.path.display()
        );
        Ok(())
    }

    async fn query_ranked(&self, query: &str, limit: usize, fuzzy: bool) -> Result<Vec<Company>> {
        let companies = self.load_companies().await?;
        Ok(rank_companies(&companies, query, limit, fuzzy, false))
    }

    async fn query_ranked_names(
        &self,
        query: &str,
        limit: usize,
        fuzzy: bool,
    ) -> Result<Vec<Company>> {
        let companies = self.load_companies().await?;
        Ok(rank_companies(&companies, query, limit, fuzzy, true))
    }

    async fn ciks_bulk(&self, ciks: &[u64]) -> Result<HashMap<u64, Vec<Company>>> {
        let companies = self.load_companies().await?;
        let mut results: HashMap<u64, Vec<Company>> =
            ciks.iter().map(|cik| (*cik, Vec::new())).collect();
        for company in companies {
            if let Some(matches) = results.get_mut(&company.cik) {
                matches.push(company);
            }
        }
        for matches in results.values_mut() {
            matches.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        }
        Ok(results)
    }

    async fn tickers_bulk(&self, tickers: &[String]) -> Result<HashMap<String, Vec<Company>>> {
        let companies = self.load_companies().await?;
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
    ) -> Result<HashMap<String, Vec<Company>>> {
        let companies = self.load_companies().await?;
        let mut results = HashMap::with_capacity(names.len());
        for name in names {
            let matches = rank_companies(&companies, name, usize::MAX, fuzzy, true);
            results.insert(name.clone(), matches);
        }
        Ok(results)
    }

    async fn stats(&self) -> Result<StoreStats> {
        if !self.path.exists() {
            return Ok(StoreStats {
                exists: false,
                companies: 0,
            });
        }
        let companies = self.load_companies().await?;
        Ok(StoreStats {
            exists: true,
            companies: companies.len(),
        })
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
