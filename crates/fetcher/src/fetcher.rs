use crate::config::FetchConfig;
use crate::error::Result;
use async_trait::async_trait;
use secmap_protocol::{CompanyDescriptor, CorpusSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Upstream location of the full company/ticker corpus.
pub const SEC_DATA_URL: &str = "https://www.sec.gov/files/company_tickers.json";

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Contract the cache lifecycle consumes for corpus acquisition.
#[async_trait]
pub trait CompanyFetcher: Send + Sync {
    /// Produce a corpus snapshot, preferring a fresh download.
    async fn fetch(&self) -> Result<CorpusSnapshot>;

    /// Return the on-disk snapshot if one exists and is younger than
    /// `max_age`, without touching the network.
    async fn load_cached(&self, max_age: Duration) -> Option<CorpusSnapshot>;

    /// Remove the on-disk snapshot.
    async fn clear(&self) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSnapshot {
    schema_version: u32,
    fetched_unix_ms: u64,
    descriptors: Vec<CompanyDescriptor>,
}

/// HTTP fetcher for the SEC dataset with a local snapshot cache.
///
/// Downloads land on disk before they are returned, so a later run (or a
/// failed refresh) can fall back to the last good snapshot.
pub struct SecFetcher {
    config: FetchConfig,
    snapshot_path: PathBuf,
    client: reqwest::Client,
}

impl SecFetcher {
    pub fn new(config: FetchConfig, snapshot_path: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            config,
            snapshot_path: snapshot_path.into(),
            client,
        })
    }

    async fn download(&self) -> Result<CorpusSnapshot> {
        let user_agent = self.config.user_agent()?;
        log::info!("Downloading SEC company data from {SEC_DATA_URL}");

        let entries: HashMap<String, CompanyDescriptor> = self
            .client
            .get(SEC_DATA_URL)
            .header(reqwest::header::USER_AGENT, user_agent)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let snapshot = CorpusSnapshot::new(ordered_descriptors(entries), unix_ms_now());
        log::info!("Downloaded {} company descriptors", snapshot.len());
        self.save_snapshot(&snapshot).await?;
        Ok(snapshot)
    }

    async fn save_snapshot(&self, snapshot: &CorpusSnapshot) -> Result<()> {
        if let Some(parent) = self.snapshot_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let persisted = PersistedSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            fetched_unix_ms: snapshot.fetched_unix_ms,
            descriptors: snapshot.descriptors.clone(),
        };
        let bytes = serde_json::to_vec(&persisted)?;
        let tmp = self.snapshot_path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.snapshot_path).await?;
        Ok(())
    }

    /// Read the persisted snapshot regardless of age. Corrupt or
    /// wrong-version files are treated as absent.
    async fn read_snapshot(&self) -> Option<CorpusSnapshot> {
        let bytes = tokio::fs::read(&self.snapshot_path).await.ok()?;
        let persisted: PersistedSnapshot = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => {
                log::warn!(
                    "Snapshot cache corrupted at {}: {err}",
                    self.snapshot_path.display()
                );
                return None;
            }
        };
        if persisted.schema_version != SNAPSHOT_SCHEMA_VERSION {
            log::warn!(
                "Ignoring snapshot cache with schema_version {}",
                persisted.schema_version
            );
            return None;
        }
        Some(CorpusSnapshot::new(
            persisted.descriptors,
            persisted.fetched_unix_ms,
        ))
    }
}

#[async_trait]
impl CompanyFetcher for SecFetcher {
    async fn fetch(&self) -> Result<CorpusSnapshot> {
        match self.download().await {
            Ok(snapshot) => Ok(snapshot),
            // Configuration errors re-raise unchanged; retrying or serving a
            // stale file cannot fix a missing contact identity.
            Err(err @ crate::FetchError::Configuration(_)) => Err(err),
            Err(err) => {
                log::error!("Failed to download SEC data: {err}");
                if let Some(snapshot) = self.read_snapshot().await {
                    log::info!("Serving previously downloaded snapshot instead");
                    return Ok(snapshot);
                }
                Err(err)
            }
        }
    }

    async fn load_cached(&self, max_age: Duration) -> Option<CorpusSnapshot> {
        let snapshot = self.read_snapshot().await?;
        let age_ms = unix_ms_now().saturating_sub(snapshot.fetched_unix_ms);
        let max_age_ms = u64::try_from(max_age.as_millis()).unwrap_or(u64::MAX);
        if age_ms > max_age_ms {
            return None;
        }
        Some(snapshot)
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.snapshot_path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Order descriptors by their numeric source id, so rebuilds from the same
/// payload are deterministic. Non-numeric ids sort lexically after a parse
/// failure.
fn ordered_descriptors(entries: HashMap<String, CompanyDescriptor>) -> Vec<CompanyDescriptor> {
    let mut entries: Vec<(String, CompanyDescriptor)> = entries.into_iter().collect();
    entries.sort_by(|a, b| match (a.0.parse::<u64>(), b.0.parse::<u64>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        _ => a.0.cmp(&b.0),
    });
    entries.into_iter().map(|(_, descriptor)| descriptor).collect()
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
