use std::path::{Path, PathBuf};

/// Default cache directory: `~/.secmap`, falling back to the working
/// directory when no home directory is resolvable.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    dirs::home_dir()
        .map_or_else(|| PathBuf::from("."), |home| home.join(".secmap"))
}

#[must_use]
pub fn snapshot_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("company_data.json")
}

#[must_use]
pub fn store_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("companies.json")
}
