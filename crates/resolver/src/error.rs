use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Error, Debug)]
pub enum ResolveError {
    /// Missing or invalid upstream contact identity. Propagated unchanged
    /// and never retried: retrying cannot fix it.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No company data could be loaded and no previous snapshot exists.
    #[error("Company data unavailable: {0}")]
    Unavailable(String),
}
