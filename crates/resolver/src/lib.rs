//! # secmap Resolver
//!
//! Identity-resolution core: resolves tickers, CIK filer numbers, and
//! free-text company names against an in-memory entity index, with a
//! persistent store as the slower full-corpus tier and deterministic fuzzy
//! matching for names.
//!
//! The [`CompanyService`] owns the cache lifecycle: it loads the corpus on
//! first use, refreshes it when the snapshot outlives the expiry horizon,
//! and swaps replacement indexes atomically so concurrent readers never see
//! a half-built index.

mod batch;
mod error;
mod index;
mod resolve;
mod search;
mod service;

pub use error::{ResolveError, Result};
pub use index::EntityIndex;
pub use resolve::{resolve_any, resolve_cik, resolve_name, resolve_ticker};
pub use service::{CacheInfo, CompanyService, DEFAULT_EXPIRY};

// Re-export the shared data model for convenience.
pub use secmap_protocol::{CikQuery, Company, ErrorCode, LookupOutcome};
