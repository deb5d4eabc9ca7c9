use crate::index::EntityIndex;
use crate::resolve::resolve_name;
use secmap_protocol::Company;
use secmap_store::SearchStore;
use std::collections::HashSet;

type DedupKey = (u64, String);

fn push_unique(
    results: &mut Vec<Company>,
    seen: &mut HashSet<DedupKey>,
    company: Company,
    limit: usize,
) {
    if results.len() >= limit {
        return;
    }
    if seen.insert(company.dedup_key()) {
        results.push(company);
    }
}

/// Ranked search across tickers and names.
///
/// Exact ticker hit first, exact name hits next, then the persistent store's
/// ranked tiers; everything merges with `(cik, ticker)` dedup and truncates
/// to `limit`. A store failure degrades to an in-memory substring scan.
pub(crate) async fn search_companies(
    index: &EntityIndex,
    store: &dyn SearchStore,
    query: &str,
    limit: usize,
    fuzzy: bool,
) -> Vec<Company> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut results = Vec::new();
    let mut seen = HashSet::new();

    // Exact ticker hit always ranks first.
    if let Some(company) = index.lookup_by_ticker(trimmed) {
        seen.insert(company.dedup_key());
        results.push(company.clone());
    }

    // Exact name hits follow, in insertion order.
    for company in index.lookup_by_name_exact(trimmed) {
        if seen.insert(company.dedup_key()) {
            results.push(company.clone());
        }
    }

    if results.len() < limit || fuzzy {
        match store.query_ranked(trimmed, limit, fuzzy).await {
            Ok(ranked) => {
                for company in ranked {
                    push_unique(&mut results, &mut seen, company, limit);
                }
            }
            Err(err) => {
                log::warn!("Persistent search failed, falling back to memory scan: {err}");
                for company in memory_scan(index, trimmed, fuzzy) {
                    push_unique(&mut results, &mut seen, company, limit);
                }
            }
        }
    }

    results.truncate(limit);
    results
}

/// Ranked search restricted to company names.
pub(crate) async fn search_companies_by_name(
    index: &EntityIndex,
    store: &dyn SearchStore,
    query: &str,
    limit: usize,
    fuzzy: bool,
) -> Vec<Company> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut results = Vec::new();
    let mut seen = HashSet::new();

    for company in index.lookup_by_name_exact(trimmed) {
        if seen.insert(company.dedup_key()) {
            results.push(company.clone());
        }
    }

    if results.len() < limit || fuzzy {
        match store.query_ranked_names(trimmed, limit, fuzzy).await {
            Ok(ranked) => {
                for company in ranked {
                    push_unique(&mut results, &mut seen, company, limit);
                }
            }
            Err(err) => {
                log::warn!("Persistent name search failed, falling back to memory: {err}");
                // The single-identifier name path stands in for the ranked
                // store: at most its one best match joins the results.
                if let Some(company) = resolve_name(index, trimmed, fuzzy).into_data() {
                    push_unique(&mut results, &mut seen, company, limit);
                }
            }
        }
    }

    results.truncate(limit);
    results
}

/// In-memory substring fallback: tickers scanned before names, both in
/// insertion order. Non-fuzzy mode adds nothing beyond the exact tiers the
/// caller already collected.
fn memory_scan(index: &EntityIndex, query: &str, fuzzy: bool) -> Vec<Company> {
    if !fuzzy {
        return Vec::new();
    }
    let query_lower = query.to_lowercase();
    let mut matches = Vec::new();

    for company in index.records() {
        if company.ticker.to_lowercase().contains(&query_lower) {
            matches.push(company.clone());
        }
    }
    for company in index.records() {
        if company.name.to_lowercase().contains(&query_lower) {
            matches.push(company.clone());
        }
    }

    matches
}
