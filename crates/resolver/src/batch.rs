use crate::index::EntityIndex;
use crate::resolve::{resolve_cik, resolve_name, resolve_ticker};
use secmap_protocol::{normalize_cik, CikQuery, Company, LookupOutcome};
use secmap_store::SearchStore;
use std::collections::HashMap;

/// Batch ticker resolution, keyed by the raw inputs exactly as supplied.
///
/// One bulk store query covers every well-formed ticker; if it fails, each
/// key resolves individually from the in-memory index and the batch still
/// completes.
pub(crate) async fn tickers_batch(
    index: &EntityIndex,
    store: &dyn SearchStore,
    tickers: &[String],
) -> HashMap<String, LookupOutcome<Company>> {
    let mut results = HashMap::new();
    let mut normalized_to_raw: HashMap<String, String> = HashMap::new();

    for raw in tickers {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            results.insert(
                raw.clone(),
                LookupOutcome::invalid_input("Invalid ticker: empty or whitespace"),
            );
        } else {
            normalized_to_raw.insert(trimmed.to_uppercase(), raw.clone());
        }
    }

    if normalized_to_raw.is_empty() {
        return results;
    }
    let normalized: Vec<String> = normalized_to_raw.keys().cloned().collect();

    match store.tickers_bulk(&normalized).await {
        Ok(bulk) => {
            for (ticker, raw) in &normalized_to_raw {
                let outcome = match bulk.get(ticker).and_then(|matches| matches.first()) {
                    Some(company) => LookupOutcome::hit(company.clone()),
                    None => LookupOutcome::not_found(format!("Ticker '{raw}' not found")),
                };
                results.insert(raw.clone(), outcome);
            }
        }
        Err(err) => {
            log::warn!("Bulk ticker lookup failed, resolving from memory: {err}");
            for (ticker, raw) in &normalized_to_raw {
                results.insert(raw.clone(), resolve_ticker(index, ticker));
            }
        }
    }

    results
}

/// Batch CIK resolution. Each key keeps the full list of records filed
/// under it (multiplicity preserved).
pub(crate) async fn ciks_batch(
    index: &EntityIndex,
    store: &dyn SearchStore,
    ciks: &[CikQuery],
) -> HashMap<CikQuery, LookupOutcome<Vec<Company>>> {
    let mut results = HashMap::new();
    let mut normalized_to_raw: HashMap<u64, CikQuery> = HashMap::new();

    for raw in ciks {
        match normalize_cik(raw) {
            Some(cik) => {
                normalized_to_raw.insert(cik, raw.clone());
            }
            None => {
                results.insert(
                    raw.clone(),
                    LookupOutcome::invalid_input(format!(
                        "Invalid CIK: '{raw}' could not be normalized"
                    )),
                );
            }
        }
    }

    if normalized_to_raw.is_empty() {
        return results;
    }
    let normalized: Vec<u64> = normalized_to_raw.keys().copied().collect();

    match store.ciks_bulk(&normalized).await {
        Ok(bulk) => {
            for (cik, raw) in &normalized_to_raw {
                let outcome = match bulk.get(cik) {
                    Some(matches) if !matches.is_empty() => LookupOutcome::hit(matches.clone()),
                    _ => LookupOutcome::not_found(format!("CIK '{raw}' not found")),
                };
                results.insert(raw.clone(), outcome);
            }
        }
        Err(err) => {
            log::warn!("Bulk CIK lookup failed, resolving from memory: {err}");
            for raw in normalized_to_raw.values() {
                results.insert(raw.clone(), resolve_cik(index, raw));
            }
        }
    }

    results
}

/// Batch name resolution: one best match per name, exact or fuzzy.
pub(crate) async fn names_batch(
    index: &EntityIndex,
    store: &dyn SearchStore,
    names: &[String],
    fuzzy: bool,
) -> HashMap<String, LookupOutcome<Company>> {
    let mut results = HashMap::new();
    let mut valid: Vec<String> = Vec::new();

    for raw in names {
        if raw.trim().is_empty() {
            results.insert(
                raw.clone(),
                LookupOutcome::invalid_input("Invalid name: empty or whitespace"),
            );
        } else {
            valid.push(raw.clone());
        }
    }

    if valid.is_empty() {
        return results;
    }

    match store.names_bulk(&valid, fuzzy).await {
        Ok(bulk) => {
            for name in &valid {
                let outcome = match bulk.get(name).and_then(|matches| matches.first()) {
                    Some(company) => LookupOutcome::hit(company.clone()),
                    None => {
                        LookupOutcome::not_found(format!("Company name '{name}' not found"))
                    }
                };
                results.insert(name.clone(), outcome);
            }
        }
        Err(err) => {
            log::warn!("Bulk name lookup failed, resolving from memory: {err}");
            for name in &valid {
                results.insert(name.clone(), resolve_name(index, name, fuzzy));
            }
        }
    }

    results
}
