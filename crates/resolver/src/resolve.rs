use crate::index::EntityIndex;
use secmap_protocol::{normalize_cik, CikQuery, Company, LookupOutcome};

/// Exact ticker lookup. Tickers have no fuzzy tier.
pub fn resolve_ticker(index: &EntityIndex, ticker: &str) -> LookupOutcome<Company> {
    if ticker.trim().is_empty() {
        return LookupOutcome::invalid_input("Invalid ticker: empty or whitespace");
    }
    match index.lookup_by_ticker(ticker) {
        Some(company) => LookupOutcome::hit(company.clone()),
        None => LookupOutcome::not_found(format!("Ticker '{ticker}' not found")),
    }
}

/// CIK lookup. Several records under one CIK is multiplicity, not
/// ambiguity: all of them come back, fuzzy handling never applies.
pub fn resolve_cik(index: &EntityIndex, cik: &CikQuery) -> LookupOutcome<Vec<Company>> {
    let Some(normalized) = normalize_cik(cik) else {
        return LookupOutcome::invalid_input(format!(
            "Invalid CIK: '{cik}' could not be normalized"
        ));
    };
    let companies: Vec<Company> = index
        .lookup_by_cik(normalized)
        .into_iter()
        .cloned()
        .collect();
    if companies.is_empty() {
        LookupOutcome::not_found(format!("CIK '{cik}' not found"))
    } else {
        LookupOutcome::hit(companies)
    }
}

/// Name lookup: case-insensitive exact match first, then (when `fuzzy`)
/// progressive word-shortening until a candidate matches exactly one
/// company.
pub fn resolve_name(index: &EntityIndex, name: &str, fuzzy: bool) -> LookupOutcome<Company> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return LookupOutcome::invalid_input("Invalid name: empty or whitespace");
    }

    let exact = index.lookup_by_name_exact(trimmed);
    if let Some(first) = exact.first() {
        // Several exact matches tie-break to the first-loaded record.
        return LookupOutcome::hit((*first).clone());
    }

    if fuzzy {
        return resolve_name_fuzzy(index, name, trimmed);
    }
    LookupOutcome::not_found(format!("Company name '{name}' not found"))
}

/// Progressive shortening: join the remaining words, scan every indexed
/// name for the candidate as a substring, and either return the unique
/// match or drop the last word and retry.
///
/// Shortening can only widen the match set, so more than one match is
/// ambiguity forever: stop immediately instead of guessing.
fn resolve_name_fuzzy(index: &EntityIndex, raw: &str, trimmed: &str) -> LookupOutcome<Company> {
    let mut words: Vec<&str> = trimmed.split_whitespace().collect();

    while !words.is_empty() {
        let candidate = words.join(" ").to_lowercase();
        let matches = substring_matches(index, &candidate);

        if matches.len() == 1 {
            return LookupOutcome::hit(matches[0].clone());
        }
        if matches.len() > 1 {
            return LookupOutcome::not_found(format!(
                "Company name '{raw}' does not match any name"
            ));
        }
        words.pop();
    }

    LookupOutcome::not_found(format!("Company name '{raw}' does not match any name"))
}

fn substring_matches<'a>(index: &'a EntityIndex, candidate: &str) -> Vec<&'a Company> {
    let mut matches = Vec::new();
    for (indexed_name, ids) in index.name_entries() {
        if indexed_name.contains(candidate) {
            matches.extend(ids.iter().map(|id| index.record(*id)));
        }
    }
    matches
}

/// Type-inferring lookup: native integers are CIKs; strings try ticker
/// first (the common case), then the CIK path when digit-shaped, then
/// fuzzy name.
pub fn resolve_any(index: &EntityIndex, identifier: &CikQuery) -> Vec<Company> {
    match identifier {
        CikQuery::Number(_) => resolve_cik(index, identifier).into_data().unwrap_or_default(),
        CikQuery::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Vec::new();
            }

            if let Some(company) = resolve_ticker(index, trimmed).into_data() {
                return vec![company];
            }

            if trimmed.bytes().all(|b| b.is_ascii_digit()) {
                let outcome = resolve_cik(index, &CikQuery::Text(trimmed.to_string()));
                if let Some(companies) = outcome.into_data() {
                    if !companies.is_empty() {
                        return companies;
                    }
                }
            }

            resolve_name(index, trimmed, true)
                .into_data()
                .map_or_else(Vec::new, |company| vec![company])
        }
    }
}
