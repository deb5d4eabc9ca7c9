use secmap_protocol::Company;

/// Match tier for ranked queries. Lower is better: exact full match, then
/// prefix, then arbitrary substring.
fn match_tier(haystack: &str, query_lower: &str) -> Option<u8> {
    if haystack == query_lower {
        Some(0)
    } else if haystack.starts_with(query_lower) {
        Some(1)
    } else if haystack.contains(query_lower) {
        Some(2)
    } else {
        None
    }
}

fn best_tier(company: &Company, query_lower: &str, names_only: bool) -> Option<u8> {
    let name_tier = match_tier(&company.name.to_lowercase(), query_lower);
    if names_only {
        return name_tier;
    }
    let ticker_tier = match_tier(&company.ticker.to_lowercase(), query_lower);
    match (name_tier, ticker_tier) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (tier, None) | (None, tier) => tier,
    }
}

/// Rank `companies` against `query` the way the persistent path promises:
/// exact case-insensitive match, then prefix, then substring, with ties
/// broken by ascending ticker. Non-fuzzy mode keeps the exact tier only.
pub(crate) fn rank_companies(
    companies: &[Company],
    query: &str,
    limit: usize,
    fuzzy: bool,
    names_only: bool,
) -> Vec<Company> {
    let query_lower = query.trim().to_lowercase();
    if query_lower.is_empty() {
        return Vec::new();
    }

    let mut matched: Vec<(u8, &Company)> = companies
        .iter()
        .filter_map(|company| {
            let tier = best_tier(company, &query_lower, names_only)?;
            if !fuzzy && tier != 0 {
                return None;
            }
            Some((tier, company))
        })
        .collect();

    matched.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.ticker.cmp(&b.1.ticker)));
    matched
        .into_iter()
        .take(limit)
        .map(|(_, company)| company.clone())
        .collect()
}
