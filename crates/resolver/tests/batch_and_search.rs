mod support;

use pretty_assertions::assert_eq;
use secmap_protocol::{CikQuery, ErrorCode};
use secmap_resolver::CompanyService;
use std::sync::Arc;
use std::time::Duration;
use support::{snapshot, StubFetcher, StubStore};

fn corpus() -> Vec<(u64, &'static str, &'static str)> {
    vec![
        (320193, "AAPL", "Apple Inc."),
        (789019, "MSFT", "Microsoft Corp"),
        (1652044, "GOOGL", "Alphabet Inc."),
        (1652044, "GOOG", "Alphabet Inc."),
    ]
}

fn service(store: Arc<StubStore>) -> CompanyService {
    let fetcher = Arc::new(StubFetcher::with_snapshot(snapshot(&corpus())));
    CompanyService::with_expiry(fetcher, store, Duration::from_secs(3600))
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[tokio::test]
async fn ticker_batch_preserves_input_keys_verbatim() {
    let service = service(Arc::new(StubStore::new()));

    let results = service
        .resolve_tickers_batch(&strings(&["AAPL", "INVALID", ""]))
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(results["AAPL"].success);
    assert_eq!(results["AAPL"].data.as_ref().unwrap().cik, 320193);
    assert_eq!(results["INVALID"].error_code, Some(ErrorCode::NotFound));
    assert_eq!(results[""].error_code, Some(ErrorCode::InvalidInput));
}

#[tokio::test]
async fn ticker_batch_maps_results_back_to_the_raw_spelling() {
    let service = service(Arc::new(StubStore::new()));

    let results = service
        .resolve_tickers_batch(&strings(&[" aapl "]))
        .await
        .unwrap();

    // The key is the raw input, not the normalized ticker.
    assert!(results.contains_key(" aapl "));
    assert!(results[" aapl "].success);
}

#[tokio::test]
async fn duplicate_raw_inputs_collapse_to_one_entry() {
    let service = service(Arc::new(StubStore::new()));

    let results = service
        .resolve_tickers_batch(&strings(&["AAPL", "AAPL"]))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn empty_batches_never_touch_fetcher_or_store() {
    let fetcher = Arc::new(StubFetcher::with_snapshot(snapshot(&corpus())));
    let store = Arc::new(StubStore::new());
    let service =
        CompanyService::with_expiry(fetcher.clone(), store.clone(), Duration::from_secs(3600));

    let results = service.resolve_tickers_batch(&[]).await.unwrap();
    assert!(results.is_empty());
    let results = service.resolve_ciks_batch(&[]).await.unwrap();
    assert!(results.is_empty());
    let results = service.resolve_names_batch(&[], true).await.unwrap();
    assert!(results.is_empty());

    assert_eq!(fetcher.fetch_count(), 0);
    assert_eq!(store.query_count(), 0);
}

#[tokio::test]
async fn cik_batch_preserves_multiplicity_and_raw_keys() {
    let service = service(Arc::new(StubStore::new()));

    let ciks = vec![
        CikQuery::Number(1652044),
        CikQuery::Text("0000320193".into()),
        CikQuery::Text("bogus".into()),
    ];
    let results = service.resolve_ciks_batch(&ciks).await.unwrap();

    assert_eq!(results[&CikQuery::Number(1652044)].data.as_ref().unwrap().len(), 2);
    assert_eq!(
        results[&CikQuery::Text("0000320193".into())]
            .data
            .as_ref()
            .unwrap()[0]
            .ticker,
        "AAPL"
    );
    assert_eq!(
        results[&CikQuery::Text("bogus".into())].error_code,
        Some(ErrorCode::InvalidInput)
    );
}

#[tokio::test]
async fn name_batch_returns_one_best_match_per_name() {
    let service = service(Arc::new(StubStore::new()));

    let results = service
        .resolve_names_batch(&strings(&["Apple", "No Such Company", ""]), true)
        .await
        .unwrap();

    assert_eq!(results["Apple"].data.as_ref().unwrap().ticker, "AAPL");
    assert_eq!(
        results["No Such Company"].error_code,
        Some(ErrorCode::NotFound)
    );
    assert_eq!(results[""].error_code, Some(ErrorCode::InvalidInput));
}

#[tokio::test]
async fn batches_complete_from_memory_when_the_store_fails() {
    let store = Arc::new(StubStore::new());
    let service = service(store.clone());

    // Load once so the index is warm, then take the store away.
    assert!(service.resolve_ticker("AAPL").await.unwrap().is_some());
    store.set_failing(true);

    let results = service
        .resolve_tickers_batch(&strings(&["AAPL", "MISSING"]))
        .await
        .unwrap();
    assert!(results["AAPL"].success);
    assert_eq!(results["MISSING"].error_code, Some(ErrorCode::NotFound));

    let results = service
        .resolve_ciks_batch(&[CikQuery::Number(1652044)])
        .await
        .unwrap();
    assert_eq!(results[&CikQuery::Number(1652044)].data.as_ref().unwrap().len(), 2);

    let results = service
        .resolve_names_batch(&strings(&["Microsoft Corp"]), true)
        .await
        .unwrap();
    assert!(results["Microsoft Corp"].success);
}

#[tokio::test]
async fn search_dedups_across_exact_and_store_tiers() {
    let service = service(Arc::new(StubStore::new()));

    // "AAPL" hits the exact-ticker tier and the store's substring tier;
    // the record must appear exactly once.
    let results = service.search("AAPL", 10, true).await.unwrap();
    let apple_hits = results.iter().filter(|c| c.ticker == "AAPL").count();
    assert_eq!(apple_hits, 1);
}

#[tokio::test]
async fn search_limit_zero_returns_nothing() {
    let service = service(Arc::new(StubStore::new()));
    assert_eq!(service.search("Apple", 0, true).await.unwrap(), vec![]);
    assert_eq!(service.search_names("Apple", 0, true).await.unwrap(), vec![]);
}

#[tokio::test]
async fn search_truncates_to_limit() {
    let service = service(Arc::new(StubStore::new()));
    let results = service.search("Inc.", 2, true).await.unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn search_falls_back_to_memory_when_the_store_fails() {
    let store = Arc::new(StubStore::new());
    let service = service(store.clone());
    assert!(service.resolve_ticker("AAPL").await.unwrap().is_some());
    store.set_failing(true);

    let results = service.search("Apple", 10, true).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].ticker, "AAPL");

    // The name-restricted variant degrades to the single best name match.
    let results = service.search_names("Microsoft", 10, true).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].ticker, "MSFT");

    // An ambiguous fragment cannot pick a winner without the store.
    let results = service.search_names("Alphabet", 10, true).await.unwrap();
    assert_eq!(results, vec![]);
}

#[tokio::test]
async fn name_search_orders_exact_hits_before_store_matches() {
    let service = service(Arc::new(StubStore::new()));

    let results = service.search_names("Alphabet Inc.", 10, true).await.unwrap();
    let tickers: Vec<&str> = results.iter().map(|c| c.ticker.as_str()).collect();
    // Exact name hits come first in insertion order; the store adds nothing
    // new after dedup.
    assert_eq!(tickers, vec!["GOOGL", "GOOG"]);
}
