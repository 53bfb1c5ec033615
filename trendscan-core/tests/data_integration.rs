//! History layer integration: synthetic provider → JSON cache → engine.

use chrono::{Duration, TimeZone, Utc};
use trendscan_core::data::synthetic::synthetic_bars;
use trendscan_core::data::{
    CacheContent, CachedHistory, History, HistoryCache, StalenessPolicy, SyntheticProvider,
};
use trendscan_core::engine::SignalEngine;

#[test]
fn synthetic_history_evaluates_through_cache() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc.with_ymd_and_hms(2024, 9, 2, 21, 0, 0).unwrap();
    let history = CachedHistory::new(
        HistoryCache::new(dir.path()),
        Some(Box::new(SyntheticProvider::new().with_unknown(["DEAD"]))),
    )
    .with_policy(StalenessPolicy::hours(12));

    let engine = SignalEngine::default();
    let required = engine.params().required_bars();

    let History::Series(series) = history.history_at("SPY", required, now).unwrap() else {
        panic!("SPY should resolve to a series");
    };
    assert!(series.len() >= required);
    let report = engine.evaluate(&series).unwrap();
    assert_eq!(report.ticker, "SPY");
    assert!(report.core_criteria_score <= 5);

    assert_eq!(
        history.history_at("DEAD", required, now).unwrap(),
        History::Delisted
    );

    let status = history.cache().status().unwrap();
    let tickers: Vec<&str> = status.iter().map(|s| s.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["DEAD", "SPY"]);
    assert!(status[0].delisted);
    assert_eq!(status[1].bar_count, series.len());
}

#[test]
fn offline_reads_back_what_online_cached() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc.with_ymd_and_hms(2024, 9, 2, 21, 0, 0).unwrap();
    let online = CachedHistory::new(
        HistoryCache::new(dir.path()),
        Some(Box::new(SyntheticProvider::new())),
    );
    let fetched = online.history_at("QQQ", 61, now).unwrap();

    let offline = CachedHistory::offline(HistoryCache::new(dir.path()));
    let cached = offline.history_at("QQQ", 61, now + Duration::days(30)).unwrap();
    assert_eq!(fetched, cached);
}

#[test]
fn tampered_cache_file_is_quarantined_and_refetched() {
    let dir = tempfile::tempdir().unwrap();
    let cache = HistoryCache::new(dir.path());
    let now = Utc.with_ymd_and_hms(2024, 9, 2, 21, 0, 0).unwrap();

    let bars = synthetic_bars("IWM", now.date_naive() - Duration::days(120), now.date_naive());
    let entry = cache.write_bars("IWM", bars, now).unwrap();
    let mut tampered = entry.clone();
    if let CacheContent::Bars { bars } = &mut tampered.content {
        bars[0].close *= 2.0;
    }
    cache.write(&tampered).unwrap();

    assert!(cache.load("IWM").unwrap().is_none());
    assert!(dir.path().join("IWM.json.quarantined").exists());

    let history = CachedHistory::new(cache, Some(Box::new(SyntheticProvider::new())));
    assert!(matches!(
        history.history_at("IWM", 61, now).unwrap(),
        History::Series(_)
    ));
}
