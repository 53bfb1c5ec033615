//! History acquisition: cache in front of a remote provider.
//!
//! Resolution policy for one ticker:
//! 1. Fresh cache entry → use it (bars or delisted marker). A bars entry
//!    shorter than the caller asked for is treated as stale.
//! 2. Provider configured → fetch, cache the result (`SymbolNotFound` is
//!    cached as delisted)
//! 3. Fetch failed but a stale entry exists → use the stale entry
//! 4. No provider (offline) → any cached entry regardless of age
//! 5. Otherwise → error

use super::cache::{CacheContent, CacheEntry, HistoryCache, StalenessPolicy};
use super::provider::{DataError, DataProvider};
use crate::domain::Series;
use chrono::{DateTime, Duration, Utc};

/// What a history lookup yields.
#[derive(Debug, Clone, PartialEq)]
pub enum History {
    Series(Series),
    /// The provider does not know the symbol.
    Delisted,
}

/// Source of per-ticker daily history.
pub trait HistoryProvider: Send + Sync {
    /// History for `ticker`, ideally with at least `min_bars` bars.
    ///
    /// Fewer bars is not an error here; the engine decides whether the
    /// series is long enough.
    fn history(&self, ticker: &str, min_bars: usize) -> Result<History, DataError>;
}

/// Calendar days to request so roughly `min_bars` trading days come back.
fn fetch_window_days(lookback_days: i64, min_bars: usize) -> i64 {
    let trading = i64::try_from(min_bars).unwrap_or(i64::MAX / 2);
    lookback_days.max(trading * 7 / 5 + 10)
}

/// [`HistoryProvider`] backed by a [`HistoryCache`] and an optional provider.
pub struct CachedHistory {
    cache: HistoryCache,
    provider: Option<Box<dyn DataProvider>>,
    policy: StalenessPolicy,
    lookback_days: i64,
}

impl CachedHistory {
    pub fn new(cache: HistoryCache, provider: Option<Box<dyn DataProvider>>) -> Self {
        Self {
            cache,
            provider,
            policy: StalenessPolicy::default(),
            lookback_days: 180,
        }
    }

    /// Cache-only resolution; stale entries are accepted.
    pub fn offline(cache: HistoryCache) -> Self {
        Self::new(cache, None)
    }

    pub fn with_policy(mut self, policy: StalenessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn cache(&self) -> &HistoryCache {
        &self.cache
    }

    /// Resolve `ticker` as of `now`.
    pub fn history_at(
        &self,
        ticker: &str,
        min_bars: usize,
        now: DateTime<Utc>,
    ) -> Result<History, DataError> {
        let cached = self.cache.load(ticker)?;

        if let Some(entry) = &cached {
            if self.policy.is_fresh(entry, now) && covers(entry, min_bars) {
                tracing::debug!(ticker, fetched_at = %entry.fetched_at, "cache hit");
                return Ok(entry_history(ticker, entry));
            }
        }

        let Some(provider) = &self.provider else {
            return match cached {
                Some(entry) => {
                    tracing::debug!(ticker, fetched_at = %entry.fetched_at, "offline, using cached entry");
                    Ok(entry_history(ticker, &entry))
                }
                None => Err(DataError::NoCachedData {
                    symbol: ticker.to_string(),
                }),
            };
        };

        let end = now.date_naive();
        let start = end - Duration::days(fetch_window_days(self.lookback_days, min_bars));

        match provider.fetch(ticker, start, end) {
            Ok(fetched) => {
                let insane = fetched.bars.iter().filter(|b| !b.is_sane()).count();
                if insane > 0 {
                    tracing::warn!(ticker, insane, "provider returned bars failing OHLC checks");
                }
                let source = fetched.source;
                let entry = self.cache.write_bars(ticker, fetched.bars, now)?;
                tracing::debug!(
                    ticker,
                    bars = entry.bar_count(),
                    provider = provider.name(),
                    ?source,
                    "fetched"
                );
                Ok(entry_history(ticker, &entry))
            }
            Err(DataError::SymbolNotFound { .. }) => {
                tracing::info!(ticker, "symbol not found, caching as delisted");
                self.cache.write_delisted(ticker, now)?;
                Ok(History::Delisted)
            }
            Err(e) => match cached {
                Some(entry) => {
                    tracing::warn!(
                        ticker,
                        error = %e,
                        fetched_at = %entry.fetched_at,
                        "fetch failed, falling back to stale cache entry"
                    );
                    Ok(entry_history(ticker, &entry))
                }
                None => Err(e),
            },
        }
    }
}

impl HistoryProvider for CachedHistory {
    fn history(&self, ticker: &str, min_bars: usize) -> Result<History, DataError> {
        self.history_at(ticker, min_bars, Utc::now())
    }
}

/// Delisted markers always cover; bars must reach `min_bars`.
fn covers(entry: &CacheEntry, min_bars: usize) -> bool {
    entry.is_delisted() || entry.bar_count() >= min_bars
}

fn entry_history(ticker: &str, entry: &CacheEntry) -> History {
    match &entry.content {
        CacheContent::Bars { bars } => History::Series(Series::from_unsorted(ticker, bars.clone())),
        CacheContent::Delisted => History::Delisted,
    }
}

/// [`HistoryProvider`] that calls a provider directly, bypassing the cache.
///
/// Used for synthetic runs so generated bars never land in the cache.
pub struct DirectHistory {
    provider: Box<dyn DataProvider>,
    lookback_days: i64,
}

impl DirectHistory {
    pub fn new(provider: Box<dyn DataProvider>) -> Self {
        Self {
            provider,
            lookback_days: 180,
        }
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }
}

impl HistoryProvider for DirectHistory {
    fn history(&self, ticker: &str, min_bars: usize) -> Result<History, DataError> {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(fetch_window_days(self.lookback_days, min_bars));
        match self.provider.fetch(ticker, start, end) {
            Ok(fetched) => Ok(History::Series(Series::from_unsorted(ticker, fetched.bars))),
            Err(DataError::SymbolNotFound { .. }) => Ok(History::Delisted),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{DataSource, FetchResult};
    use crate::data::synthetic::synthetic_bars;
    use chrono::{NaiveDate, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Provider that counts calls and can be told to fail.
    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl DataProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<FetchResult, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DataError::NetworkUnreachable("down".into()));
            }
            if symbol == "GONE" {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.into(),
                });
            }
            Ok(FetchResult {
                symbol: symbol.into(),
                bars: synthetic_bars(symbol, start, end),
                source: DataSource::Synthetic,
            })
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap()
    }

    fn history(dir: &std::path::Path, fail: bool) -> (CachedHistory, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: Arc::clone(&calls),
            fail,
        };
        let h = CachedHistory::new(HistoryCache::new(dir), Some(Box::new(provider)));
        (h, calls)
    }

    fn bar_count(h: History) -> usize {
        match h {
            History::Series(s) => s.len(),
            History::Delisted => panic!("expected a series"),
        }
    }

    #[test]
    fn fetches_then_serves_from_fresh_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (h, calls) = history(dir.path(), false);

        let first = bar_count(h.history_at("SPY", 60, now()).unwrap());
        assert!(first >= 60, "180 calendar days should cover 60 bars, got {first}");
        let second = bar_count(h.history_at("SPY", 60, now() + Duration::hours(2)).unwrap());

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn short_fresh_entry_is_refetched_for_longer_history() {
        let dir = tempfile::tempdir().unwrap();
        let (h, calls) = history(dir.path(), false);

        let short = bar_count(h.history_at("SPY", 75, now()).unwrap());
        assert!(short < 290);
        let long = bar_count(h.history_at("SPY", 290, now() + Duration::hours(1)).unwrap());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(long >= 290, "wider window should cover 290 bars, got {long}");
        // The longer entry now satisfies the shorter request from cache.
        h.history_at("SPY", 75, now() + Duration::hours(2)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stale_entry_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let (h, calls) = history(dir.path(), false);

        h.history_at("SPY", 60, now()).unwrap();
        h.history_at("SPY", 60, now() + Duration::hours(25)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn not_found_is_cached_as_delisted() {
        let dir = tempfile::tempdir().unwrap();
        let (h, calls) = history(dir.path(), false);

        assert_eq!(h.history_at("GONE", 60, now()).unwrap(), History::Delisted);
        assert_eq!(h.history_at("GONE", 60, now()).unwrap(), History::Delisted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(h.cache().load("GONE").unwrap().unwrap().is_delisted());
    }

    #[test]
    fn failed_fetch_falls_back_to_stale_entry() {
        let dir = tempfile::tempdir().unwrap();
        let (seed, _) = history(dir.path(), false);
        let expected = bar_count(seed.history_at("SPY", 60, now()).unwrap());

        let (h, calls) = history(dir.path(), true);
        let later = now() + Duration::days(3);
        assert_eq!(bar_count(h.history_at("SPY", 60, later).unwrap()), expected);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_fetch_without_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (h, _) = history(dir.path(), true);
        assert!(matches!(
            h.history_at("SPY", 60, now()),
            Err(DataError::NetworkUnreachable(_))
        ));
    }

    #[test]
    fn offline_uses_any_entry_or_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (seed, _) = history(dir.path(), false);
        seed.history_at("SPY", 60, now()).unwrap();

        let offline = CachedHistory::offline(HistoryCache::new(dir.path()));
        let a_year_later = now() + Duration::days(365);
        assert!(matches!(
            offline.history_at("SPY", 60, a_year_later).unwrap(),
            History::Series(_)
        ));
        assert!(matches!(
            offline.history_at("QQQ", 60, now()),
            Err(DataError::NoCachedData { .. })
        ));
    }

    #[test]
    fn window_widens_for_long_requirements() {
        assert_eq!(fetch_window_days(180, 60), 180);
        assert_eq!(fetch_window_days(180, 250), 360);
    }

    #[test]
    fn direct_history_skips_the_cache() {
        let provider = crate::data::synthetic::SyntheticProvider::new().with_unknown(["GONE"]);
        let h = DirectHistory::new(Box::new(provider));
        assert!(matches!(h.history("SPY", 60).unwrap(), History::Series(_)));
        assert_eq!(h.history("GONE", 60).unwrap(), History::Delisted);
    }
}
