//! Market value over canned history.

use chrono::{Duration, NaiveDate, Utc};
use trendscan_core::data::{
    CachedHistory, DataError, History, HistoryCache, HistoryProvider, SyntheticProvider,
};
use trendscan_core::domain::{Bar, Series};
use trendscan_runner::market_value::{
    write_totals_csv, write_valuation_csv, Holding, Purchase,
};
use trendscan_runner::{value_portfolio, Holdings};

struct StepHistory;

impl HistoryProvider for StepHistory {
    fn history(&self, ticker: &str, _min_bars: usize) -> Result<History, DataError> {
        if ticker == "GONE" {
            return Ok(History::Delisted);
        }
        // Mon 2025-04-07 .. Fri 2025-04-11, close 10, 11, 12, 13, 14
        let base = NaiveDate::from_ymd_opt(2025, 4, 7).unwrap();
        let bars = (0..5)
            .map(|i| {
                let close = 10.0 + i as f64;
                Bar {
                    date: base + chrono::Duration::days(i),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1000,
                }
            })
            .collect();
        Ok(History::Series(Series::new(ticker, bars).unwrap()))
    }
}

#[test]
fn values_portfolio_and_writes_csv() {
    let holdings = Holdings::from_toml(
        r#"
        [[holdings]]
        symbol = "AAA"
        purchases = [{ date = "2025-04-08", shares = 10 }]

        [[holdings]]
        symbol = "BBB"
        purchases = [{ date = "2025-04-07", shares = 1 }, { date = "2025-04-10", shares = 1 }]

        [[holdings]]
        symbol = "GONE"
        purchases = [{ date = "2025-04-08", shares = 1 }]
        "#,
    )
    .unwrap();
    let today = NaiveDate::from_ymd_opt(2025, 4, 11).unwrap();
    let valuation = value_portfolio(&holdings, &StepHistory, today);

    assert_eq!(valuation.unavailable.len(), 1);
    assert_eq!(valuation.unavailable[0].0, "GONE");

    let aaa = &valuation.symbols[0];
    assert_eq!(aaa.rows.len(), 4);
    assert_eq!(aaa.rows[0].book_value, 110.0);
    assert_eq!(aaa.rows[3].market_value, 140.0);

    let bbb = &valuation.symbols[1];
    assert_eq!(bbb.rows.len(), 5);
    assert_eq!(bbb.rows[0].book_value, 10.0);
    assert_eq!(bbb.rows[4].shares_held, 2.0);
    assert_eq!(bbb.rows[4].book_value, 10.0 + 13.0);

    assert_eq!(valuation.totals.len(), 5);
    assert_eq!(valuation.totals[0].market_value, 10.0);
    assert_eq!(valuation.totals[4].market_value, 140.0 + 28.0);

    let dir = tempfile::tempdir().unwrap();
    let rows_path = dir.path().join("mv.csv");
    let totals_path = dir.path().join("mv_totals.csv");
    write_valuation_csv(&rows_path, &valuation).unwrap();
    write_totals_csv(&totals_path, &valuation).unwrap();

    let content = std::fs::read_to_string(&rows_path).unwrap();
    assert!(content.starts_with("date,symbol,shares_held,close,market_value,book_value\n"));
    assert_eq!(content.lines().count(), 1 + 4 + 5);
    let totals = std::fs::read_to_string(&totals_path).unwrap();
    assert!(totals.starts_with("date,market_value,book_value\n"));
}

#[test]
fn screen_sized_cache_entry_is_widened_for_old_purchases() {
    let dir = tempfile::tempdir().unwrap();
    let history = CachedHistory::new(
        HistoryCache::new(dir.path()),
        Some(Box::new(SyntheticProvider::new())),
    );
    let now = Utc::now();
    let today = now.date_naive();

    // A screen run leaves roughly 180 calendar days in the cache.
    let History::Series(screened) = history.history_at("XUS.TO", 75, now).unwrap() else {
        panic!("XUS.TO should resolve to a series");
    };
    let bought = today - Duration::days(400);
    assert!(screened.bars()[0].date > bought);

    let holdings = Holdings {
        holdings: vec![Holding {
            symbol: "XUS.TO".into(),
            purchases: vec![Purchase {
                date: bought,
                shares: 10.0,
            }],
        }],
    };
    let valuation = value_portfolio(&holdings, &history, today);

    let v = &valuation.symbols[0];
    assert!(v.before_history.is_empty());
    let booked = v.rows[0].date;
    assert!(
        booked >= bought && booked - bought <= Duration::days(3),
        "purchase on {bought} booked at {booked}"
    );
    assert_eq!(v.rows[0].book_value, 10.0 * v.rows[0].close);
}
