//! Series: the ordered bar history for one ticker.

use super::Bar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejections from [`Series::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("{ticker}: bar dates out of order at index {index} ({prev} then {next})")]
    OutOfOrder {
        ticker: String,
        index: usize,
        prev: chrono::NaiveDate,
        next: chrono::NaiveDate,
    },

    #[error("{ticker}: duplicate bar date {date}")]
    DuplicateDate {
        ticker: String,
        date: chrono::NaiveDate,
    },
}

/// Ascending, duplicate-free daily bars for a single ticker.
///
/// Gaps (holidays, halts) are allowed. The last bar is the evaluation point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    ticker: String,
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        let ticker = ticker.into();
        for (i, pair) in bars.windows(2).enumerate() {
            let (prev, next) = (pair[0].date, pair[1].date);
            if next == prev {
                return Err(SeriesError::DuplicateDate { ticker, date: next });
            }
            if next < prev {
                return Err(SeriesError::OutOfOrder {
                    ticker,
                    index: i + 1,
                    prev,
                    next,
                });
            }
        }
        Ok(Self { ticker, bars })
    }

    /// Build a series from bars in any order, sorting by date and keeping the
    /// last bar seen for a repeated date.
    pub fn from_unsorted(ticker: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            ticker: ticker.into(),
            bars: deduped,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn accepts_ascending_with_gaps() {
        let s = Series::new("AAPL", vec![bar(1, 10.0), bar(4, 11.0), bar(5, 12.0)]).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.ticker(), "AAPL");
        assert_eq!(s.last().unwrap().close, 12.0);
    }

    #[test]
    fn rejects_out_of_order() {
        let err = Series::new("AAPL", vec![bar(2, 10.0), bar(1, 11.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::OutOfOrder { index: 1, .. }));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = Series::new("AAPL", vec![bar(2, 10.0), bar(2, 11.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::DuplicateDate { .. }));
    }

    #[test]
    fn from_unsorted_sorts_and_keeps_last_duplicate() {
        let s = Series::from_unsorted("X", vec![bar(3, 3.0), bar(1, 1.0), bar(3, 4.0)]);
        let closes = s.closes();
        assert_eq!(closes, vec![1.0, 4.0]);
    }

    #[test]
    fn empty_series_is_valid() {
        let s = Series::new("X", Vec::new()).unwrap();
        assert!(s.is_empty());
        assert!(s.last().is_none());
    }
}
