//! Bar: one trading day of market data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar.
///
/// OHLC are positive prices; `volume` is the share count for the day.
/// A provider gap may leave a price as NaN; such bars are kept so the
/// engine can report a computation error instead of silently skipping days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Basic OHLC sanity check: finite prices, high >= low, high >= open/close,
    /// prices positive.
    pub fn is_sane(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite();
        finite
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}
