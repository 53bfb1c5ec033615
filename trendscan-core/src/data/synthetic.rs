//! Deterministic synthetic bars for offline demos and tests.

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random-walk provider seeded from the symbol name.
///
/// The same symbol and range always produce the same bars. Symbols listed in
/// `unknown` behave like delisted tickers.
#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider {
    unknown: Vec<String>,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report these symbols as not found.
    pub fn with_unknown(mut self, symbols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.unknown.extend(symbols.into_iter().map(Into::into));
        self
    }
}

/// Random walk from 100.0, weekdays only.
pub fn synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    // Per-symbol drift so a group shows a mix of trends
    let drift: f64 = rng.gen_range(-0.002..0.004);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = drift + rng.gen_range(-0.025..0.025);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        if self.unknown.iter().any(|s| s.eq_ignore_ascii_case(symbol)) {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars: synthetic_bars(symbol, start, end),
            source: DataSource::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}
