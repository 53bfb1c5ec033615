//! Portfolio market value over time.
//!
//! Holdings file (TOML), dates as quoted ISO strings:
//!
//! ```toml
//! [[holdings]]
//! symbol = "XUS.TO"
//! purchases = [
//!     { date = "2025-04-10", shares = 100 },
//!     { date = "2025-05-13", shares = 200 },
//! ]
//! ```
//!
//! Each purchase is booked at the close of its date, or of the next bar when
//! the market was closed that day. A purchase older than the first available
//! bar has no price and is reported instead of booked. From the first booked
//! bar onward every bar yields a row with cumulative shares, market value and
//! book value.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use trendscan_core::data::{History, HistoryProvider};
use trendscan_core::domain::Bar;

#[derive(Debug, Error)]
pub enum HoldingsError {
    #[error("read holdings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse holdings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{symbol}: no purchases listed")]
    NoPurchases { symbol: String },

    #[error("{symbol}: purchase on {date} has non-positive shares {shares}")]
    NonPositiveShares {
        symbol: String,
        date: NaiveDate,
        shares: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub date: NaiveDate,
    pub shares: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub purchases: Vec<Purchase>,
}

impl Holding {
    pub fn first_purchase(&self) -> Option<NaiveDate> {
        self.purchases.iter().map(|p| p.date).min()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    #[serde(default)]
    pub holdings: Vec<Holding>,
}

impl Holdings {
    pub fn from_file(path: &Path) -> Result<Self, HoldingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| HoldingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, HoldingsError> {
        let holdings: Self = toml::from_str(content)?;
        for h in &holdings.holdings {
            if h.purchases.is_empty() {
                return Err(HoldingsError::NoPurchases {
                    symbol: h.symbol.clone(),
                });
            }
            if let Some(p) = h.purchases.iter().find(|p| p.shares.is_nan() || p.shares <= 0.0) {
                return Err(HoldingsError::NonPositiveShares {
                    symbol: h.symbol.clone(),
                    date: p.date,
                    shares: p.shares,
                });
            }
        }
        Ok(holdings)
    }
}

/// One symbol on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub shares_held: f64,
    pub close: f64,
    pub market_value: f64,
    pub book_value: f64,
}

/// Portfolio total on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalRow {
    pub date: NaiveDate,
    pub market_value: f64,
    pub book_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolValuation {
    pub symbol: String,
    pub rows: Vec<ValuationRow>,
    /// Purchases dated after the last available bar.
    pub skipped: Vec<Purchase>,
    /// Purchases dated before the first available bar. Their price is
    /// unknown, so they are not booked.
    pub before_history: Vec<Purchase>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioValuation {
    pub symbols: Vec<SymbolValuation>,
    /// Symbols with no history, with the reason.
    pub unavailable: Vec<(String, String)>,
    pub totals: Vec<TotalRow>,
}

/// Value one holding over `bars` (ascending by date).
pub fn value_holding(holding: &Holding, bars: &[Bar]) -> SymbolValuation {
    let mut bought = vec![0.0_f64; bars.len()];
    let mut cost = vec![0.0_f64; bars.len()];
    let mut skipped = Vec::new();
    let mut before_history = Vec::new();

    for purchase in &holding.purchases {
        if let Some(first) = bars.first().filter(|b| purchase.date < b.date) {
            tracing::warn!(
                symbol = %holding.symbol,
                date = %purchase.date,
                first_bar = %first.date,
                "purchase predates available history"
            );
            before_history.push(purchase.clone());
            continue;
        }
        // First bar on or after the purchase date
        let idx = bars.partition_point(|b| b.date < purchase.date);
        match bars.get(idx) {
            Some(bar) => {
                bought[idx] += purchase.shares;
                cost[idx] += purchase.shares * bar.close;
            }
            None => {
                tracing::warn!(
                    symbol = %holding.symbol,
                    date = %purchase.date,
                    "purchase is after the last available bar"
                );
                skipped.push(purchase.clone());
            }
        }
    }

    let first = bought.iter().position(|&s| s > 0.0);
    let mut rows = Vec::new();
    let mut shares_held = 0.0;
    let mut book_value = 0.0;
    if let Some(first) = first {
        for (i, bar) in bars.iter().enumerate().skip(first) {
            shares_held += bought[i];
            book_value += cost[i];
            rows.push(ValuationRow {
                date: bar.date,
                symbol: holding.symbol.clone(),
                shares_held,
                close: bar.close,
                market_value: bar.close * shares_held,
                book_value,
            });
        }
    }

    SymbolValuation {
        symbol: holding.symbol.clone(),
        rows,
        skipped,
        before_history,
    }
}

/// Sum market and book value per date across symbols; a symbol with no
/// row on a date contributes zero.
pub fn portfolio_totals(symbols: &[SymbolValuation]) -> Vec<TotalRow> {
    let mut by_date: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for row in symbols.iter().flat_map(|s| &s.rows) {
        let entry = by_date.entry(row.date).or_default();
        entry.0 += row.market_value;
        entry.1 += row.book_value;
    }
    by_date
        .into_iter()
        .map(|(date, (market_value, book_value))| TotalRow {
            date,
            market_value,
            book_value,
        })
        .collect()
}

/// Trading bars to ask for so history reaches back to `since`.
fn bars_since(since: NaiveDate, today: NaiveDate) -> usize {
    let days = (today - since).num_days().max(0);
    usize::try_from(days * 5 / 7 + 5).unwrap_or(usize::MAX)
}

/// Value every holding using `history`, in file order.
pub fn value_portfolio(
    holdings: &Holdings,
    history: &dyn HistoryProvider,
    today: NaiveDate,
) -> PortfolioValuation {
    let mut valuation = PortfolioValuation::default();

    for holding in &holdings.holdings {
        let min_bars = holding
            .first_purchase()
            .map_or(0, |since| bars_since(since, today));

        match history.history(&holding.symbol, min_bars) {
            Ok(History::Series(series)) => {
                let v = value_holding(holding, series.bars());
                tracing::info!(symbol = %holding.symbol, rows = v.rows.len(), "valued holding");
                valuation.symbols.push(v);
            }
            Ok(History::Delisted) => valuation
                .unavailable
                .push((holding.symbol.clone(), "delisted or unknown symbol".into())),
            Err(e) => {
                tracing::warn!(symbol = %holding.symbol, error = %e, "no history for holding");
                valuation.unavailable.push((holding.symbol.clone(), e.to_string()));
            }
        }
    }

    valuation.totals = portfolio_totals(&valuation.symbols);
    valuation
}

/// Per-symbol rows (`date,symbol,shares_held,close,market_value,book_value`).
pub fn write_valuation_csv(path: &Path, valuation: &PortfolioValuation) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create valuation CSV {}", path.display()))?;
    for row in valuation.symbols.iter().flat_map(|s| &s.rows) {
        writer.serialize(row).context("Failed to write valuation row")?;
    }
    writer.flush().context("Failed to flush valuation CSV")?;
    Ok(())
}

/// Portfolio totals (`date,market_value,book_value`).
pub fn write_totals_csv(path: &Path, valuation: &PortfolioValuation) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create totals CSV {}", path.display()))?;
    for row in &valuation.totals {
        writer.serialize(row).context("Failed to write totals row")?;
    }
    writer.flush().context("Failed to flush totals CSV")?;
    Ok(())
}
