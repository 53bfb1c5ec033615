//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over remote bar sources (Yahoo Finance,
//! synthetic data) so they can be swapped and mocked in tests. The cache
//! layer sits above this trait; providers don't know about the cache.

use crate::domain::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("no cached data for '{symbol}' and no provider available")]
    NoCachedData { symbol: String },

    #[error("http client error: {0}")]
    Client(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Synthetic,
}

/// Remote source of daily bars.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over an inclusive date range.
    ///
    /// An unknown or delisted symbol is `DataError::SymbolNotFound`.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}
