//! History data layer: providers, cache, and the cached history adapter.

pub mod cache;
pub mod circuit_breaker;
pub mod history;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use cache::{CacheContent, CacheEntry, CacheStatus, HistoryCache, StalenessPolicy};
pub use circuit_breaker::CircuitBreaker;
pub use history::{CachedHistory, DirectHistory, History, HistoryProvider};
pub use provider::{DataError, DataProvider, DataSource, FetchResult};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
