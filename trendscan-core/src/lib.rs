//! TrendScan Core: domain types, indicators, the signal engine, history data
//! layer and group catalog.
//!
//! - Domain types (bars, series, groups)
//! - Indicators over price/volume slices with NaN warmup
//! - `SignalEngine`: one series in, one `SignalReport` out
//! - History acquisition behind the `HistoryProvider` trait
//! - Sector/subsector group catalog

pub mod catalog;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;

pub use catalog::{CatalogError, GroupCatalog};
pub use engine::{EvalError, FailedReport, ScreenParams, SignalEngine, SignalReport, TickerReport};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the runner shares across rayon workers
    /// is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Series>();
        require_sync::<domain::Series>();
        require_send::<domain::Group>();
        require_sync::<domain::Group>();

        require_send::<SignalEngine>();
        require_sync::<SignalEngine>();
        require_send::<SignalReport>();
        require_sync::<SignalReport>();
        require_send::<TickerReport>();
        require_sync::<TickerReport>();

        require_send::<data::CachedHistory>();
        require_sync::<data::CachedHistory>();
        require_send::<data::DirectHistory>();
        require_sync::<data::DirectHistory>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
        require_send::<GroupCatalog>();
        require_sync::<GroupCatalog>();
    }

    #[test]
    fn history_provider_is_object_safe() {
        fn _takes_dyn(p: &dyn data::HistoryProvider) -> Result<data::History, data::DataError> {
            p.history("SPY", 60)
        }
    }
}
