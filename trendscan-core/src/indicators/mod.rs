//! Indicator implementations over numeric series.
//!
//! Every indicator maps a slice of values (closes, volumes, or another
//! indicator's output) to a vector of the same length. Warmup positions are
//! `f64::NAN`, and a NaN input taints every output whose window contains it.
//!
//! # Look-ahead guard
//! No output at index t may depend on input from index t+1 or later. Every
//! indicator must produce identical prefixes for a truncated and a full series.

pub mod ema;
pub mod macd;
pub mod rolling_max;
pub mod rsi;
pub mod sma;

pub use ema::{ema_of_series, Ema};
pub use macd::{Macd, MacdLine};
pub use rolling_max::RollingMax;
pub use rsi::Rsi;
pub use sma::Sma;

/// A pure series-to-series transform.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_50", "rsi_14").
    fn name(&self) -> &str;

    /// Compute the indicator for the entire input.
    ///
    /// Returns a `Vec<f64>` of the same length as `values`.
    fn compute(&self, values: &[f64]) -> Vec<f64>;
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
