//! MACD: difference of a fast and a slow EMA, tracked against its own EMA.
//!
//! - Macd line: EMA(fast) - EMA(slow)
//! - Signal line: EMA(signal) of the MACD line
//!
//! All EMAs are seeded at the first value (see `ema`), so every line is
//! defined from index 0. Each line is a separate Indicator instance.

use super::ema::ema_of_series;
use super::Indicator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD spans must be >= 1");
        assert!(fast < slow, "MACD fast span must be shorter than slow span");
        let label = match line {
            MacdLine::Macd => "line",
            MacdLine::Signal => "signal",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: format!("macd_{label}_{fast}_{slow}_{signal}"),
        }
    }

    /// Standard 12/26/9 configuration.
    pub fn standard(line: MacdLine) -> Self {
        Self::new(12, 26, 9, line)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        let fast = ema_of_series(values, self.fast);
        let slow = ema_of_series(values, self.slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();

        match self.line {
            MacdLine::Macd => macd,
            MacdLine::Signal => ema_of_series(&macd, self.signal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn macd_flat_series_is_zero() {
        let values = [50.0; 60];
        for line in [MacdLine::Macd, MacdLine::Signal] {
            let result = Macd::standard(line).compute(&values);
            assert!(result.iter().all(|v| v.abs() < DEFAULT_EPSILON));
        }
    }

    #[test]
    fn macd_matches_ema_difference() {
        let values: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let line = Macd::standard(MacdLine::Macd).compute(&values);
        let fast = ema_of_series(&values, 12);
        let slow = ema_of_series(&values, 26);
        for i in 0..values.len() {
            assert_approx(line[i], fast[i] - slow[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rising_series_is_bullish() {
        // A steady uptrend keeps the fast EMA above the slow one, and the
        // MACD line above its lagging signal line.
        let values: Vec<f64> = (0..80).map(|i| 100.0 + i as f64 * (1.0 + i as f64 * 0.01)).collect();
        let line = Macd::standard(MacdLine::Macd).compute(&values);
        let signal = Macd::standard(MacdLine::Signal).compute(&values);
        assert!(line[79] > 0.0);
        assert!(line[79] > signal[79]);
    }

    #[test]
    fn names_are_distinct() {
        assert_eq!(Macd::standard(MacdLine::Macd).name(), "macd_line_12_26_9");
        assert_eq!(Macd::standard(MacdLine::Signal).name(), "macd_signal_12_26_9");
    }
}
