//! Exponential Moving Average (EMA).
//!
//! Span convention: alpha = 2 / (span + 1).
//! Seed: EMA[0] = value[0]; EMA[t] = alpha * value[t] + (1 - alpha) * EMA[t-1].
//! No bias correction, so the series is defined from the first index.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("ema_{span}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        ema_of_series(values, self.span)
    }
}

/// Raw EMA over a slice. Used directly by MACD for the signal line.
///
/// A NaN input taints its own index and everything after it, since the
/// recurrence carries state forward.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n == 0 || span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = values[0];
    result[0] = prev;

    for i in 1..n {
        if prev.is_nan() {
            break;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}
