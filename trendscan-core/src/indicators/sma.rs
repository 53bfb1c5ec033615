//! Simple Moving Average (SMA).
//!
//! Rolling mean over a lookback window, inclusive of the current index.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        // NaNs are kept out of the running sum; a window is tainted while the
        // most recent NaN position is still inside it.
        let mut last_nan: Option<usize> = None;
        let mut sum = 0.0;
        for i in 0..n {
            let entering = values[i];
            if entering.is_nan() {
                last_nan = Some(i);
            } else {
                sum += entering;
            }
            if i >= self.period {
                let leaving = values[i - self.period];
                if !leaving.is_nan() {
                    sum -= leaving;
                }
            }
            if i + 1 < self.period {
                continue;
            }

            let window_start = i + 1 - self.period;
            match last_nan {
                Some(pos) if pos >= window_start => {}
                _ => result[i] = sum / self.period as f64,
            }
        }

        result
    }
}
