//! Rolling maximum over a trailing window, inclusive of the current index.
//!
//! Breakout levels read this series one index before the evaluation bar so
//! the level never includes the bar being tested.
//! Lookback: period - 1.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct RollingMax {
    period: usize,
    name: String,
}

impl RollingMax {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RollingMax period must be >= 1");
        Self {
            period,
            name: format!("max_{period}"),
        }
    }
}

impl Indicator for RollingMax {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &values[(i + 1 - self.period)..=i];
            if window.iter().any(|v| v.is_nan()) {
                continue;
            }
            result[i] = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn rolling_max_3() {
        let result = RollingMax::new(3).compute(&[12.0, 15.0, 14.0, 16.0, 15.5]);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 15.0, DEFAULT_EPSILON);
        assert_approx(result[3], 16.0, DEFAULT_EPSILON);
        assert_approx(result[4], 16.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_max_nan_taints_window() {
        let result = RollingMax::new(2).compute(&[1.0, f64::NAN, 3.0, 4.0]);
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_approx(result[3], 4.0, DEFAULT_EPSILON);
    }

}
