//! Engine output types.
//!
//! A successful evaluation is a [`SignalReport`]. Failures are values of
//! [`EvalError`]; for output they become a [`FailedReport`] so that a ticker
//! is never dropped from a screen. [`TickerReport`] carries either.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signals for one ticker at its last bar.
///
/// Field names serialize as the report contract (`avgVolume20`,
/// `sma50PrevOffset15`, ...). Slope references that the series is too short
/// to provide are `None` (JSON `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalReport {
    pub ticker: String,
    pub price: f64,
    pub volume: u64,

    pub sma50: f64,
    pub ema10: f64,
    pub rsi14: f64,
    pub macd: f64,
    #[serde(rename = "macd_signal")]
    pub macd_signal: f64,
    pub high20: f64,
    pub high60: f64,
    pub avg_volume20: f64,
    pub max_volume10: f64,
    pub sma50_prev_offset15: Option<f64>,
    pub sma50_prev_offset25: Option<f64>,

    pub breakout20: bool,
    pub breakout60: bool,
    pub breakout_confirmed: bool,
    pub price_above_sma50: bool,
    pub price_above_ema10: bool,
    pub sma50_rising: bool,
    pub rsi_in_range: bool,
    pub macd_bullish: bool,

    pub core_criteria_met: bool,
    pub core_criteria_score: u8,
}

impl SignalReport {
    /// The five core operands, in display order.
    pub fn core_criteria(&self) -> [(&'static str, bool); 5] {
        [
            ("breakout", self.breakout20 || self.breakout60),
            ("breakoutConfirmed", self.breakout_confirmed),
            ("priceAboveSma50", self.price_above_sma50),
            ("priceAboveEma10", self.price_above_ema10),
            ("sma50Rising", self.sma50_rising),
        ]
    }
}

/// Why a report could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("insufficient data: {required} bars required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("computation error: {indicator} is undefined at bar {index}")]
    ComputationError { indicator: String, index: usize },
}

impl EvalError {
    pub fn kind(&self) -> EvalErrorKind {
        match self {
            EvalError::InsufficientData { .. } => EvalErrorKind::InsufficientData,
            EvalError::ComputationError { .. } => EvalErrorKind::ComputationError,
        }
    }
}

/// Discriminant of [`EvalError`], as written to reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvalErrorKind {
    InsufficientData,
    ComputationError,
}

/// A ticker the engine could not evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedReport {
    pub ticker: String,
    pub error: EvalErrorKind,
    pub detail: String,
}

/// One row of screen output: evaluated or failed, never absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TickerReport {
    Evaluated(SignalReport),
    Failed(FailedReport),
}

impl TickerReport {
    pub fn from_result(ticker: &str, result: Result<SignalReport, EvalError>) -> Self {
        match result {
            Ok(report) => TickerReport::Evaluated(report),
            Err(err) => TickerReport::Failed(FailedReport {
                ticker: ticker.to_string(),
                error: err.kind(),
                detail: err.to_string(),
            }),
        }
    }

    pub fn ticker(&self) -> &str {
        match self {
            TickerReport::Evaluated(r) => &r.ticker,
            TickerReport::Failed(f) => &f.ticker,
        }
    }

    pub fn report(&self) -> Option<&SignalReport> {
        match self {
            TickerReport::Evaluated(r) => Some(r),
            TickerReport::Failed(_) => None,
        }
    }

    /// Core score, with failed reports ranking below every evaluated one.
    pub fn score(&self) -> Option<u8> {
        self.report().map(|r| r.core_criteria_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_report_serializes_without_indicator_fields() {
        let report = TickerReport::from_result(
            "ZZZ",
            Err(EvalError::InsufficientData {
                required: 61,
                available: 12,
            }),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ticker"], "ZZZ");
        assert_eq!(json["error"], "InsufficientData");
        assert!(json.get("sma50").is_none());
        assert!(json.get("coreCriteriaScore").is_none());
    }

    #[test]
    fn error_kind_matches_variant() {
        let err = EvalError::ComputationError {
            indicator: "sma_50".into(),
            index: 89,
        };
        assert_eq!(err.kind(), EvalErrorKind::ComputationError);
        assert!(err.to_string().contains("sma_50"));
    }
}
