//! Screening parameters: every window and threshold the engine reads.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    #[error("{field} must be >= 1")]
    ZeroPeriod { field: &'static str },

    #[error("rsi band is empty: lower {lower} must be below upper {upper}")]
    EmptyRsiBand { lower: f64, upper: f64 },

    #[error("macd fast span {fast} must be shorter than slow span {slow}")]
    MacdSpans { fast: usize, slow: usize },

    #[error("volume_multiple must be positive and finite, got {0}")]
    VolumeMultiple(f64),

    #[error("sma slope offsets must satisfy 0 < near ({near}) < far ({far})")]
    SlopeOffsets { near: usize, far: usize },
}

/// Parameters for [`SignalEngine`](super::SignalEngine).
///
/// Defaults reproduce the standard screen: SMA 50, EMA 10, 20/60-bar
/// breakouts confirmed by 1.5x average volume, RSI 14 inside (50, 75),
/// MACD 12/26/9.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenParams {
    /// Fewest bars any evaluation accepts.
    pub min_bars: usize,
    pub sma_period: usize,
    pub ema_span: usize,
    pub volume_avg_period: usize,
    pub short_high_period: usize,
    pub long_high_period: usize,
    pub volume_max_period: usize,
    /// Bars back for the nearer SMA slope reference.
    pub slope_near_offset: usize,
    /// Bars back for the farther SMA slope reference.
    pub slope_far_offset: usize,
    pub rsi_period: usize,
    /// Exclusive lower bound of the RSI band.
    pub rsi_lower: f64,
    /// Exclusive upper bound of the RSI band.
    pub rsi_upper: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Breakout volume must reach this multiple of the average volume.
    pub volume_multiple: f64,
}

impl Default for ScreenParams {
    fn default() -> Self {
        Self {
            min_bars: 60,
            sma_period: 50,
            ema_span: 10,
            volume_avg_period: 20,
            short_high_period: 20,
            long_high_period: 60,
            volume_max_period: 10,
            slope_near_offset: 15,
            slope_far_offset: 25,
            rsi_period: 14,
            rsi_lower: 50.0,
            rsi_upper: 75.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            volume_multiple: 1.5,
        }
    }
}

impl ScreenParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        let periods = [
            ("sma_period", self.sma_period),
            ("ema_span", self.ema_span),
            ("volume_avg_period", self.volume_avg_period),
            ("short_high_period", self.short_high_period),
            ("long_high_period", self.long_high_period),
            ("volume_max_period", self.volume_max_period),
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
        ];
        for (field, value) in periods {
            if value == 0 {
                return Err(ParamsError::ZeroPeriod { field });
            }
        }
        if self.rsi_lower.is_nan() || self.rsi_upper.is_nan() || self.rsi_lower >= self.rsi_upper {
            return Err(ParamsError::EmptyRsiBand {
                lower: self.rsi_lower,
                upper: self.rsi_upper,
            });
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ParamsError::MacdSpans {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }
        if !(self.volume_multiple.is_finite() && self.volume_multiple > 0.0) {
            return Err(ParamsError::VolumeMultiple(self.volume_multiple));
        }
        if self.slope_near_offset == 0 || self.slope_near_offset >= self.slope_far_offset {
            return Err(ParamsError::SlopeOffsets {
                near: self.slope_near_offset,
                far: self.slope_far_offset,
            });
        }
        Ok(())
    }

    /// Bars needed for a full report (slope lookbacks aside).
    ///
    /// Prior-bar windows are read one index before the evaluation bar, so
    /// they need one bar more than their period.
    pub fn required_bars(&self) -> usize {
        [
            self.min_bars,
            self.sma_period,
            self.volume_avg_period,
            self.short_high_period + 1,
            self.long_high_period + 1,
            self.volume_max_period + 1,
            self.rsi_period + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(self.min_bars)
    }

    /// Bars needed before the SMA value `offset` bars back exists.
    pub fn bars_for_sma_offset(&self, offset: usize) -> usize {
        self.sma_period + offset
    }
}
