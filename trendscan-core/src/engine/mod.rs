//! Signal engine: one ticker's bar history in, one [`SignalReport`] out.
//!
//! The engine is a pure function of the series and its [`ScreenParams`]. It
//! keeps no state between calls, so a single instance can be shared across
//! threads and evaluating the same series twice yields identical reports.
//!
//! Evaluation order:
//! 1. Precondition: enough bars for every window at its read offset.
//! 2. Indicator series (SMA, EMA, volume average, prior-bar highs, RSI, MACD).
//! 3. Point reads at the evaluation bar (or the bar before it for the
//!    prior-bar highs), each checked for finiteness.
//! 4. Boolean criteria and the five-operand core score.

pub mod params;
pub mod report;

pub use params::{ParamsError, ScreenParams};
pub use report::{EvalError, EvalErrorKind, FailedReport, SignalReport, TickerReport};

use crate::domain::Series;
use crate::indicators::{Ema, Indicator, Macd, MacdLine, RollingMax, Rsi, Sma};

#[derive(Debug, Clone)]
pub struct SignalEngine {
    params: ScreenParams,
    sma: Sma,
    ema: Ema,
    volume_avg: Sma,
    short_high: RollingMax,
    long_high: RollingMax,
    volume_max: RollingMax,
    rsi: Rsi,
    macd: Macd,
    macd_signal: Macd,
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::build(ScreenParams::default())
    }
}

impl SignalEngine {
    pub fn new(params: ScreenParams) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self::build(params))
    }

    fn build(params: ScreenParams) -> Self {
        Self {
            sma: Sma::new(params.sma_period),
            ema: Ema::new(params.ema_span),
            volume_avg: Sma::new(params.volume_avg_period),
            short_high: RollingMax::new(params.short_high_period),
            long_high: RollingMax::new(params.long_high_period),
            volume_max: RollingMax::new(params.volume_max_period),
            rsi: Rsi::new(params.rsi_period),
            macd: Macd::new(
                params.macd_fast,
                params.macd_slow,
                params.macd_signal,
                MacdLine::Macd,
            ),
            macd_signal: Macd::new(
                params.macd_fast,
                params.macd_slow,
                params.macd_signal,
                MacdLine::Signal,
            ),
            params,
        }
    }

    pub fn params(&self) -> &ScreenParams {
        &self.params
    }

    /// Evaluate the series at its last bar.
    pub fn evaluate(&self, series: &Series) -> Result<SignalReport, EvalError> {
        let n = series.len();
        let required = self.params.required_bars();
        let last = match series.last() {
            Some(bar) if n >= required => bar,
            _ => {
                return Err(EvalError::InsufficientData {
                    required,
                    available: n,
                })
            }
        };
        let eval = n - 1;
        let prior = eval - 1;

        let closes = series.closes();
        let volumes = series.volumes();

        let price = last.close;
        if !price.is_finite() {
            return Err(EvalError::ComputationError {
                indicator: "close".into(),
                index: eval,
            });
        }
        let volume = last.volume as f64;

        let sma_series = self.sma.compute(&closes);
        let sma50 = read(&self.sma, &sma_series, eval)?;
        let ema10 = read(&self.ema, &self.ema.compute(&closes), eval)?;
        let avg_volume20 = read(&self.volume_avg, &self.volume_avg.compute(&volumes), eval)?;
        let high20 = read(&self.short_high, &self.short_high.compute(&closes), prior)?;
        let high60 = read(&self.long_high, &self.long_high.compute(&closes), prior)?;
        let max_volume10 = read(&self.volume_max, &self.volume_max.compute(&volumes), prior)?;

        let sma50_prev_offset15 = self.sma_offset(&sma_series, n, self.params.slope_near_offset)?;
        let sma50_prev_offset25 = self.sma_offset(&sma_series, n, self.params.slope_far_offset)?;

        let rsi14 = read(&self.rsi, &self.rsi.compute(&closes), eval)?;
        let macd = read(&self.macd, &self.macd.compute(&closes), eval)?;
        let macd_signal = read(&self.macd_signal, &self.macd_signal.compute(&closes), eval)?;

        let breakout20 = price > high20;
        let breakout60 = price > high60;
        let breakout_confirmed =
            volume >= self.params.volume_multiple * avg_volume20 && volume >= max_volume10;
        let price_above_sma50 = price > sma50;
        let price_above_ema10 = price > ema10;
        let sma50_rising = match (sma50_prev_offset15, sma50_prev_offset25) {
            (Some(near), Some(far)) => sma50 > near && near > far,
            _ => false,
        };
        let rsi_in_range = self.params.rsi_lower < rsi14 && rsi14 < self.params.rsi_upper;
        let macd_bullish = macd > macd_signal;

        let core = [
            breakout20 || breakout60,
            breakout_confirmed,
            price_above_sma50,
            price_above_ema10,
            sma50_rising,
        ];
        let core_criteria_score = core.iter().filter(|&&c| c).count() as u8;

        Ok(SignalReport {
            ticker: series.ticker().to_string(),
            price,
            volume: last.volume,
            sma50,
            ema10,
            rsi14,
            macd,
            macd_signal,
            high20,
            high60,
            avg_volume20,
            max_volume10,
            sma50_prev_offset15,
            sma50_prev_offset25,
            breakout20,
            breakout60,
            breakout_confirmed,
            price_above_sma50,
            price_above_ema10,
            sma50_rising,
            rsi_in_range,
            macd_bullish,
            core_criteria_met: core.iter().all(|&c| c),
            core_criteria_score,
        })
    }

    /// SMA value `offset` bars before the evaluation bar, or `None` when the
    /// series is too short for it to exist.
    fn sma_offset(
        &self,
        sma_series: &[f64],
        n: usize,
        offset: usize,
    ) -> Result<Option<f64>, EvalError> {
        if n < self.params.bars_for_sma_offset(offset) {
            return Ok(None);
        }
        read(&self.sma, sma_series, n - 1 - offset).map(Some)
    }
}

fn read(indicator: &dyn Indicator, values: &[f64], index: usize) -> Result<f64, EvalError> {
    match values.get(index) {
        Some(v) if v.is_finite() => Ok(*v),
        _ => Err(EvalError::ComputationError {
            indicator: indicator.name().to_string(),
            index,
        }),
    }
}
