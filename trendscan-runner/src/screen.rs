//! Screening orchestration: groups of tickers through history and the engine.
//!
//! Within a group, tickers are fetched and evaluated in parallel with rayon.
//! Indexed parallel iterators collect in input order, so reports come out in
//! catalog order regardless of which worker finished first.
//!
//! Per-ticker isolation:
//! - a delisted or unfetchable ticker lands in the group's `invalid` list
//! - an evaluation failure becomes a `FailedReport`; it is never dropped

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use trendscan_core::data::{History, HistoryProvider};
use trendscan_core::domain::Group;
use trendscan_core::engine::{ScreenParams, SignalEngine, TickerReport};

/// A ticker that produced no series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidTicker {
    pub ticker: String,
    pub reason: String,
}

/// Screening outcome for one group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupResult {
    pub sector: String,
    pub subsector: String,
    pub reports: Vec<TickerReport>,
    pub invalid: Vec<InvalidTicker>,
}

impl GroupResult {
    pub fn label(&self) -> String {
        if self.subsector.is_empty() {
            self.sector.clone()
        } else {
            format!("{} / {}", self.sector, self.subsector)
        }
    }

    /// Reports that met every core criterion.
    pub fn passing(&self) -> impl Iterator<Item = &TickerReport> {
        self.reports
            .iter()
            .filter(|r| r.report().is_some_and(|s| s.core_criteria_met))
    }

    /// Order by descending score, failed reports last, ties by ticker.
    pub fn sort_by_score(&mut self) {
        self.reports.sort_by(|a, b| {
            b.score()
                .cmp(&a.score())
                .then_with(|| a.ticker().cmp(b.ticker()))
        });
    }
}

/// A complete screening run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenRun {
    pub generated_at: DateTime<Utc>,
    pub params: ScreenParams,
    pub groups: Vec<GroupResult>,
}

impl ScreenRun {
    pub fn ticker_count(&self) -> usize {
        self.groups
            .iter()
            .map(|g| g.reports.len() + g.invalid.len())
            .sum()
    }

    pub fn passing_count(&self) -> usize {
        self.groups.iter().map(|g| g.passing().count()).sum()
    }

    pub fn invalid_count(&self) -> usize {
        self.groups.iter().map(|g| g.invalid.len()).sum()
    }
}

/// Progress update sent after each group completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenProgress {
    pub group_label: String,
    pub groups_complete: usize,
    pub groups_total: usize,
    pub tickers_complete: usize,
    pub tickers_total: usize,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScreenOptions {
    pub sort_by_score: bool,
}

enum Outcome {
    Report(TickerReport),
    Invalid(InvalidTicker),
}

/// Bars to request so every field of the report can be populated.
fn bars_wanted(params: &ScreenParams) -> usize {
    params
        .required_bars()
        .max(params.bars_for_sma_offset(params.slope_far_offset))
}

fn screen_ticker(
    engine: &SignalEngine,
    history: &dyn HistoryProvider,
    ticker: &str,
    min_bars: usize,
) -> Outcome {
    match history.history(ticker, min_bars) {
        Ok(History::Series(series)) => {
            let result = engine.evaluate(&series);
            match &result {
                Ok(report) => tracing::debug!(ticker, score = report.core_criteria_score, "evaluated"),
                Err(e) => tracing::debug!(ticker, error = %e, "evaluation failed"),
            }
            Outcome::Report(TickerReport::from_result(ticker, result))
        }
        Ok(History::Delisted) => {
            tracing::debug!(ticker, "delisted");
            Outcome::Invalid(InvalidTicker {
                ticker: ticker.to_string(),
                reason: "delisted or unknown symbol".into(),
            })
        }
        Err(e) => {
            tracing::warn!(ticker, error = %e, "history unavailable");
            Outcome::Invalid(InvalidTicker {
                ticker: ticker.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Screen every ticker of one group.
pub fn screen_group(
    engine: &SignalEngine,
    history: &dyn HistoryProvider,
    group: &Group,
) -> GroupResult {
    let min_bars = bars_wanted(engine.params());

    let outcomes: Vec<Outcome> = group
        .tickers
        .par_iter()
        .map(|ticker| screen_ticker(engine, history, ticker, min_bars))
        .collect();

    let mut reports = Vec::with_capacity(outcomes.len());
    let mut invalid = Vec::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Report(r) => reports.push(r),
            Outcome::Invalid(i) => invalid.push(i),
        }
    }

    GroupResult {
        sector: group.sector.clone(),
        subsector: group.subsector.clone(),
        reports,
        invalid,
    }
}

/// Screen all groups in order.
///
/// `progress_cb` is invoked after each group with cumulative counts.
pub fn run_screen(
    engine: &SignalEngine,
    history: &dyn HistoryProvider,
    groups: &[&Group],
    options: ScreenOptions,
    progress_cb: Option<&dyn Fn(&ScreenProgress)>,
) -> ScreenRun {
    let start = Instant::now();
    let tickers_total: usize = groups.iter().map(|g| g.tickers.len()).sum();
    let mut tickers_complete = 0;
    let mut results = Vec::with_capacity(groups.len());

    tracing::info!(groups = groups.len(), tickers = tickers_total, "screen started");

    for (i, group) in groups.iter().enumerate() {
        let mut result = screen_group(engine, history, group);
        if options.sort_by_score {
            result.sort_by_score();
        }
        tickers_complete += group.tickers.len();

        tracing::info!(
            group = %group.label(),
            reports = result.reports.len(),
            invalid = result.invalid.len(),
            passing = result.passing().count(),
            "group screened"
        );

        if let Some(cb) = progress_cb {
            cb(&ScreenProgress {
                group_label: group.label(),
                groups_complete: i + 1,
                groups_total: groups.len(),
                tickers_complete,
                tickers_total,
                elapsed_secs: start.elapsed().as_secs_f64(),
            });
        }
        results.push(result);
    }

    let run = ScreenRun {
        generated_at: Utc::now(),
        params: engine.params().clone(),
        groups: results,
    };
    tracing::info!(
        tickers = run.ticker_count(),
        passing = run.passing_count(),
        invalid = run.invalid_count(),
        elapsed_secs = start.elapsed().as_secs_f64(),
        "screen finished"
    );
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use trendscan_core::engine::{EvalError, SignalReport};

    fn evaluated(ticker: &str, score: u8) -> TickerReport {
        TickerReport::Evaluated(SignalReport {
            ticker: ticker.into(),
            price: 1.0,
            volume: 1,
            sma50: 1.0,
            ema10: 1.0,
            rsi14: 50.0,
            macd: 0.0,
            macd_signal: 0.0,
            high20: 1.0,
            high60: 1.0,
            avg_volume20: 1.0,
            max_volume10: 1.0,
            sma50_prev_offset15: None,
            sma50_prev_offset25: None,
            breakout20: false,
            breakout60: false,
            breakout_confirmed: false,
            price_above_sma50: false,
            price_above_ema10: false,
            sma50_rising: false,
            rsi_in_range: false,
            macd_bullish: false,
            core_criteria_met: score == 5,
            core_criteria_score: score,
        })
    }

    fn failed(ticker: &str) -> TickerReport {
        TickerReport::from_result(
            ticker,
            Err(EvalError::InsufficientData {
                required: 61,
                available: 10,
            }),
        )
    }

    #[test]
    fn sort_by_score_is_deterministic() {
        let mut group = GroupResult {
            sector: "S".into(),
            subsector: "T".into(),
            reports: vec![
                failed("AAA"),
                evaluated("ZZZ", 3),
                evaluated("BBB", 5),
                evaluated("CCC", 3),
            ],
            invalid: vec![],
        };
        group.sort_by_score();
        let order: Vec<&str> = group.reports.iter().map(|r| r.ticker()).collect();
        assert_eq!(order, vec!["BBB", "CCC", "ZZZ", "AAA"]);
        assert_eq!(group.passing().count(), 1);
    }

    proptest! {
        #[test]
        fn sorted_scores_never_increase(scores in prop::collection::vec(prop::option::of(0u8..=5), 0..40)) {
            let reports = scores
                .iter()
                .enumerate()
                .map(|(i, s)| match s {
                    Some(score) => evaluated(&format!("T{i:02}"), *score),
                    None => failed(&format!("T{i:02}")),
                })
                .collect::<Vec<_>>();
            let mut group = GroupResult {
                sector: "S".into(),
                subsector: String::new(),
                reports,
                invalid: vec![],
            };
            group.sort_by_score();

            prop_assert_eq!(group.reports.len(), scores.len());
            for pair in group.reports.windows(2) {
                prop_assert!(pair[0].score() >= pair[1].score());
                if pair[0].score() == pair[1].score() {
                    prop_assert!(pair[0].ticker() < pair[1].ticker());
                }
            }
        }
    }

    #[test]
    fn wants_enough_bars_for_both_slope_references() {
        assert_eq!(bars_wanted(&ScreenParams::default()), 75);
    }
}
