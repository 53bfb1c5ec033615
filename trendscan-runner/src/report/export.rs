//! JSON and CSV export of a screening run.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use trendscan_core::engine::TickerReport;

use crate::screen::ScreenRun;

pub fn write_run_json(path: &Path, run: &ScreenRun) -> Result<()> {
    let json = serde_json::to_string_pretty(run).context("Failed to serialize screen run")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write run JSON {}", path.display()))?;
    Ok(())
}

/// One CSV row: group columns, then the report. Failed reports leave the
/// indicator columns empty and fill `error`.
#[derive(Serialize)]
struct CsvRow<'a> {
    sector: &'a str,
    subsector: &'a str,
    ticker: &'a str,
    error: Option<String>,
    price: Option<f64>,
    volume: Option<u64>,
    sma50: Option<f64>,
    ema10: Option<f64>,
    rsi14: Option<f64>,
    macd: Option<f64>,
    macd_signal: Option<f64>,
    high20: Option<f64>,
    high60: Option<f64>,
    avg_volume20: Option<f64>,
    max_volume10: Option<f64>,
    sma50_prev_offset15: Option<f64>,
    sma50_prev_offset25: Option<f64>,
    breakout20: Option<bool>,
    breakout60: Option<bool>,
    breakout_confirmed: Option<bool>,
    price_above_sma50: Option<bool>,
    price_above_ema10: Option<bool>,
    sma50_rising: Option<bool>,
    rsi_in_range: Option<bool>,
    macd_bullish: Option<bool>,
    core_criteria_met: Option<bool>,
    core_criteria_score: Option<u8>,
}

impl<'a> CsvRow<'a> {
    fn new(sector: &'a str, subsector: &'a str, report: &'a TickerReport) -> Self {
        let r = report.report();
        Self {
            sector,
            subsector,
            ticker: report.ticker(),
            error: match report {
                TickerReport::Failed(f) => Some(f.detail.clone()),
                TickerReport::Evaluated(_) => None,
            },
            price: r.map(|r| r.price),
            volume: r.map(|r| r.volume),
            sma50: r.map(|r| r.sma50),
            ema10: r.map(|r| r.ema10),
            rsi14: r.map(|r| r.rsi14),
            macd: r.map(|r| r.macd),
            macd_signal: r.map(|r| r.macd_signal),
            high20: r.map(|r| r.high20),
            high60: r.map(|r| r.high60),
            avg_volume20: r.map(|r| r.avg_volume20),
            max_volume10: r.map(|r| r.max_volume10),
            sma50_prev_offset15: r.and_then(|r| r.sma50_prev_offset15),
            sma50_prev_offset25: r.and_then(|r| r.sma50_prev_offset25),
            breakout20: r.map(|r| r.breakout20),
            breakout60: r.map(|r| r.breakout60),
            breakout_confirmed: r.map(|r| r.breakout_confirmed),
            price_above_sma50: r.map(|r| r.price_above_sma50),
            price_above_ema10: r.map(|r| r.price_above_ema10),
            sma50_rising: r.map(|r| r.sma50_rising),
            rsi_in_range: r.map(|r| r.rsi_in_range),
            macd_bullish: r.map(|r| r.macd_bullish),
            core_criteria_met: r.map(|r| r.core_criteria_met),
            core_criteria_score: r.map(|r| r.core_criteria_score),
        }
    }
}

/// Every report of the run, one row per ticker, in run order.
pub fn write_reports_csv(path: &Path, run: &ScreenRun) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create reports CSV {}", path.display()))?;
    for group in &run.groups {
        for report in &group.reports {
            writer
                .serialize(CsvRow::new(&group.sector, &group.subsector, report))
                .with_context(|| format!("Failed to write CSV row for {}", report.ticker()))?;
        }
    }
    writer.flush().context("Failed to flush reports CSV")?;
    Ok(())
}
