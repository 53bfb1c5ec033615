//! TrendScan Runner: screening orchestration, run configuration, reports,
//! and portfolio market value.
//!
//! This crate builds on `trendscan-core` to provide:
//! - TOML run configuration with defaults
//! - Parallel per-group screening with per-ticker isolation
//! - HTML rendering plus JSON and CSV export
//! - Holdings valuation over cached history

pub mod config;
pub mod market_value;
pub mod report;
pub mod screen;

pub use config::{ConfigError, DataConfig, ScreenConfig};
pub use market_value::{value_portfolio, Holdings, HoldingsError, PortfolioValuation};
pub use report::{HtmlReport, ReportRenderer};
pub use screen::{
    run_screen, screen_group, GroupResult, InvalidTicker, ScreenOptions, ScreenProgress, ScreenRun,
};
