//! TrendScan CLI: screening, catalog import, market value, and cache commands.
//!
//! Commands:
//! - `screen`: evaluate every group of a catalog and write HTML/JSON/CSV reports
//! - `import`: convert a spreadsheet CSV export into a JSON group catalog
//! - `market-value`: daily market and book value of a holdings file
//! - `cache status`: list cached tickers with fetch time and size
//! - `cache clean`: remove entries fetched more than N days ago

mod logging;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trendscan_core::catalog::GroupCatalog;
use trendscan_core::data::{
    CachedHistory, CircuitBreaker, DataProvider, DirectHistory, HistoryCache, HistoryProvider,
    SyntheticProvider, YahooProvider,
};
use trendscan_core::engine::{SignalEngine, TickerReport};
use trendscan_runner::market_value::{value_portfolio, write_totals_csv, write_valuation_csv};
use trendscan_runner::report::{write_reports_csv, write_run_json};
use trendscan_runner::{
    run_screen, HtmlReport, Holdings, ReportRenderer, ScreenConfig, ScreenOptions, ScreenProgress,
    ScreenRun,
};

#[derive(Parser)]
#[command(
    name = "trendscan",
    about = "TrendScan CLI: breakout and trend screener for equity groups"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where history comes from; shared by `screen` and `market-value`.
#[derive(clap::Args)]
struct SourceArgs {
    /// Offline mode: cached history only, regardless of age.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Use deterministic synthetic history instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Cache directory. Defaults to the config value or ./data/cache.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Cached entries younger than this are reused without fetching.
    #[arg(long)]
    max_age_hours: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a group catalog and write reports.
    Screen {
        /// Group catalog (.json export, .toml or .csv). Defaults to the built-in catalog.
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Path to a TOML screening config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only screen groups in this sector (case-insensitive).
        #[arg(long)]
        sector: Option<String>,

        #[command(flatten)]
        source: SourceArgs,

        /// HTML report output path.
        #[arg(long, default_value = "report.html")]
        html: PathBuf,

        /// Also write the full run as JSON.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Also write one CSV row per ticker.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Order each group by descending score.
        #[arg(long, default_value_t = false)]
        sort: bool,
    },
    /// Convert a spreadsheet CSV export (Sector, Subsector, Company Ticker Symbols) to JSON.
    Import {
        /// CSV file to import.
        #[arg(long)]
        csv: PathBuf,

        /// Output catalog path.
        #[arg(long, default_value = "groups.json")]
        output: PathBuf,
    },
    /// Daily market value and book value of a holdings file.
    MarketValue {
        /// Holdings TOML file.
        #[arg(long)]
        holdings: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        /// Per-symbol CSV output; totals go to `<stem>_totals.csv` beside it.
        #[arg(long, default_value = "market_value.csv")]
        output: PathBuf,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached tickers with fetch time, bar count and size.
    Status {
        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,
    },
    /// Remove entries fetched more than the given number of days ago.
    Clean {
        /// Remove entries older than this many days.
        #[arg(long)]
        older_than_days: u32,

        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,

        /// Actually delete (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Screen {
            catalog,
            config,
            sector,
            source,
            html,
            json,
            csv,
            sort,
        } => run_screen_cmd(catalog, config, sector, source, html, json, csv, sort),
        Commands::Import { csv, output } => run_import(&csv, &output),
        Commands::MarketValue {
            holdings,
            source,
            output,
        } => run_market_value(&holdings, source, &output),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => run_cache_status(&cache_dir),
            CacheAction::Clean {
                older_than_days,
                cache_dir,
                confirm,
            } => run_cache_clean(&cache_dir, older_than_days, confirm),
        },
    }
}

/// Build the history source from flags layered over the config's `[data]` table.
fn build_history(source: &SourceArgs, config: &ScreenConfig) -> Result<Box<dyn HistoryProvider>> {
    if source.offline && source.synthetic {
        bail!("--offline and --synthetic are mutually exclusive");
    }

    let mut data = config.data.clone();
    if let Some(dir) = &source.cache_dir {
        data.cache_dir = dir.clone();
    }
    if let Some(hours) = source.max_age_hours {
        if hours <= 0 {
            bail!("--max-age-hours must be positive, got {hours}");
        }
        data.max_age_hours = hours;
    }

    if source.synthetic {
        tracing::warn!("using synthetic history; results are not market data");
        return Ok(Box::new(
            DirectHistory::new(Box::new(SyntheticProvider::new()))
                .with_lookback_days(data.lookback_days),
        ));
    }

    let cache = HistoryCache::new(&data.cache_dir);
    let provider: Option<Box<dyn DataProvider>> = if source.offline {
        None
    } else {
        let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
        Some(Box::new(YahooProvider::new(circuit_breaker)?))
    };

    Ok(Box::new(
        CachedHistory::new(cache, provider)
            .with_policy(data.staleness())
            .with_lookback_days(data.lookback_days),
    ))
}

#[allow(clippy::too_many_arguments)]
fn run_screen_cmd(
    catalog_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    sector: Option<String>,
    source: SourceArgs,
    html_path: PathBuf,
    json_path: Option<PathBuf>,
    csv_path: Option<PathBuf>,
    sort: bool,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => ScreenConfig::from_file(path)?,
        None => ScreenConfig::default(),
    };
    if catalog_path.is_some() {
        config.catalog = catalog_path;
    }
    if sector.is_some() {
        config.sector = sector;
    }

    let catalog = match &config.catalog {
        Some(path) => GroupCatalog::from_file(path)?,
        None => GroupCatalog::default_us(),
    };
    let groups = catalog.list_groups(config.sector.as_deref());
    if groups.is_empty() {
        match &config.sector {
            Some(s) => bail!(
                "no groups in sector '{s}'. Available: {}",
                catalog.sectors().join(", ")
            ),
            None => bail!("catalog has no groups"),
        }
    }

    let engine = SignalEngine::new(config.params.clone())?;
    let history = build_history(&source, &config)?;

    let progress = |p: &ScreenProgress| {
        println!(
            "[{}/{}] {} ({}/{} tickers, {:.1}s)",
            p.groups_complete,
            p.groups_total,
            p.group_label,
            p.tickers_complete,
            p.tickers_total,
            p.elapsed_secs
        );
    };
    let run = run_screen(
        &engine,
        history.as_ref(),
        &groups,
        ScreenOptions {
            sort_by_score: sort,
        },
        Some(&progress),
    );

    print_summary(&run);

    std::fs::write(&html_path, HtmlReport::default().render(&run))
        .with_context(|| format!("Failed to write HTML report {}", html_path.display()))?;
    println!("HTML report saved to: {}", html_path.display());
    if let Some(path) = json_path {
        write_run_json(&path, &run)?;
        println!("JSON saved to: {}", path.display());
    }
    if let Some(path) = csv_path {
        write_reports_csv(&path, &run)?;
        println!("CSV saved to: {}", path.display());
    }
    Ok(())
}

fn print_summary(run: &ScreenRun) {
    println!();
    println!("=== Screen Result ===");
    println!("Tickers:        {}", run.ticker_count());
    println!("Passing:        {}", run.passing_count());
    println!("Invalid:        {}", run.invalid_count());
    println!();
    println!(
        "{:<34} {:<8} {:>8} {:>6} {:>6}",
        "Group", "Ticker", "Price", "RSI", "Score"
    );
    println!("{}", "-".repeat(66));
    for group in &run.groups {
        for report in &group.reports {
            if let TickerReport::Evaluated(r) = report {
                if r.core_criteria_score >= 4 {
                    println!(
                        "{:<34} {:<8} {:>8.2} {:>6.1} {:>4}/5",
                        group.label(),
                        r.ticker,
                        r.price,
                        r.rsi14,
                        r.core_criteria_score
                    );
                }
            }
        }
    }
    println!();
}

fn run_import(csv_path: &Path, output: &Path) -> Result<()> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open {}", csv_path.display()))?;
    let catalog = GroupCatalog::import_csv(file)?;
    std::fs::write(output, catalog.to_json()?)
        .with_context(|| format!("Failed to write catalog {}", output.display()))?;
    println!(
        "Imported {} groups ({} tickers) into {}",
        catalog.groups.len(),
        catalog.ticker_count(),
        output.display()
    );
    Ok(())
}

fn run_market_value(holdings_path: &Path, source: SourceArgs, output: &Path) -> Result<()> {
    let holdings = Holdings::from_file(holdings_path)?;
    let history = build_history(&source, &ScreenConfig::default())?;
    let today = chrono::Local::now().date_naive();

    let valuation = value_portfolio(&holdings, history.as_ref(), today);

    for (symbol, reason) in &valuation.unavailable {
        println!("WARNING: no data for {symbol}: {reason}");
    }
    for v in &valuation.symbols {
        for p in &v.skipped {
            println!(
                "WARNING: purchase of {} {} on {} is after available data",
                p.shares, v.symbol, p.date
            );
        }
        for p in &v.before_history {
            println!(
                "WARNING: purchase of {} {} on {} predates available data",
                p.shares, v.symbol, p.date
            );
        }
        if let Some(last) = v.rows.last() {
            println!(
                "{:<10} {:>10.2} shares  market {:>12.2}  book {:>12.2}",
                v.symbol, last.shares_held, last.market_value, last.book_value
            );
        }
    }
    if let Some(total) = valuation.totals.last() {
        println!(
            "{:<10} {:>17}  market {:>12.2}  book {:>12.2}",
            "TOTAL", total.date, total.market_value, total.book_value
        );
    }

    let totals_path = totals_path(output);
    write_valuation_csv(output, &valuation)?;
    write_totals_csv(&totals_path, &valuation)?;
    println!("Saved: {} and {}", output.display(), totals_path.display());
    Ok(())
}

/// `out/market_value.csv` → `out/market_value_totals.csv`
fn totals_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "market_value".into());
    output.with_file_name(format!("{stem}_totals.csv"))
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let rows = HistoryCache::new(cache_dir).status()?;
    if rows.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    let total_size: u64 = rows.iter().map(|r| r.size_bytes).sum();
    println!("Cache: {}", cache_dir.display());
    println!("Tickers: {}", rows.len());
    println!("Total size: {}", format_size(total_size));
    println!();
    println!("{:<10} {:<20} {:<12} {:>10}", "Ticker", "Fetched (UTC)", "Bars", "Size");
    println!("{}", "-".repeat(55));
    for row in &rows {
        let bars = if row.delisted {
            "delisted".to_string()
        } else {
            format!("{} bars", row.bar_count)
        };
        println!(
            "{:<10} {:<20} {:<12} {:>10}",
            row.ticker,
            row.fetched_at.format("%Y-%m-%d %H:%M"),
            bars,
            format_size(row.size_bytes)
        );
    }

    Ok(())
}

fn run_cache_clean(cache_dir: &Path, older_than_days: u32, confirm: bool) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cutoff = chrono::Utc::now() - chrono::Duration::days(i64::from(older_than_days));
    let removed = HistoryCache::new(cache_dir).clean(cutoff, !confirm)?;

    if removed.is_empty() {
        println!("No entries older than {older_than_days} days to remove.");
        return Ok(());
    }

    println!(
        "Found {} entr{} older than {older_than_days} days:",
        removed.len(),
        if removed.len() == 1 { "y" } else { "ies" }
    );
    for ticker in &removed {
        println!("  {ticker}");
    }

    if !confirm {
        println!();
        println!("Dry run. Pass --confirm to actually delete.");
        return Ok(());
    }

    println!("Done. Removed {} entries.", removed.len());
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
