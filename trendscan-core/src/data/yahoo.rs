//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API with bounded retries,
//! exponential backoff and a shared circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; parse failures surface as `ResponseFormatChanged`.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Client(e.to_string()))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = (end + chrono::Duration::days(1))
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp()
            - 1;
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // A listed symbol with no trades in range has no timestamps
        let timestamps = data.timestamp.unwrap_or_default();

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            // Rows without a close are holidays or halted sessions
            let Some(close) = quote.close.get(i).copied().flatten() else {
                continue;
            };
            let field = |col: &Vec<Option<f64>>| col.get(i).copied().flatten().unwrap_or(close);

            bars.push(Bar {
                date,
                open: field(&quote.open),
                high: field(&quote.high),
                low: field(&quote.low),
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        Ok(bars)
    }

    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = Self::chart_url(symbol, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(symbol, attempt, ?delay, "retrying chart request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            match status {
                reqwest::StatusCode::FORBIDDEN => {
                    self.circuit_breaker.trip();
                    return Err(DataError::CircuitBreakerTripped);
                }
                reqwest::StatusCode::NOT_FOUND => {
                    self.circuit_breaker.record_success();
                    return Err(DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    });
                }
                reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    self.circuit_breaker.record_failure();
                    let retry_after = resp
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(60);
                    last_error = Some(DataError::RateLimited {
                        retry_after_secs: retry_after,
                    });
                    continue;
                }
                s if !s.is_success() => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(DataError::Other(format!("HTTP {s} for {symbol}")));
                    continue;
                }
                _ => {}
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            })?;

            let bars = Self::parse_response(symbol, chart)?;
            self.circuit_breaker.record_success();
            return Ok(bars);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars = self.fetch_with_retry(symbol, start, end)?;
        tracing::debug!(symbol, bars = bars.len(), "fetched from yahoo");
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<Bar>, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("TEST", resp)
    }

    #[test]
    fn parses_quotes_and_skips_missing_closes() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704205800,1704292200,1704378600],
            "indicators":{"quote":[{"open":[100.0,null,102.0],"high":[101.0,null,null],
            "low":[99.0,null,101.0],"close":[100.5,null,102.5],"volume":[1000,null,null]}]}}],
            "error":null}}"#;
        let bars = parse(json).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 100.5);
        assert_eq!(bars[0].volume, 1000);
        // Missing high falls back to close, missing volume to zero
        assert_eq!(bars[1].high, 102.5);
        assert_eq!(bars[1].volume, 0);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,
            "error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(parse(json), Err(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn other_errors_are_format_changes() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"x"}}}"#;
        assert!(matches!(parse(json), Err(DataError::ResponseFormatChanged(_))));
    }

    #[test]
    fn chart_url_covers_whole_end_day() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let url = YahooProvider::chart_url("SPY", start, end);
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1704153599"));
    }
}
