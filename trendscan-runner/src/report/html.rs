//! HTML report generator.

use super::ReportRenderer;
use crate::screen::{GroupResult, ScreenRun};
use std::borrow::Cow;
use trendscan_core::engine::{SignalReport, TickerReport};

pub struct HtmlReport {
    pub title: String,
}

impl Default for HtmlReport {
    fn default() -> Self {
        Self {
            title: "Stock Screener Report".into(),
        }
    }
}

/// Escape text for element content and double-quoted attributes.
pub fn escape(text: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(text)
}

const COLUMNS: [&str; 16] = [
    "Ticker", "Price", "Volume", "SMA50", "EMA10", "High20", "High60", "AvgVol20", "RSI14",
    "MACD", "Breakout", "Vol Confirmed", "Above SMA50", "Above EMA10", "SMA50 Rising", "Score",
];

fn flag(value: bool) -> &'static str {
    if value {
        "<td class=\"yes\">&#10003;</td>"
    } else {
        "<td class=\"no\">&#10007;</td>"
    }
}

fn evaluated_row(r: &SignalReport) -> String {
    let row_class = if r.core_criteria_met { " class=\"pass\"" } else { "" };
    format!(
        "<tr{row_class}><td>{}</td><td>{:.2}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td>\
<td>{:.2}</td><td>{:.2}</td><td>{:.0}</td><td>{:.1}</td><td>{:.3} / {:.3}</td>\
{}{}{}{}{}<td>{}/5</td></tr>\n",
        escape(&r.ticker),
        r.price,
        r.volume,
        r.sma50,
        r.ema10,
        r.high20,
        r.high60,
        r.avg_volume20,
        r.rsi14,
        r.macd,
        r.macd_signal,
        flag(r.breakout20 || r.breakout60),
        flag(r.breakout_confirmed),
        flag(r.price_above_sma50),
        flag(r.price_above_ema10),
        flag(r.sma50_rising),
        r.core_criteria_score,
    )
}

fn group_section(out: &mut String, group: &GroupResult) {
    out.push_str(&format!("<section>\n<h2>{}</h2>\n", escape(&group.label())));

    if group.reports.is_empty() {
        out.push_str("<p>No tickers evaluated.</p>\n");
    } else {
        out.push_str("<table>\n<thead><tr>");
        for col in COLUMNS {
            out.push_str(&format!("<th>{col}</th>"));
        }
        out.push_str("</tr></thead>\n<tbody>\n");
        for report in &group.reports {
            match report {
                TickerReport::Evaluated(r) => out.push_str(&evaluated_row(r)),
                TickerReport::Failed(f) => out.push_str(&format!(
                    "<tr class=\"failed\"><td>{}</td><td colspan=\"{}\">{:?}: {}</td></tr>\n",
                    escape(&f.ticker),
                    COLUMNS.len() - 1,
                    f.error,
                    escape(&f.detail)
                )),
            }
        }
        out.push_str("</tbody>\n</table>\n");
    }

    if !group.invalid.is_empty() {
        out.push_str("<p class=\"invalid\">Invalid tickers: ");
        let list: Vec<String> = group
            .invalid
            .iter()
            .map(|i| format!("<span title=\"{}\">{}</span>", escape(&i.reason), escape(&i.ticker)))
            .collect();
        out.push_str(&list.join(", "));
        out.push_str("</p>\n");
    }
    out.push_str("</section>\n");
}

impl ReportRenderer for HtmlReport {
    fn render(&self, run: &ScreenRun) -> String {
        let title = escape(&self.title);
        let mut out = format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<title>{title}</title>\n<style>\n\
body {{ font-family: sans-serif; margin: 2em; }}\n\
table {{ border-collapse: collapse; }}\n\
th, td {{ border: 1px solid #ccc; padding: 2px 6px; text-align: right; }}\n\
tr.pass {{ background: #e6f4ea; }}\n\
tr.failed td {{ color: #888; text-align: left; }}\n\
td.yes {{ color: #188038; }} td.no {{ color: #c5221f; }}\n\
</style>\n</head>\n<body>\n<h1>{title}</h1>\n\
<p>Generated {} &middot; {} tickers &middot; {} passing &middot; {} invalid</p>\n",
            run.generated_at.format("%Y-%m-%d %H:%M UTC"),
            run.ticker_count(),
            run.passing_count(),
            run.invalid_count(),
        );

        for group in &run.groups {
            group_section(&mut out, group);
        }

        out.push_str("</body>\n</html>\n");
        out
    }
}
