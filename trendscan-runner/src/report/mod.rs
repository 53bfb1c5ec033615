//! Rendering and export of screening runs.

pub mod export;
pub mod html;

pub use export::{write_reports_csv, write_run_json};
pub use html::HtmlReport;

use crate::screen::ScreenRun;

/// Turns a finished run into a document.
pub trait ReportRenderer {
    fn render(&self, run: &ScreenRun) -> String;
}
