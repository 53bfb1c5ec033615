//! Group: a sector/subsector bucket of tickers to screen together.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub sector: String,
    pub subsector: String,
    pub tickers: Vec<String>,
}

impl Group {
    pub fn new(
        sector: impl Into<String>,
        subsector: impl Into<String>,
        tickers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            sector: sector.into(),
            subsector: subsector.into(),
            tickers: tickers.into_iter().map(Into::into).collect(),
        }
    }

    /// Display label, e.g. "Health Care / Biotechnology".
    pub fn label(&self) -> String {
        if self.subsector.is_empty() {
            self.sector.clone()
        } else {
            format!("{} / {}", self.sector, self.subsector)
        }
    }
}
