//! Group catalog: sector → subsector → tickers.
//!
//! Two on-disk shapes are accepted:
//! - the spreadsheet export, a JSON array of records with `Sector`,
//!   `Subsector` and a comma-separated `Company Ticker Symbols` column
//! - TOML with a `[[groups]]` table per group
//!
//! `import_csv` converts a CSV export of the same spreadsheet into a catalog.

use crate::domain::Group;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parse catalog TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("parse catalog CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported catalog extension for {0} (expected .json, .toml or .csv)")]
    UnsupportedFormat(PathBuf),
}

/// One record of the spreadsheet export.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExportRecord {
    #[serde(rename = "Sector")]
    sector: String,
    #[serde(rename = "Subsector")]
    subsector: String,
    #[serde(rename = "Company Ticker Symbols")]
    tickers: String,
}

impl ExportRecord {
    fn into_group(self) -> Group {
        Group::new(
            self.sector.trim(),
            self.subsector.trim(),
            split_tickers(&self.tickers),
        )
    }

    fn from_group(group: &Group) -> Self {
        Self {
            sector: group.sector.clone(),
            subsector: group.subsector.clone(),
            tickers: group.tickers.join(", "),
        }
    }
}

/// `"A, B,,C "` → `["A", "B", "C"]`.
fn split_tickers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupCatalog {
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl GroupCatalog {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let records: Vec<ExportRecord> = serde_json::from_str(content)?;
        Ok(Self::new(
            records.into_iter().map(ExportRecord::into_group).collect(),
        ))
    }

    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(content)?)
    }

    /// Load by extension: `.json`, `.toml`, or `.csv` (via [`Self::import_csv`]).
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let read = || {
            std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        match ext.as_deref() {
            Some("json") => Self::from_json(&read()?),
            Some("toml") => Self::from_toml(&read()?),
            Some("csv") => {
                let file = std::fs::File::open(path).map_err(|source| CatalogError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::import_csv(file)
            }
            _ => Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Build a catalog from a CSV with `Sector`, `Subsector` and
    /// `Company Ticker Symbols` headers. Blank rows are skipped.
    pub fn import_csv<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut groups = Vec::new();
        for record in rdr.deserialize::<ExportRecord>() {
            let record = record?;
            if record.sector.is_empty() && record.tickers.is_empty() {
                continue;
            }
            groups.push(record.into_group());
        }
        Ok(Self::new(groups))
    }

    /// Serialize in the spreadsheet-export JSON shape.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let records: Vec<ExportRecord> = self.groups.iter().map(ExportRecord::from_group).collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// Groups whose sector matches `sector` case-insensitively, in catalog
    /// order. `None` returns every group.
    pub fn list_groups(&self, sector: Option<&str>) -> Vec<&Group> {
        self.groups
            .iter()
            .filter(|g| sector.map_or(true, |s| g.sector.trim().eq_ignore_ascii_case(s.trim())))
            .collect()
    }

    /// Distinct sector names in first-seen order.
    pub fn sectors(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for g in &self.groups {
            if !seen.contains(&g.sector.as_str()) {
                seen.push(&g.sector);
            }
        }
        seen
    }

    pub fn ticker_count(&self) -> usize {
        self.groups.iter().map(|g| g.tickers.len()).sum()
    }

    /// A small built-in catalog of large-cap US groups.
    pub fn default_us() -> Self {
        Self::new(vec![
            Group::new(
                "Technology",
                "Semiconductors",
                ["NVDA", "AMD", "AVGO", "QCOM", "TXN", "MU"],
            ),
            Group::new("Technology", "Software", ["MSFT", "ORCL", "CRM", "ADBE", "NOW"]),
            Group::new("Healthcare", "Pharmaceuticals", ["LLY", "JNJ", "MRK", "PFE", "ABBV"]),
            Group::new("Financials", "Banks", ["JPM", "BAC", "WFC", "C", "GS", "MS"]),
            Group::new("Energy", "Oil & Gas", ["XOM", "CVX", "COP", "EOG", "SLB"]),
            Group::new("ETFs", "Broad Market", ["SPY", "QQQ", "IWM", "DIA"]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"[
        {"Sector": "Technology", "Subsector": "Semiconductors",
         "Company Ticker Symbols": "NVDA, AMD,AVGO , "},
        {"Sector": "Energy", "Subsector": "Oil", "Company Ticker Symbols": "XOM"},
        {"Sector": "technology", "Subsector": "Software", "Company Ticker Symbols": "MSFT"}
    ]"#;

    #[test]
    fn parses_export_shape() {
        let catalog = GroupCatalog::from_json(EXPORT).unwrap();
        assert_eq!(catalog.groups.len(), 3);
        assert_eq!(catalog.groups[0].tickers, vec!["NVDA", "AMD", "AVGO"]);
        assert_eq!(catalog.groups[1].label(), "Energy / Oil");
    }

    #[test]
    fn sector_filter_is_case_insensitive_and_ordered() {
        let catalog = GroupCatalog::from_json(EXPORT).unwrap();
        let tech = catalog.list_groups(Some("TECHNOLOGY"));
        let subsectors: Vec<&str> = tech.iter().map(|g| g.subsector.as_str()).collect();
        assert_eq!(subsectors, vec!["Semiconductors", "Software"]);
        assert_eq!(catalog.list_groups(None).len(), 3);
        assert!(catalog.list_groups(Some("Utilities")).is_empty());
    }

    #[test]
    fn toml_groups() {
        let toml = r#"
            [[groups]]
            sector = "ETFs"
            subsector = "Broad"
            tickers = ["SPY", "QQQ"]
        "#;
        let catalog = GroupCatalog::from_toml(toml).unwrap();
        assert_eq!(catalog.ticker_count(), 2);
        assert_eq!(catalog.sectors(), vec!["ETFs"]);
    }

    #[test]
    fn csv_import_then_json_export() {
        let csv = "Sector,Subsector,Company Ticker Symbols\n\
                   Technology,Semiconductors,\"NVDA, AMD\"\n\
                   Energy,Oil,XOM\n";
        let catalog = GroupCatalog::import_csv(csv.as_bytes()).unwrap();
        assert_eq!(catalog.groups.len(), 2);
        assert_eq!(catalog.groups[0].tickers, vec!["NVDA", "AMD"]);

        let json = catalog.to_json().unwrap();
        assert!(json.contains("\"Company Ticker Symbols\": \"NVDA, AMD\""));
        assert_eq!(GroupCatalog::from_json(&json).unwrap(), catalog);
    }

    #[test]
    fn from_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("groups.json");
        std::fs::write(&json_path, EXPORT).unwrap();
        assert_eq!(GroupCatalog::from_file(&json_path).unwrap().groups.len(), 3);

        let bad = dir.path().join("groups.xlsx");
        std::fs::write(&bad, b"").unwrap();
        assert!(matches!(
            GroupCatalog::from_file(&bad),
            Err(CatalogError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn default_catalog_is_populated() {
        let catalog = GroupCatalog::default_us();
        assert!(catalog.sectors().contains(&"ETFs"));
        assert!(catalog.ticker_count() > 20);
    }
}
