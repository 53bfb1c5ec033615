//! JSON history cache, one file per ticker.
//!
//! Layout: `{cache_dir}/{TICKER}.json`, each file a single [`CacheEntry`]
//! holding either the bars last fetched or a delisted marker, plus the time
//! of the fetch. One staleness policy decides whether an entry is reused.
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - BLAKE3 content hash verified on load (serde_json's `float_roundtrip`
//!   keeps parsed prices bit-identical to the written ones)
//! - Quarantine for corrupt files ({file}.quarantined)

use super::provider::DataError;
use crate::domain::Bar;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// What a cache entry holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheContent {
    Bars { bars: Vec<Bar> },
    Delisted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub ticker: String,
    pub fetched_at: DateTime<Utc>,
    pub data_hash: String,
    pub content: CacheContent,
}

impl CacheEntry {
    pub fn new(ticker: impl Into<String>, fetched_at: DateTime<Utc>, content: CacheContent) -> Self {
        let data_hash = content_hash(&content);
        Self {
            ticker: ticker.into(),
            fetched_at,
            data_hash,
            content,
        }
    }

    pub fn is_delisted(&self) -> bool {
        matches!(self.content, CacheContent::Delisted)
    }

    pub fn bar_count(&self) -> usize {
        match &self.content {
            CacheContent::Bars { bars } => bars.len(),
            CacheContent::Delisted => 0,
        }
    }

    fn hash_matches(&self) -> bool {
        self.data_hash == content_hash(&self.content)
    }
}

fn content_hash(content: &CacheContent) -> String {
    // Serializing plain data structs into a Vec cannot fail
    let bytes = serde_json::to_vec(content).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

/// How old an entry may be before it is refetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    pub max_age: Duration,
}

impl StalenessPolicy {
    pub fn hours(hours: i64) -> Self {
        Self {
            max_age: Duration::hours(hours),
        }
    }

    pub fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.fetched_at < self.max_age
    }
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self::hours(24)
    }
}

/// Summary row for `cache status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub ticker: String,
    pub fetched_at: DateTime<Utc>,
    pub delisted: bool,
    pub bar_count: usize,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct HistoryCache {
    cache_dir: PathBuf,
}

impl HistoryCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// `{cache_dir}/{TICKER}.json`, with path-hostile characters replaced.
    fn entry_path(&self, ticker: &str) -> PathBuf {
        let safe: String = ticker
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '^' | '=') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.cache_dir.join(format!("{safe}.json"))
    }

    pub fn write(&self, entry: &CacheEntry) -> Result<(), DataError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let path = self.entry_path(&entry.ticker);
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string(entry)
            .map_err(|e| DataError::CacheError(format!("entry serialization: {e}")))?;
        fs::write(&tmp_path, json)
            .map_err(|e| DataError::CacheError(format!("write {}: {e}", tmp_path.display())))?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })
    }

    pub fn write_bars(
        &self,
        ticker: &str,
        bars: Vec<Bar>,
        fetched_at: DateTime<Utc>,
    ) -> Result<CacheEntry, DataError> {
        let entry = CacheEntry::new(ticker, fetched_at, CacheContent::Bars { bars });
        self.write(&entry)?;
        Ok(entry)
    }

    pub fn write_delisted(
        &self,
        ticker: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<CacheEntry, DataError> {
        let entry = CacheEntry::new(ticker, fetched_at, CacheContent::Delisted);
        self.write(&entry)?;
        Ok(entry)
    }

    /// Load the entry for a ticker.
    ///
    /// Missing files are `Ok(None)`. Unreadable, unparsable or hash-mismatched
    /// files are quarantined and also reported as `Ok(None)`. So is an entry
    /// stored for a different ticker that maps to the same file name.
    pub fn load(&self, ticker: &str) -> Result<Option<CacheEntry>, DataError> {
        let path = self.entry_path(ticker);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| DataError::CacheError(format!("read {}: {e}", path.display())))?;

        let problem = match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) if entry.ticker != ticker => {
                tracing::debug!(
                    ticker,
                    stored = %entry.ticker,
                    "cache file belongs to another ticker"
                );
                return Ok(None);
            }
            Ok(entry) if entry.hash_matches() => return Ok(Some(entry)),
            Ok(_) => "content hash mismatch".to_string(),
            Err(e) => e.to_string(),
        };

        let quarantine = path.with_extension("json.quarantined");
        tracing::warn!(
            ticker,
            path = %path.display(),
            %problem,
            "quarantining corrupt cache file"
        );
        let _ = fs::rename(&path, &quarantine);
        Ok(None)
    }

    /// Status of every entry in the cache, sorted by ticker.
    pub fn status(&self) -> Result<Vec<CacheStatus>, DataError> {
        let mut rows = Vec::new();
        for (path, entry) in self.entries()? {
            let size_bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            rows.push(CacheStatus {
                ticker: entry.ticker.clone(),
                fetched_at: entry.fetched_at,
                delisted: entry.is_delisted(),
                bar_count: entry.bar_count(),
                size_bytes,
            });
        }
        rows.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(rows)
    }

    /// Entries fetched before `cutoff`. Removed unless `dry_run`.
    pub fn clean(&self, cutoff: DateTime<Utc>, dry_run: bool) -> Result<Vec<String>, DataError> {
        let mut removed = Vec::new();
        for (path, entry) in self.entries()? {
            if entry.fetched_at >= cutoff {
                continue;
            }
            if !dry_run {
                fs::remove_file(&path)
                    .map_err(|e| DataError::CacheError(format!("remove {}: {e}", path.display())))?;
            }
            removed.push(entry.ticker);
        }
        removed.sort();
        Ok(removed)
    }

    /// Parsable `.json` entries; others are skipped.
    fn entries(&self) -> Result<Vec<(PathBuf, CacheEntry)>, DataError> {
        if !self.cache_dir.exists() {
            return Ok(Vec::new());
        }
        let dir = fs::read_dir(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("read dir: {e}")))?;

        let mut out = Vec::new();
        for item in dir {
            let item = item.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .ok()
                .and_then(|s| serde_json::from_str::<CacheEntry>(&s).ok());
            if let Some(entry) = parsed {
                out.push((path, entry));
            }
        }
        Ok(out)
    }
}
