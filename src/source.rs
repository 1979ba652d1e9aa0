//! Dataset loading: resolve a source, decode and normalize it, fall back to
//! synthetic data when the source is missing, and cache the result.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Serialize;
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::normalize::{RejectionTally, normalize};
use crate::parser::parse_rows;
use crate::record::CanonicalRecord;
use crate::synthetic::{SyntheticConfig, generate};

/// Where the ridership table comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl DataSource {
    /// `http://` and `https://` values (any case) are URLs, anything else is
    /// a path.
    pub fn parse(value: &str) -> Self {
        let has_scheme = |scheme: &str| {
            value
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        };
        if has_scheme("http://") || has_scheme("https://") {
            DataSource::Url(value.to_string())
        } else {
            DataSource::File(PathBuf::from(value))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => f.write_str(url),
        }
    }
}

/// Whether the records came from the requested source or the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetOrigin {
    Source { source: String },
    Synthetic { requested: String, reason: String },
}

/// A normalized dataset, read-only for the rest of the session.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub records: Vec<CanonicalRecord>,
    pub rejections: RejectionTally,
    pub origin: DatasetOrigin,
}

impl LoadedDataset {
    /// Human-readable warning to show when synthetic data stands in for
    /// the real export.
    pub fn notice(&self) -> Option<String> {
        match &self.origin {
            DatasetOrigin::Source { .. } => None,
            DatasetOrigin::Synthetic { requested, reason } => Some(format!(
                "Ridership data at {requested} is unavailable ({reason}). \
                 Using synthetic sample data for demonstration."
            )),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.origin, DatasetOrigin::Synthetic { .. })
    }

    /// Earliest and latest dates present, `None` for an empty dataset.
    pub fn date_bounds(&self) -> Option<(chrono::NaiveDate, chrono::NaiveDate)> {
        let min = self.records.iter().map(|r| r.date()).min()?;
        let max = self.records.iter().map(|r| r.date()).max()?;
        Some((min, max))
    }
}

enum Fetched {
    Bytes(Vec<u8>),
    Missing(String),
}

#[tracing::instrument(skip_all, fields(source = %source))]
fn fetch(source: &DataSource) -> Result<Fetched> {
    match source {
        DataSource::File(path) => match std::fs::read(path) {
            Ok(bytes) => Ok(Fetched::Bytes(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Fetched::Missing("file not found".to_string())),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        },
        DataSource::Url(url) => {
            let resp = reqwest::blocking::get(url).with_context(|| format!("Failed to fetch {url}"))?;
            if resp.status() == StatusCode::NOT_FOUND {
                return Ok(Fetched::Missing("HTTP 404".to_string()));
            }
            let resp = resp
                .error_for_status()
                .with_context(|| format!("Failed to fetch {url}"))?;
            Ok(Fetched::Bytes(resp.bytes()?.to_vec()))
        }
    }
}

/// Loads and normalizes `source`, substituting the synthetic dataset built
/// from `fallback` when the source does not exist.
///
/// # Errors
///
/// Returns an error for I/O, network or header-decoding failures other than
/// a missing source. Bad rows never fail the load; they are tallied.
#[tracing::instrument(skip_all, fields(source = %source))]
pub fn load(source: &DataSource, fallback: &SyntheticConfig) -> Result<LoadedDataset> {
    match fetch(source)? {
        Fetched::Bytes(bytes) => {
            debug!(bytes = bytes.len(), "Source bytes received, decoding");
            let rows = parse_rows(&bytes)?;
            let normalized = normalize(rows);
            info!(
                records = normalized.records.len(),
                rejected = normalized.rejections.total(),
                "Dataset loaded"
            );
            Ok(LoadedDataset {
                records: normalized.records,
                rejections: normalized.rejections,
                origin: DatasetOrigin::Source {
                    source: source.to_string(),
                },
            })
        }
        Fetched::Missing(reason) => {
            warn!(%reason, "Source unavailable, using synthetic dataset");
            Ok(LoadedDataset {
                records: generate(fallback)?,
                rejections: RejectionTally::default(),
                origin: DatasetOrigin::Synthetic {
                    requested: source.to_string(),
                    reason,
                },
            })
        }
    }
}

/// Identity of a loaded source. Files also carry their modification time so
/// a rewritten file is picked up without explicit invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceKey {
    source: DataSource,
    modified: Option<SystemTime>,
}

impl SourceKey {
    fn of(source: &DataSource) -> Self {
        let modified = match source {
            DataSource::File(path) => std::fs::metadata(path).and_then(|m| m.modified()).ok(),
            DataSource::Url(_) => None,
        };
        SourceKey {
            source: source.clone(),
            modified,
        }
    }
}

/// Single-entry cache of the most recently loaded dataset.
///
/// Owned by whoever drives the pipeline; repeated filter and aggregation
/// runs reuse the cached records until the source identity changes or
/// [`DatasetCache::invalidate`] is called.
#[derive(Debug)]
pub struct DatasetCache {
    fallback: SyntheticConfig,
    entry: Option<(SourceKey, Arc<LoadedDataset>)>,
    loads: usize,
}

impl DatasetCache {
    pub fn new(fallback: SyntheticConfig) -> Self {
        DatasetCache {
            fallback,
            entry: None,
            loads: 0,
        }
    }

    /// Returns the cached dataset for `source`, loading it on a miss.
    pub fn get_or_load(&mut self, source: &DataSource) -> Result<Arc<LoadedDataset>> {
        let key = SourceKey::of(source);

        if let Some((cached_key, dataset)) = &self.entry {
            if *cached_key == key {
                debug!(source = %source, "Dataset cache hit");
                return Ok(Arc::clone(dataset));
            }
            info!(source = %source, "Dataset source changed, reloading");
        }

        let dataset = Arc::new(load(source, &self.fallback)?);
        self.loads += 1;
        self.entry = Some((key, Arc::clone(&dataset)));
        Ok(dataset)
    }

    /// Drops the cached dataset so the next request reloads it.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            debug!("Dataset cache invalidated");
        }
    }

    /// Number of loads performed so far, cache hits excluded.
    pub fn load_count(&self) -> usize {
        self.loads
    }
}
