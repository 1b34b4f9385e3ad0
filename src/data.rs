//! Data loading and management
//!
//! The volatility analysis and IV ranking jobs write their results as CSV
//! files. This module reads those frames back and exposes them through the
//! `CboeSource` and `SivSource` traits the handlers depend on.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{
    parse_date, CboeIndex, IndexAnalysis, IndexPoint, SivFrame, SivRow, TermRow, TermStructure,
    TERM_MONTHS,
};

// =============================================================================
// Constants
// =============================================================================

/// Term structure file under the CBOE data root
pub const TERM_STRUCTURE_FILE: &str = "vix_term_structure.csv";

/// Directory holding one SIV file per product group under the options data root
pub const SIV_DIR: &str = "siv";

// =============================================================================
// Data Manager Traits
// =============================================================================

/// Source of CBOE volatility index data
pub trait CboeSource: Send + Sync {
    /// Combined VIX futures curve
    fn term_structure(&self) -> Result<TermStructure>;

    /// Close and volatility-difference series for one index
    fn analyze(&self, index: CboeIndex) -> Result<IndexAnalysis>;
}

/// Source of options implied-volatility frames
pub trait SivSource: Send + Sync {
    /// One frame per product group, truncated to rows dated on or before `date`
    fn prepare(&self, date: NaiveDate) -> Result<Vec<SivFrame>>;
}

// =============================================================================
// CSV Helpers
// =============================================================================

/// Parse an optional numeric cell; empty, `nan` and non-finite cells are missing
fn parse_cell(cell: Option<&str>) -> Result<Option<f64>> {
    let Some(raw) = cell.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let value: f64 = raw
        .parse()
        .with_context(|| format!("Failed to parse value: {}", raw))?;
    Ok(value.is_finite().then_some(value))
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn open_reader(path: &Path) -> Result<csv::Reader<fs::File>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))
}

// =============================================================================
// CSV Data Loading
// =============================================================================

/// Load the VIX futures term structure (`date,0,1,2,3,4,5`)
pub fn load_term_structure(path: impl AsRef<Path>) -> Result<TermStructure> {
    let path = path.as_ref();
    let mut reader = open_reader(path)?;
    let mut rows = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let date_str = record.get(0).context("Missing date column")?;
        let date = parse_date(date_str)?;

        let mut values = [None; TERM_MONTHS];
        for (month, slot) in values.iter_mut().enumerate() {
            *slot = parse_cell(record.get(month + 1))
                .with_context(|| format!("Row {}: bad value in column {}", row_idx + 1, month))?;
        }

        rows.push(TermRow { date, values });
    }

    rows.sort_by_key(|r| r.date);
    debug!("Loaded {} term structure rows from {}", rows.len(), path.display());

    Ok(TermStructure { rows })
}

#[derive(Debug, Deserialize)]
struct IndexRecord {
    date: String,
    close: Option<f64>,
    vol_diff: Option<f64>,
}

/// Load one index analysis file (`date,close,vol_diff`)
pub fn load_index_analysis(index: CboeIndex, path: impl AsRef<Path>) -> Result<IndexAnalysis> {
    let path = path.as_ref();
    let mut reader = open_reader(path)?;
    let mut analysis = IndexAnalysis::new(index);

    for (row_idx, result) in reader.deserialize::<IndexRecord>().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        analysis.points.push(IndexPoint {
            date: parse_date(&record.date)?,
            close: finite(record.close),
            vol_diff: finite(record.vol_diff),
        });
    }

    analysis.points.sort_by_key(|p| p.date);
    debug!("Loaded {} {} points from {}", analysis.points.len(), index, path.display());

    Ok(analysis)
}

#[derive(Debug, Deserialize)]
struct SivRecord {
    date: String,
    product_group: String,
    close: Option<f64>,
    iv: Option<f64>,
    ivp: Option<f64>,
    open_interest: Option<f64>,
    hv20: Option<f64>,
    hv250: Option<f64>,
    volume: Option<f64>,
}

/// Load one product group's SIV file.
///
/// The product group is taken from the first row; the file stem is used for an
/// empty file.
pub fn load_siv_frame(path: impl AsRef<Path>) -> Result<SivFrame> {
    let path = path.as_ref();
    let mut reader = open_reader(path)?;
    let mut group: Option<String> = None;
    let mut rows = Vec::new();

    for (row_idx, result) in reader.deserialize::<SivRecord>().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let expected = group.get_or_insert_with(|| record.product_group.clone());
        if *expected != record.product_group {
            warn!(
                "{}: row {} belongs to '{}', expected '{}'",
                path.display(),
                row_idx + 1,
                record.product_group,
                expected
            );
            continue;
        }

        rows.push(SivRow {
            date: parse_date(&record.date)?,
            close: finite(record.close),
            iv: finite(record.iv),
            ivp: finite(record.ivp),
            open_interest: finite(record.open_interest),
            hv20: finite(record.hv20),
            hv250: finite(record.hv250),
            volume: finite(record.volume),
        });
    }

    rows.sort_by_key(|r| r.date);

    let group = match group {
        Some(g) => g,
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    Ok(SivFrame::new(group, rows))
}

/// Load every `*.csv` frame in `dir`, in parallel, ordered by product group
pub fn load_siv_dir(dir: impl AsRef<Path>) -> Result<Vec<SivFrame>> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read SIV directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    paths.sort();

    let mut frames = paths
        .par_iter()
        .map(|path| {
            load_siv_frame(path).with_context(|| format!("Failed to load {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    frames.sort_by(|a, b| a.product_group.cmp(&b.product_group));
    Ok(frames)
}

// =============================================================================
// CSV-backed Data Managers
// =============================================================================

/// CBOE data manager reading the analysis job's CSV output
#[derive(Debug, Clone)]
pub struct CsvCboeSource {
    root: PathBuf,
}

impl CsvCboeSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl CboeSource for CsvCboeSource {
    fn term_structure(&self) -> Result<TermStructure> {
        let path = self.root.join(TERM_STRUCTURE_FILE);
        let term = load_term_structure(&path)
            .with_context(|| format!("Failed to load term structure from {}", path.display()))?;
        info!("Loaded {} days of VIX term structure", term.len());
        Ok(term)
    }

    fn analyze(&self, index: CboeIndex) -> Result<IndexAnalysis> {
        let path = self.root.join(index.file_name());
        let analysis = load_index_analysis(index, &path)
            .with_context(|| format!("Failed to load {} analysis from {}", index, path.display()))?;
        info!("Loaded {} days of {} analysis", analysis.points.len(), index);
        Ok(analysis)
    }
}

/// Options IV data manager reading one CSV per product group
#[derive(Debug, Clone)]
pub struct CsvSivSource {
    root: PathBuf,
}

impl CsvSivSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn siv_dir(&self) -> PathBuf {
        self.root.join(SIV_DIR)
    }
}

impl SivSource for CsvSivSource {
    fn prepare(&self, date: NaiveDate) -> Result<Vec<SivFrame>> {
        let frames = load_siv_dir(self.siv_dir())?;
        info!("Prepared {} SIV frames up to {}", frames.len(), date);
        Ok(frames.iter().map(|f| f.until(date)).collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
