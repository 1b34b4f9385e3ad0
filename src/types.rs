//! Core data types shared by the data managers, chart builders and handlers

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of months-to-expiry columns in the VIX futures term structure
pub const TERM_MONTHS: usize = 6;

/// Date format used on the wire and in chart axes
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid date '{0}', expected YYYY-MM-DD or YYYYMMDD")]
    Date(String),

    #[error("unknown CBOE index '{0}', expected one of vix, gvz, ovx")]
    Index(String),
}

/// Parse a date as found in URLs and data files.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and `YYYYMMDD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, ParseError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .map_err(|_| ParseError::Date(s.to_string()))
}

/// Format a date the way chart axes expect it
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// =============================================================================
// CBOE Indices
// =============================================================================

/// The CBOE volatility indices the dashboard tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CboeIndex {
    /// S&P 500 volatility
    Vix,
    /// Gold ETF volatility
    Gvz,
    /// Crude oil ETF volatility
    Ovx,
}

impl CboeIndex {
    pub const ALL: [CboeIndex; 3] = [CboeIndex::Vix, CboeIndex::Gvz, CboeIndex::Ovx];

    pub fn as_str(&self) -> &'static str {
        match self {
            CboeIndex::Vix => "vix",
            CboeIndex::Gvz => "gvz",
            CboeIndex::Ovx => "ovx",
        }
    }

    /// Name of the analysis file under the CBOE data root
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.as_str())
    }
}

impl fmt::Display for CboeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CboeIndex {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vix" => Ok(CboeIndex::Vix),
            "gvz" => Ok(CboeIndex::Gvz),
            "ovx" => Ok(CboeIndex::Ovx),
            other => Err(ParseError::Index(other.to_string())),
        }
    }
}

// =============================================================================
// VIX Term Structure
// =============================================================================

/// One trading day of the VIX futures curve, front month first
#[derive(Debug, Clone, PartialEq)]
pub struct TermRow {
    pub date: NaiveDate,
    pub values: [Option<f64>; TERM_MONTHS],
}

/// Combined VIX futures term structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermStructure {
    pub rows: Vec<TermRow>,
}

impl TermStructure {
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Values for the given months-to-expiry column
    pub fn column(&self, month: usize) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|r| r.values.get(month).copied().flatten())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Index Analysis
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct IndexPoint {
    pub date: NaiveDate,
    pub close: Option<f64>,
    /// Implied minus realized volatility, as computed by the analysis job
    pub vol_diff: Option<f64>,
}

/// Analysis output for one CBOE index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexAnalysis {
    pub index: CboeIndex,
    pub points: Vec<IndexPoint>,
}

impl IndexAnalysis {
    pub fn new(index: CboeIndex) -> Self {
        Self {
            index,
            points: Vec::new(),
        }
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn closes(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// `(date, vol_diff)` pairs in date order, the warning detector's input
    pub fn vol_diff_series(&self) -> Vec<(NaiveDate, Option<f64>)> {
        self.points.iter().map(|p| (p.date, p.vol_diff)).collect()
    }
}

// =============================================================================
// Options Implied Volatility
// =============================================================================

/// Daily implied-volatility snapshot for one product group
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SivRow {
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub iv: Option<f64>,
    /// IV percentile rank, 0..100
    pub ivp: Option<f64>,
    pub open_interest: Option<f64>,
    pub hv20: Option<f64>,
    pub hv250: Option<f64>,
    pub volume: Option<f64>,
}

/// All rows for one product group, in date order
#[derive(Debug, Clone, PartialEq)]
pub struct SivFrame {
    pub product_group: String,
    pub rows: Vec<SivRow>,
}

impl SivFrame {
    pub fn new(product_group: impl Into<String>, rows: Vec<SivRow>) -> Self {
        Self {
            product_group: product_group.into(),
            rows,
        }
    }

    /// Rows dated on or before `date`
    pub fn until(&self, date: NaiveDate) -> SivFrame {
        SivFrame {
            product_group: self.product_group.clone(),
            rows: self.rows.iter().filter(|r| r.date <= date).cloned().collect(),
        }
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn column(&self, f: impl Fn(&SivRow) -> Option<f64>) -> Vec<Option<f64>> {
        self.rows.iter().map(f).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Warning Windows
// =============================================================================

/// A detected warning window, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningArea {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for WarningArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", format_date(self.start), format_date(self.end))
    }
}
