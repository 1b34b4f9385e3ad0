//! Volatility Dashboard
//!
//! Serves CBOE volatility index dashboards (VIX term structure, VIX/GVZ/OVX
//! with Bollinger Bands) and options implied-volatility kline charts.
//! Handlers pull pre-computed frames from the data managers, turn them into
//! ECharts options and hand the JSON to thin HTML pages for client-side
//! rendering.
//!
//! ## Warning windows
//! ```
//! use chrono::NaiveDate;
//! use vol_dashboard::warning::{warning_areas, WarningThresholds};
//!
//! let d = |day| NaiveDate::from_ymd_opt(2020, 3, day).unwrap();
//! let series = vec![(d(2), Some(0.01)), (d(3), Some(-0.01)), (d(4), Some(0.03))];
//! let areas = warning_areas(&series, &WarningThresholds::default());
//! assert_eq!(areas.len(), 1);
//! assert_eq!(areas[0].start, d(3));
//! ```

pub mod cache;
pub mod charts;
pub mod config;
pub mod data;
pub mod error;
pub mod handlers;
pub mod indicators;
pub mod templates;
pub mod types;
pub mod warning;

pub use config::Config;
pub use error::{DashboardError, DashboardResult};
pub use handlers::{AppState, Dashboard};
pub use types::*;
