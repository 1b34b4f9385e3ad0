//! Warning-window detection over a volatility-difference series
//!
//! A window opens when the implied/realized difference drops below
//! `enter_below` and closes once it recovers to `exit_at_or_above`. The gap
//! between the two thresholds gives the scan hysteresis, so a series hovering
//! around zero does not flicker in and out of warning.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::WarningArea;

/// Thresholds for entering and leaving the warning state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WarningThresholds {
    pub enter_below: f64,
    pub exit_at_or_above: f64,
}

impl Default for WarningThresholds {
    fn default() -> Self {
        WarningThresholds {
            enter_below: -0.005,
            exit_at_or_above: 0.02,
        }
    }
}

/// Scan `series` for warning windows.
///
/// Missing and NaN values never trigger a transition. A window still open at
/// the end of the series is closed at the last date. If it opened on that last
/// date, the second-to-last date is used as its start instead, and when that
/// date is where the previous window closed the previous window is extended
/// to the last date. Returned windows never overlap or touch.
pub fn warning_areas(
    series: &[(NaiveDate, Option<f64>)],
    thresholds: &WarningThresholds,
) -> Vec<WarningArea> {
    let mut areas = Vec::new();
    let mut window_start: Option<usize> = None;

    for (i, &(date, value)) in series.iter().enumerate() {
        let Some(value) = value.filter(|v| !v.is_nan()) else {
            continue;
        };

        match window_start {
            None if value < thresholds.enter_below => {
                window_start = Some(i);
            }
            Some(start) if value >= thresholds.exit_at_or_above => {
                areas.push(WarningArea {
                    start: series[start].0,
                    end: date,
                });
                window_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = window_start {
        let last = series.len() - 1;
        let start = if start == last { last.saturating_sub(1) } else { start };
        let (start, end) = (series[start].0, series[last].0);
        // pulling the start back can land on the day the previous window closed
        match areas.last_mut() {
            Some(prev) if prev.end >= start => prev.end = end,
            _ => areas.push(WarningArea { start, end }),
        }
    }

    debug!("Detected {} warning areas over {} points", areas.len(), series.len());
    areas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, n).unwrap()
    }

    fn series(values: &[Option<f64>]) -> Vec<(NaiveDate, Option<f64>)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (day(i as u32 + 1), *v))
            .collect()
    }

    fn area(start: u32, end: u32) -> WarningArea {
        WarningArea {
            start: day(start),
            end: day(end),
        }
    }

    #[test]
    fn test_empty_series() {
        assert!(warning_areas(&[], &WarningThresholds::default()).is_empty());
    }

    #[test]
    fn test_no_warning_when_never_below_entry() {
        let s = series(&[Some(0.01), Some(-0.005), Some(0.0), Some(0.03)]);
        assert!(warning_areas(&s, &WarningThresholds::default()).is_empty());
    }

    #[test]
    fn test_single_closed_window() {
        let s = series(&[Some(0.01), Some(-0.01), Some(-0.02), Some(0.025), Some(0.01)]);
        assert_eq!(
            warning_areas(&s, &WarningThresholds::default()),
            vec![area(2, 4)]
        );
    }

    #[test]
    fn test_hysteresis_holds_window_open_between_thresholds() {
        // 0.0 and 0.019 are above the entry level but below the exit level
        let s = series(&[
            Some(-0.01),
            Some(0.0),
            Some(0.019),
            Some(-0.004),
            Some(0.02),
        ]);
        assert_eq!(
            warning_areas(&s, &WarningThresholds::default()),
            vec![area(1, 5)]
        );
    }

    #[test]
    fn test_exit_at_exact_threshold() {
        let s = series(&[Some(-0.006), Some(0.02)]);
        assert_eq!(
            warning_areas(&s, &WarningThresholds::default()),
            vec![area(1, 2)]
        );
    }

    #[test]
    fn test_multiple_windows_do_not_overlap() {
        let s = series(&[
            Some(-0.01),
            Some(0.03),
            Some(-0.01),
            Some(-0.02),
            Some(0.05),
            Some(0.0),
            Some(-0.1),
            Some(0.1),
        ]);
        let areas = warning_areas(&s, &WarningThresholds::default());
        assert_eq!(areas, vec![area(1, 2), area(3, 5), area(7, 8)]);
        for pair in areas.windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
    }

    #[test]
    fn test_open_window_closed_at_last_index() {
        let s = series(&[Some(0.01), Some(-0.01), Some(-0.02), Some(0.0)]);
        assert_eq!(
            warning_areas(&s, &WarningThresholds::default()),
            vec![area(2, 4)]
        );
    }

    #[test]
    fn test_window_opened_on_last_index_uses_previous_start() {
        let s = series(&[Some(0.01), Some(0.0), Some(-0.01)]);
        assert_eq!(
            warning_areas(&s, &WarningThresholds::default()),
            vec![area(2, 3)]
        );
    }

    #[test]
    fn test_last_index_reentry_extends_previous_window() {
        let s = series(&[Some(-0.01), Some(0.03), Some(-0.01)]);
        let areas = warning_areas(&s, &WarningThresholds::default());
        assert_eq!(areas, vec![area(1, 3)]);
    }

    #[test]
    fn test_last_index_reentry_after_gap_is_separate() {
        let s = series(&[Some(-0.01), Some(0.03), Some(0.0), Some(-0.01)]);
        let areas = warning_areas(&s, &WarningThresholds::default());
        assert_eq!(areas, vec![area(1, 2), area(3, 4)]);
        assert!(areas[0].end < areas[1].start);
    }

    #[test]
    fn test_single_point_window() {
        let s = series(&[Some(-0.5)]);
        assert_eq!(
            warning_areas(&s, &WarningThresholds::default()),
            vec![area(1, 1)]
        );
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let s = series(&[Some(-0.01), None, Some(f64::NAN), Some(0.03), None]);
        assert_eq!(
            warning_areas(&s, &WarningThresholds::default()),
            vec![area(1, 4)]
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = WarningThresholds {
            enter_below: 0.0,
            exit_at_or_above: 0.5,
        };
        let s = series(&[Some(-0.001), Some(0.4), Some(0.5)]);
        assert_eq!(warning_areas(&s, &thresholds), vec![area(1, 3)]);
    }
}
