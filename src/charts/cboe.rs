//! CBOE volatility index charts

use chrono::NaiveDate;

use crate::indicators::{bollinger_bands, BOLLINGER_PERIOD, BOLLINGER_STD};
use crate::warning::{warning_areas, WarningThresholds};
use crate::{IndexAnalysis, TermStructure, WarningArea, TERM_MONTHS};

use super::{Axis, ChartOption, LineStyle, MarkLine, Series, Title};

/// Term-structure columns hidden in the legend on first load
const UNSELECTED_MONTHS: [usize; 2] = [2, 4];

/// VIX futures term structure, one line per months-to-expiry column.
///
/// Warning windows detected on the VIX volatility difference shade the front
/// month line.
pub fn vix_term_chart(
    term: &TermStructure,
    vix: &IndexAnalysis,
    thresholds: &WarningThresholds,
) -> ChartOption {
    let dates = term.dates();
    let areas = snap_to_axis(&warning_areas(&vix.vol_diff_series(), thresholds), &dates);

    let mut chart = ChartOption {
        title: vec![Title::new("vix")],
        y_axis: vec![Axis::scaled_value()],
        ..Default::default()
    }
    .with_dates(&dates, Axis::date_category());

    for month in 0..TERM_MONTHS {
        let mut series = Series::line(month.to_string(), &term.column(month));
        if month == 0 {
            series = series
                .with_area_opacity(0.2)
                .with_mark_line(MarkLine::min_max("ivl", "ivh", None))
                .with_warning_areas(&areas);
        }
        chart = chart.add_series(series, !UNSELECTED_MONTHS.contains(&month));
    }

    chart
}

/// Move each area's endpoints inward onto dates present on a sorted category
/// axis. Areas with no axis date inside them are dropped.
fn snap_to_axis(areas: &[WarningArea], axis: &[NaiveDate]) -> Vec<WarningArea> {
    areas
        .iter()
        .filter_map(|area| {
            let first = axis.partition_point(|d| *d < area.start);
            let last = axis.partition_point(|d| *d <= area.end).checked_sub(1)?;
            (first <= last).then(|| WarningArea {
                start: axis[first],
                end: axis[last],
            })
        })
        .collect()
}

/// Index close with Bollinger Bands and warning windows
pub fn index_chart(analysis: &IndexAnalysis, thresholds: &WarningThresholds) -> ChartOption {
    let closes = analysis.closes();
    let areas = warning_areas(&analysis.vol_diff_series(), thresholds);
    let (upper, middle, lower) = bollinger_bands(&closes, BOLLINGER_PERIOD, BOLLINGER_STD);

    let band = |name: &str, values: &[Option<f64>], color: &str| {
        Series::line(name, values).with_line_style(LineStyle::new(0.8, 1.0).color(color))
    };

    ChartOption {
        title: vec![Title::new(analysis.index.as_str())],
        y_axis: vec![Axis::scaled_value()],
        ..Default::default()
    }
    .with_dates(&analysis.dates(), Axis::date_category())
    .add_series(
        Series::line(analysis.index.as_str(), &closes)
            .with_line_style(LineStyle::new(1.0, 1.5))
            .with_mark_line(MarkLine::min_max("ivl", "ivh", None))
            .with_warning_areas(&areas),
        true,
    )
    .add_series(band("boll_upper", &upper, "gray"), true)
    .add_series(band("boll_mid", &middle, "gold"), true)
    .add_series(band("boll_lower", &lower, "gray"), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CboeIndex, IndexPoint, TermRow};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, day).unwrap()
    }

    fn analysis(index: CboeIndex, diffs: &[f64]) -> IndexAnalysis {
        IndexAnalysis {
            index,
            points: diffs
                .iter()
                .enumerate()
                .map(|(i, diff)| IndexPoint {
                    date: d(i as u32 + 1),
                    close: Some(20.0 + i as f64),
                    vol_diff: Some(*diff),
                })
                .collect(),
        }
    }

    fn term(days: u32) -> TermStructure {
        TermStructure {
            rows: (1..=days)
                .map(|day| TermRow {
                    date: d(day),
                    values: [Some(20.0), Some(21.0), Some(22.0), Some(23.0), None, Some(25.0)],
                })
                .collect(),
        }
    }

    #[test]
    fn test_vix_term_chart_series_and_legend() {
        let chart = vix_term_chart(
            &term(3),
            &analysis(CboeIndex::Vix, &[0.0, 0.0, 0.0]),
            &WarningThresholds::default(),
        );

        let names: Vec<_> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["0", "1", "2", "3", "4", "5"]);
        assert_eq!(chart.legend[0].selected.get("2"), Some(&false));
        assert_eq!(chart.legend[0].selected.get("4"), Some(&false));
        assert_eq!(chart.legend[0].selected.get("5"), Some(&true));
        assert_eq!(chart.title[0].text, "vix");

        let front = chart.series_named("0").unwrap();
        assert!(front.area_style.is_some());
        assert!(front.mark_line.is_some());
        assert!(front.mark_area.is_none());
        assert!(chart.series_named("1").unwrap().area_style.is_none());
    }

    #[test]
    fn test_vix_term_chart_shades_warnings() {
        let chart = vix_term_chart(
            &term(4),
            &analysis(CboeIndex::Vix, &[0.0, -0.01, 0.03, 0.0]),
            &WarningThresholds::default(),
        );

        let area = chart.series_named("0").unwrap().mark_area.as_ref().unwrap();
        assert_eq!(area.data.len(), 1);
        assert_eq!(area.data[0][0].x_axis, "2020-03-02");
        assert_eq!(area.data[0][1].x_axis, "2020-03-03");
    }

    #[test]
    fn test_warning_edges_snap_to_term_dates() {
        // term curve has no row on the 3rd or the 7th
        let term = TermStructure {
            rows: [2, 4, 5, 6]
                .iter()
                .map(|&day| TermRow {
                    date: d(day),
                    values: [Some(20.0); TERM_MONTHS],
                })
                .collect(),
        };
        let vix = analysis(CboeIndex::Vix, &[0.0, 0.0, -0.01, 0.0, 0.03, 0.0, -0.02]);

        let chart = vix_term_chart(&term, &vix, &WarningThresholds::default());
        let area = chart.series_named("0").unwrap().mark_area.as_ref().unwrap();
        let axis = chart.x_axis[0].data.as_ref().unwrap();

        assert_eq!(area.data.len(), 2);
        assert_eq!(area.data[0][0].x_axis, "2020-03-04");
        assert_eq!(area.data[0][1].x_axis, "2020-03-05");
        assert_eq!(area.data[1][0].x_axis, "2020-03-06");
        assert_eq!(area.data[1][1].x_axis, "2020-03-06");
        for edge in area.data.iter().flatten() {
            assert!(axis.contains(&edge.x_axis));
        }
    }

    #[test]
    fn test_warning_outside_term_dates_is_dropped() {
        let areas = [WarningArea {
            start: d(1),
            end: d(2),
        }];
        assert!(snap_to_axis(&areas, &[d(3), d(4)]).is_empty());
        assert!(snap_to_axis(&areas, &[]).is_empty());
    }

    #[test]
    fn test_index_chart_bands() {
        let diffs = vec![0.0; 25];
        let chart = index_chart(&analysis(CboeIndex::Ovx, &diffs), &WarningThresholds::default());

        assert_eq!(chart.title[0].text, "ovx");
        assert_eq!(chart.series.len(), 4);
        assert_eq!(chart.x_axis[0].data.as_ref().unwrap().len(), 25);

        let mid = chart.series_named("boll_mid").unwrap();
        assert_eq!(mid.data.len(), 25);
        assert_eq!(mid.data[0], crate::charts::DataPoint::Value(None));
    }
}
