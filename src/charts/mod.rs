//! ECharts option model
//!
//! The dashboard never renders charts itself. It builds an option object,
//! serializes it to JSON and lets ECharts draw it in the browser. Absent
//! fields are skipped so the library's defaults apply, and missing data
//! points serialize as `null`, which ECharts draws as a gap.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{format_date, WarningArea};

pub mod cboe;
pub mod options;

pub use cboe::{index_chart, vix_term_chart};
pub use options::siv_kline_chart;

/// Client-side theme every dashboard page initializes ECharts with
pub const THEME: &str = "white";

/// Default ECharts palette, emitted so overlaid charts keep stable colors
pub const PALETTE: &[&str] = &[
    "#c23531", "#2f4554", "#61a0a8", "#d48265", "#749f83", "#ca8622", "#bda29a", "#6e7074",
    "#546570", "#c4ccd3", "#f05b72", "#ef5b9c", "#f47920", "#905a3d", "#fab27b", "#2a5caa",
    "#444693", "#726930", "#b2d235", "#6d8346", "#ac6767", "#1d953f", "#6950a1", "#918597",
];

// =============================================================================
// Option Root
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOption {
    pub animation: bool,
    pub color: Vec<String>,
    pub title: Vec<Title>,
    pub legend: Vec<Legend>,
    pub tooltip: Tooltip,
    pub x_axis: Vec<Axis>,
    pub y_axis: Vec<Axis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_zoom: Vec<DataZoom>,
    pub series: Vec<Series>,
}

impl Default for ChartOption {
    fn default() -> Self {
        ChartOption {
            animation: true,
            color: PALETTE.iter().map(|c| c.to_string()).collect(),
            title: Vec::new(),
            legend: vec![Legend::default()],
            tooltip: Tooltip::default(),
            x_axis: Vec::new(),
            y_axis: Vec::new(),
            data_zoom: Vec::new(),
            series: Vec::new(),
        }
    }
}

impl ChartOption {
    /// Category x-axis over the given dates
    pub fn with_dates(mut self, dates: &[NaiveDate], axis: Axis) -> Self {
        let data = dates.iter().map(|d| format_date(*d)).collect();
        self.x_axis = vec![Axis {
            data: Some(data),
            ..axis
        }];
        self
    }

    /// Append a series and register it in the legend
    pub fn add_series(mut self, series: Series, selected: bool) -> Self {
        let legend = self.legend_mut();
        legend.data.push(series.name.clone());
        legend.selected.insert(series.name.clone(), selected);
        self.series.push(series);
        self
    }

    /// Append an extra y-axis, addressed by its position in `y_axis`
    pub fn extend_axis(mut self, axis: Axis) -> Self {
        self.y_axis.push(axis);
        self
    }

    /// Merge another chart's series onto this one, sharing axes
    pub fn overlap(mut self, other: ChartOption) -> Self {
        for other_legend in other.legend {
            let legend = self.legend_mut();
            legend.data.extend(other_legend.data);
            legend.selected.extend(other_legend.selected);
        }
        self.series.extend(other.series);
        self
    }

    fn legend_mut(&mut self) -> &mut Legend {
        if self.legend.is_empty() {
            self.legend.push(Legend::default());
        }
        &mut self.legend[0]
    }

    pub fn series_named(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }
}

/// Serialize a chart option to the JSON string handed to the browser
pub fn dump_options(option: &ChartOption) -> Result<String> {
    serde_json::to_string_pretty(option).context("Failed to serialize chart option")
}

// =============================================================================
// Components
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Title {
            text: text.into(),
            left: Some("0".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub show: bool,
    pub data: Vec<String>,
    pub selected: BTreeMap<String, bool>,
}

impl Default for Legend {
    fn default() -> Self {
        Legend {
            show: true,
            data: Vec::new(),
            selected: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub show: bool,
    pub trigger: String,
    pub axis_pointer: AxisPointer,
}

impl Default for Tooltip {
    fn default() -> Self {
        Tooltip {
            show: true,
            trigger: "axis".to_string(),
            axis_pointer: AxisPointer {
                kind: "line".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AxisPointer {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataZoom {
    #[serde(rename = "type")]
    pub kind: String,
    pub show: bool,
    pub start: f64,
    pub end: f64,
}

impl DataZoom {
    pub fn slider(start: f64, end: f64) -> Self {
        DataZoom {
            kind: "slider".to_string(),
            show: true,
            start,
            end,
        }
    }
}

// =============================================================================
// Axes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    Category,
    Value,
}

/// Axis bound: a fixed number or an ECharts keyword such as `dataMin`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AxisBound {
    Value(f64),
    Keyword(String),
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AxisType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary_gap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<AxisBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<AxisBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis_line: Option<AxisLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis_label: Option<Label>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_line: Option<Toggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<String>>,
}

impl Axis {
    /// Date axis shared by every dashboard chart
    pub fn date_category() -> Self {
        Axis {
            kind: Some(AxisType::Category),
            scale: Some(true),
            boundary_gap: Some(false),
            axis_line: Some(AxisLine {
                show: true,
                on_zero: false,
            }),
            split_line: Some(Toggle::off()),
            split_number: Some(20),
            min: Some(AxisBound::Keyword("dataMin".to_string())),
            max: Some(AxisBound::Keyword("dataMax".to_string())),
            ..Default::default()
        }
    }

    /// Scaled value axis with split lines shown
    pub fn scaled_value() -> Self {
        Axis {
            kind: Some(AxisType::Value),
            scale: Some(true),
            split_line: Some(Toggle::on()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisLine {
    pub show: bool,
    pub on_zero: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Toggle {
    pub show: bool,
}

impl Toggle {
    pub fn on() -> Self {
        Toggle { show: true }
    }

    pub fn off() -> Self {
        Toggle { show: false }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Label {
    pub show: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter: Option<String>,
}

impl Label {
    pub fn hidden() -> Self {
        Label {
            show: false,
            formatter: None,
        }
    }

    pub fn formatted(formatter: impl Into<String>) -> Self {
        Label {
            show: true,
            formatter: Some(formatter.into()),
        }
    }
}

// =============================================================================
// Series
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesType {
    Line,
    Candlestick,
}

/// One data point; `Value(None)` is a gap
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataPoint {
    Value(Option<f64>),
    /// `[open, close, lowest, highest]`
    Ohlc([f64; 4]),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    #[serde(rename = "type")]
    pub kind: SeriesType,
    pub name: String,
    pub data: Vec<DataPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_symbol: Option<bool>,
    pub label: Label,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_style: Option<LineStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_style: Option<AreaStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_style: Option<ItemStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_line: Option<MarkLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_area: Option<MarkArea>,
}

impl Series {
    /// Line series without point symbols or labels
    pub fn line(name: impl Into<String>, values: &[Option<f64>]) -> Self {
        Series {
            kind: SeriesType::Line,
            name: name.into(),
            data: values.iter().map(|v| DataPoint::Value(*v)).collect(),
            y_axis_index: None,
            show_symbol: Some(false),
            label: Label::hidden(),
            line_style: None,
            area_style: None,
            item_style: None,
            mark_line: None,
            mark_area: None,
        }
    }

    pub fn candlestick(name: impl Into<String>, data: Vec<DataPoint>) -> Self {
        Series {
            kind: SeriesType::Candlestick,
            show_symbol: None,
            data,
            ..Series::line(name, &[])
        }
    }

    pub fn on_y_axis(mut self, index: usize) -> Self {
        self.y_axis_index = Some(index);
        self
    }

    pub fn with_line_style(mut self, style: LineStyle) -> Self {
        self.line_style = Some(style);
        self
    }

    pub fn with_area_opacity(mut self, opacity: f64) -> Self {
        self.area_style = Some(AreaStyle { opacity });
        self
    }

    pub fn with_item_style(mut self, style: ItemStyle) -> Self {
        self.item_style = Some(style);
        self
    }

    pub fn with_mark_line(mut self, mark_line: MarkLine) -> Self {
        self.mark_line = Some(mark_line);
        self
    }

    /// Shade warning windows; no mark area is attached when there are none
    pub fn with_warning_areas(mut self, areas: &[WarningArea]) -> Self {
        if !areas.is_empty() {
            self.mark_area = Some(MarkArea::warnings(areas));
        }
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LineStyle {
    pub opacity: f64,
    pub width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl LineStyle {
    pub fn new(opacity: f64, width: f64) -> Self {
        LineStyle {
            opacity,
            width,
            color: None,
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaStyle {
    pub opacity: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color0: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color0: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

// =============================================================================
// Markers
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct MarkLine {
    pub data: Vec<MarkLineItem>,
}

impl MarkLine {
    /// Lines at the series minimum and maximum
    pub fn min_max(min_name: &str, max_name: &str, symbol: Option<&str>) -> Self {
        let item = |kind: &str, name: &str| MarkLineItem {
            kind: kind.to_string(),
            name: name.to_string(),
            symbol: symbol.map(str::to_string),
        };
        MarkLine {
            data: vec![item("min", min_name), item("max", max_name)],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkLineItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkArea {
    pub item_style: ItemStyle,
    pub data: Vec<[MarkAreaEdge; 2]>,
}

impl MarkArea {
    pub fn warnings(areas: &[WarningArea]) -> Self {
        MarkArea {
            item_style: ItemStyle {
                color: Some("#ef232a".to_string()),
                opacity: Some(0.15),
                ..Default::default()
            },
            data: areas
                .iter()
                .map(|a| {
                    [
                        MarkAreaEdge {
                            x_axis: format_date(a.start),
                        },
                        MarkAreaEdge {
                            x_axis: format_date(a.end),
                        },
                    ]
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAreaEdge {
    pub x_axis: String,
}
