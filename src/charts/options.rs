//! Options implied-volatility kline chart
//!
//! The close price is drawn as a thin candlestick on the left axis. Volatility
//! lines in percent share the `vix` axis, and the IV percentile sits on a
//! hidden 0..500 axis so it occupies the lower part of the grid.

use crate::indicators::{all_missing, ivp_warn, rolling_mean, scale, IvpBands};
use crate::SivFrame;

use super::{
    Axis, AxisBound, AxisType, ChartOption, DataPoint, DataZoom, ItemStyle, Label, LineStyle,
    MarkLine, Series, Title,
};

const RISE_COLOR: &str = "#ef232a";
const FALL_COLOR: &str = "#14b143";

/// Candle body half-height as a fraction of the close
const CANDLE_SPREAD: f64 = 0.005;

/// Y-axis slots, in the order the axes are pushed
const VOL_AXIS: usize = 1;
const IVP_AXIS: usize = 2;

fn candles(closes: &[Option<f64>]) -> Vec<DataPoint> {
    closes
        .iter()
        .map(|close| match close {
            Some(c) => DataPoint::Ohlc([*c, *c, c * (1.0 - CANDLE_SPREAD), c * (1.0 + CANDLE_SPREAD)]),
            None => DataPoint::Value(None),
        })
        .collect()
}

fn kline(frame: &SivFrame, product: &str) -> ChartOption {
    let closes = frame.column(|r| r.close);

    ChartOption {
        title: vec![Title::new(format!("{} siv", product))],
        y_axis: vec![Axis {
            name: Some("指数价格".to_string()),
            position: Some("left".to_string()),
            ..Axis::scaled_value()
        }],
        data_zoom: vec![DataZoom::slider(0.0, 100.0)],
        ..Default::default()
    }
    .with_dates(&frame.dates(), Axis::date_category())
    .extend_axis(Axis {
        kind: Some(AxisType::Value),
        name: Some("vix".to_string()),
        scale: Some(true),
        interval: Some(5.0),
        axis_label: Some(Label::formatted("{value} %")),
        ..Default::default()
    })
    .extend_axis(Axis {
        kind: Some(AxisType::Value),
        show: Some(false),
        scale: Some(false),
        min: Some(AxisBound::Value(0.0)),
        max: Some(AxisBound::Value(500.0)),
        ..Default::default()
    })
    .add_series(
        Series::candlestick("kline", candles(&closes))
            .with_item_style(ItemStyle {
                color: Some(RISE_COLOR.to_string()),
                color0: Some(FALL_COLOR.to_string()),
                border_color: Some(RISE_COLOR.to_string()),
                border_color0: Some(FALL_COLOR.to_string()),
                opacity: None,
            })
            .with_mark_line(MarkLine::min_max("最低价", "最高价", Some("none"))),
        true,
    )
}

fn siv_lines(frame: &SivFrame, bands: &IvpBands) -> ChartOption {
    let iv = frame.column(|r| r.iv);
    let ivp = frame.column(|r| r.ivp);
    // historical volatility is only switched on when there is no IV to compare
    let hv_show = all_missing(&iv);

    let vol_line = |name: &str, values: Vec<Option<f64>>, style: LineStyle| {
        Series::line(name, &values)
            .on_y_axis(VOL_AXIS)
            .with_line_style(style)
    };
    let ivp_line = |name: &str, values: &[Option<f64>], color: &str| {
        Series::line(name, values)
            .on_y_axis(IVP_AXIS)
            .with_line_style(LineStyle::new(1.0, 1.2).color(color))
    };

    ChartOption::default()
        .add_series(
            vol_line("siv", scale(&iv, 100.0), LineStyle::new(1.0, 1.5))
                .with_mark_line(MarkLine::min_max("ivl", "ivh", None)),
            true,
        )
        .add_series(
            vol_line(
                "siv5",
                scale(&rolling_mean(&iv, 5), 100.0),
                LineStyle::new(0.9, 1.2).color("gold"),
            ),
            true,
        )
        .add_series(
            vol_line(
                "siv10",
                scale(&rolling_mean(&iv, 10), 100.0),
                LineStyle::new(0.9, 1.2).color("cyan"),
            ),
            true,
        )
        .add_series(
            vol_line(
                "hv20",
                scale(&frame.column(|r| r.hv20), 100.0),
                LineStyle::new(0.9, 1.2).color("black"),
            ),
            hv_show,
        )
        .add_series(
            vol_line(
                "hv250",
                scale(&frame.column(|r| r.hv250), 100.0),
                LineStyle::new(0.8, 1.0),
            ),
            hv_show,
        )
        .add_series(ivp_line("ivp", &ivp, "cyan"), true)
        .add_series(ivp_line("ivp_warn", &ivp_warn(&ivp, bands), "red"), true)
}

/// Kline of the product close overlaid with IV, HV and IV percentile lines
pub fn siv_kline_chart(frame: &SivFrame, product: &str, bands: &IvpBands) -> ChartOption {
    kline(frame, product).overlap(siv_lines(frame, bands))
}
