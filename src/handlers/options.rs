//! Options implied-volatility dashboard

use axum::extract::{Path, State};
use axum::response::{Html, Response};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

use crate::charts::{dump_options, siv_kline_chart};
use crate::error::{DashboardError, DashboardResult};
use crate::{format_date, parse_date, templates, SivFrame};

use super::{blocking, json_body, AppState, Dashboard};

impl Dashboard {
    /// All product frames prepared up to `date`, memoized per date
    pub fn siv_info(&self, date: NaiveDate) -> DashboardResult<Arc<Vec<SivFrame>>> {
        let frames = self.siv_info.get_or_try_insert_with(date, || {
            info!("Preparing SIV frames for {}", date);
            self.siv.prepare(date)
        })?;
        Ok(frames)
    }

    /// The frame for one product key, rows on or before `date`
    pub fn iv_data(&self, product: &str, date: NaiveDate) -> DashboardResult<SivFrame> {
        let group = self
            .config
            .product_group(product)
            .ok_or_else(|| DashboardError::UnknownProduct(product.to_string()))?;

        let frames = self.siv_info(date)?;
        let frame = frames
            .iter()
            .find(|f| f.product_group == group)
            .map(|f| f.until(date))
            .filter(|f| !f.is_empty())
            .ok_or_else(|| DashboardError::NoData(group.to_string()))?;

        debug!("{} ({}): {} rows up to {}", product, group, frame.rows.len(), date);
        Ok(frame)
    }

    /// Kline chart option JSON for a product
    pub fn siv_data(&self, product: &str, date: &str) -> DashboardResult<String> {
        let date = parse_date(date)?;
        let frame = self.iv_data(product, date)?;
        let chart = siv_kline_chart(&frame, product, &self.config.ivp);
        Ok(dump_options(&chart)?)
    }

    pub fn options_page(&self, product: &str, date: &str) -> DashboardResult<String> {
        let date = parse_date(date)?;
        if self.config.product_group(product).is_none() {
            return Err(DashboardError::UnknownProduct(product.to_string()));
        }
        Ok(templates::render_options(
            &self.templates,
            product,
            &format_date(date),
            &self.config.product_keys(),
        )?)
    }
}

pub async fn options_page(
    State(state): State<AppState>,
    Path((product, date)): Path<(String, String)>,
) -> DashboardResult<Html<String>> {
    blocking(state, move |d| d.options_page(&product, &date))
        .await
        .map(Html)
}

pub async fn siv_data(
    State(state): State<AppState>,
    Path((product, date)): Path<(String, String)>,
) -> DashboardResult<Response> {
    blocking(state, move |d| d.siv_data(&product, &date))
        .await
        .map(json_body)
}
