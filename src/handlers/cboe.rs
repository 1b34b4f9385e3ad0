//! CBOE VIX/GVZ/OVX dashboard

use anyhow::Context;
use axum::extract::{Path, State};
use axum::response::{Html, Response};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::charts::{self, dump_options};
use crate::error::DashboardResult;
use crate::{CboeIndex, IndexAnalysis, TermStructure};

use super::{blocking, json_body, AppState, Dashboard};

/// Everything the CBOE page needs, loaded once per process
#[derive(Debug, Clone)]
pub struct VixInfo {
    pub term: TermStructure,
    pub analyses: HashMap<CboeIndex, IndexAnalysis>,
}

impl VixInfo {
    pub fn analysis(&self, index: CboeIndex) -> anyhow::Result<&IndexAnalysis> {
        self.analyses
            .get(&index)
            .with_context(|| format!("No analysis loaded for {}", index))
    }
}

impl Dashboard {
    /// Query the term structure and all index analyses, memoized
    pub fn vix_info(&self) -> DashboardResult<Arc<VixInfo>> {
        let info = self.vix_info.get_or_try_insert_with((), || {
            info!("Loading CBOE data");
            let term = self.cboe.term_structure()?;
            let analyses = CboeIndex::ALL
                .iter()
                .map(|&index| Ok((index, self.cboe.analyze(index)?)))
                .collect::<anyhow::Result<HashMap<_, _>>>()?;
            Ok::<_, anyhow::Error>(VixInfo { term, analyses })
        })?;
        Ok(info)
    }

    /// Term structure chart option JSON
    pub fn vix_data(&self) -> DashboardResult<String> {
        let info = self.vix_info()?;
        let chart = charts::vix_term_chart(
            &info.term,
            info.analysis(CboeIndex::Vix)?,
            &self.config.warning,
        );
        Ok(dump_options(&chart)?)
    }

    /// Single index chart option JSON
    pub fn index_data(&self, index: &str) -> DashboardResult<String> {
        let index: CboeIndex = index.parse()?;
        let info = self.vix_info()?;
        let chart = charts::index_chart(info.analysis(index)?, &self.config.warning);
        Ok(dump_options(&chart)?)
    }

    pub fn vix_page(&self) -> DashboardResult<String> {
        Ok(crate::templates::render_vix(&self.templates)?)
    }
}

pub async fn vix_page(State(state): State<AppState>) -> DashboardResult<Html<String>> {
    blocking(state, |d| d.vix_page()).await.map(Html)
}

pub async fn vix_data(State(state): State<AppState>) -> DashboardResult<Response> {
    blocking(state, |d| d.vix_data()).await.map(json_body)
}

pub async fn index_data(
    State(state): State<AppState>,
    Path(index): Path<String>,
) -> DashboardResult<Response> {
    blocking(state, move |d| d.index_data(&index)).await.map(json_body)
}
