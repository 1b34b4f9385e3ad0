//! HTTP handlers and router
//!
//! `Dashboard` owns the data managers, the memo caches and the template
//! environment. Every handler hands its work to `Dashboard` on the blocking
//! pool, because chart building starts with synchronous CSV reads.

use anyhow::anyhow;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use minijinja::Environment;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::Memo;
use crate::data::{CboeSource, CsvCboeSource, CsvSivSource, SivSource};
use crate::error::{DashboardError, DashboardResult};
use crate::{templates, Config, SivFrame};

pub mod cboe;
pub mod options;

pub use cboe::VixInfo;

/// Shared dashboard services
pub struct Dashboard {
    pub config: Config,
    cboe: Arc<dyn CboeSource>,
    siv: Arc<dyn SivSource>,
    vix_info: Memo<(), VixInfo>,
    siv_info: Memo<NaiveDate, Vec<SivFrame>>,
    templates: Environment<'static>,
}

impl Dashboard {
    pub fn new(
        config: Config,
        cboe: Arc<dyn CboeSource>,
        siv: Arc<dyn SivSource>,
    ) -> Result<Self, minijinja::Error> {
        Ok(Dashboard {
            vix_info: Memo::new(&config.cache),
            siv_info: Memo::new(&config.cache),
            templates: templates::environment()?,
            config,
            cboe,
            siv,
        })
    }

    /// Dashboard backed by the CSV data managers under the configured roots
    pub fn from_config(config: Config) -> Result<Self, minijinja::Error> {
        let cboe = Arc::new(CsvCboeSource::new(&config.data.cboe_dir));
        let siv = Arc::new(CsvSivSource::new(&config.data.options_dir));
        Self::new(config, cboe, siv)
    }

    /// Drop every memoized frame so the next request reloads from disk
    pub fn invalidate(&self) {
        self.vix_info.clear();
        self.siv_info.clear();
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        AppState {
            dashboard: Arc::new(dashboard),
        }
    }
}

/// Run `f` against the dashboard on the blocking pool
async fn blocking<T, F>(state: AppState, f: F) -> DashboardResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Dashboard) -> DashboardResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state.dashboard))
        .await
        .map_err(|e| DashboardError::Data(anyhow!("worker task failed: {}", e)))?
}

/// Wrap a pre-serialized chart option as a JSON response
fn json_body(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Liveness probe
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Build the router with middleware
pub fn router(state: AppState) -> Router {
    let static_dir = state.dashboard.config.server.static_dir.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/vix", get(cboe::vix_page))
        .route("/vix/data", get(cboe::vix_data))
        .route("/vix/data/:index", get(cboe::index_data))
        .route("/siv/:product/:date", get(options::siv_data))
        .route("/:product/:date", get(options::options_page))
        .nest_service("/templates", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.dashboard.config.server.addr();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "vol-dashboard v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
