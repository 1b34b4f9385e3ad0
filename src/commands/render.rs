//! Render command implementation
//!
//! Builds the same chart option JSON the server returns and prints it to
//! stdout, which makes it easy to diff charts between data refreshes.

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;
use vol_dashboard::{Config, Dashboard};

#[derive(Subcommand, Debug)]
pub enum Target {
    /// VIX term structure with warning windows
    Vix,

    /// Single CBOE index with Bollinger Bands
    Index {
        /// Index name (vix, gvz, ovx)
        name: String,
    },

    /// Options IV kline chart for a product
    Siv {
        /// Product key, e.g. "cu"
        product: String,

        /// Cut-off date (YYYY-MM-DD)
        date: String,
    },
}

pub fn run(config_path: String, target: Target) -> Result<()> {
    let config = Config::load(&config_path).context("Failed to load configuration")?;
    let dashboard = Dashboard::from_config(config).context("Failed to build page templates")?;

    info!("Rendering {:?}", target);
    let json = match &target {
        Target::Vix => dashboard.vix_data(),
        Target::Index { name } => dashboard.index_data(name),
        Target::Siv { product, date } => dashboard.siv_data(product, date),
    }
    .with_context(|| format!("Failed to render {:?}", target))?;

    println!("{}", json);
    Ok(())
}
