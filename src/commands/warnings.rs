//! Warnings command implementation

use anyhow::{Context, Result};
use tracing::info;
use vol_dashboard::data::{CboeSource, CsvCboeSource};
use vol_dashboard::warning::warning_areas;
use vol_dashboard::{CboeIndex, Config};

pub fn run(index: String, config_path: String) -> Result<()> {
    let config = Config::load(&config_path).context("Failed to load configuration")?;
    let index: CboeIndex = index.parse()?;

    let source = CsvCboeSource::new(&config.data.cboe_dir);
    let analysis = source.analyze(index)?;
    info!("Loaded {} {} points", analysis.points.len(), index);

    let areas = warning_areas(&analysis.vol_diff_series(), &config.warning);

    println!("\n{}", "=".repeat(60));
    println!("{} WARNING WINDOWS", index.as_str().to_uppercase());
    println!("{}", "=".repeat(60));
    println!(
        "Enter below: {}   Exit at or above: {}",
        config.warning.enter_below, config.warning.exit_at_or_above
    );
    println!("{}", "-".repeat(60));

    if areas.is_empty() {
        println!("No warning windows");
    }
    for (i, area) in areas.iter().enumerate() {
        let days = (area.end - area.start).num_days();
        println!("{:>3}. {}  ({} days)", i + 1, area, days);
    }
    println!("{}", "=".repeat(60));

    Ok(())
}
