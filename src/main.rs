//! Volatility dashboard - main entry point
//!
//! This binary provides three subcommands:
//! - serve: Run the dashboard HTTP server
//! - render: Print a chart option as JSON without starting the server
//! - warnings: List the warning windows detected on an index

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "vol-dashboard")]
#[command(about = "CBOE volatility and options implied-volatility dashboards", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the dashboard server
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/dashboard.json")]
        config: String,

        /// Listen host (overrides config file)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Render a chart option to stdout
    Render {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/dashboard.json")]
        config: String,

        #[command(subcommand)]
        target: commands::render::Target,
    },

    /// List warning windows for a CBOE index
    Warnings {
        /// Index name (vix, gvz, ovx)
        #[arg(default_value = "vix")]
        index: String,

        /// Path to configuration file
        #[arg(short, long, default_value = "configs/dashboard.json")]
        config: String,
    },
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    // {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!("{},hyper=warn,hyper_util=warn,h2=warn,tower_http=info", level);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(tracing_appender::rolling::never("logs", &log_filename))
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    // file_only keeps stdout clean for JSON output
    let console_layer = (!file_only).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if !file_only {
        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let (command_name, file_only) = match &cli.command {
        Commands::Serve { .. } => ("serve", false),
        Commands::Render { .. } => ("render", true),
        Commands::Warnings { .. } => ("warnings", false),
    };

    setup_logging(cli.verbose, command_name, file_only)?;

    match cli.command {
        Commands::Serve { config, host, port } => commands::serve::run(config, host, port),
        Commands::Render { config, target } => commands::render::run(config, target),
        Commands::Warnings { index, config } => commands::warnings::run(index, config),
    }
}
