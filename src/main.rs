//! # trendcast
//!
//! Rank the series of a monthly CSV by recent growth and forecast one of them.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use trendcast::config::EngineConfig;
use trendcast::engine::TrendEngine;
use trendcast::report::DashboardReport;
use trendcast::ForecastError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "trendcast")]
#[command(about = "Growth ranking and seasonal forecasts for monthly series", long_about = None)]
struct Cli {
    /// Wide CSV: period column followed by one column per series
    input: PathBuf,

    /// Series to forecast (default: fastest growing)
    #[arg(short, long)]
    series: Option<String>,

    /// Months shown before the end of the forecast
    #[arg(short, long)]
    months: Option<u32>,

    /// Future periods to forecast
    #[arg(long)]
    horizon: Option<usize>,

    /// Number of ranked series
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

fn run(cli: Cli) -> Result<(), ForecastError> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(months) = cli.months {
        config.display_months = months;
    }
    if let Some(horizon) = cli.horizon {
        config.horizon = horizon;
    }
    if let Some(k) = cli.top_k {
        config.ranking.top_k = k;
    }

    let display_months = config.display_months;
    let engine = TrendEngine::from_csv_path(&cli.input, config)?;
    let report = DashboardReport::build(&engine, cli.series.as_deref(), display_months)?;

    match cli.format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trendcast=info".into()),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "trendcast failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
