//! BetLab CLI
//!
//! Usage:
//!   betlab report --variant optimal --kelly-floor 2 --set home.edge=6
//!   betlab variants
//!   betlab sweep --kelly-floors 0,1,2,3,5
//!   betlab defaults

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io;
use tracing::{info, warn};

use betlab::config::{AppConfig, OutputFormat};
use betlab::engine::{aggregate, sweep_kelly_floor};
use betlab::report::{render_sweep, render_thresholds, Report};
use betlab::store::RecordStore;
use betlab::thresholds::{defaults, parse_assignment, MarketField, ThresholdConfig, ThresholdPreset};
use betlab::types::Market;

/// Threshold-driven backtest aggregation
#[derive(Parser, Debug)]
#[command(name = "betlab")]
#[command(version)]
struct Cli {
    /// Backtest dataset (overrides data.path)
    #[arg(long, global = true)]
    data: Option<String>,

    /// Threshold preset, YAML or JSON (overrides data.preset)
    #[arg(long, global = true)]
    preset: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate the dataset under the current thresholds
    Report(ReportArgs),
    /// List strategy variants in the dataset
    Variants,
    /// Kelly-floor sensitivity table
    Sweep(SweepArgs),
    /// Print the baseline thresholds
    Defaults,
}

#[derive(Args, Debug)]
struct ThresholdArgs {
    /// Strategy variant to aggregate
    #[arg(long)]
    variant: Option<String>,

    /// Minimum Kelly stake (%) for every market
    #[arg(long)]
    kelly_floor: Option<f64>,

    /// Market edit, e.g. `home.edge=6`, `draw.prob=30`, `ah_away.enabled=false`
    #[arg(long = "set", value_name = "MARKET.FIELD=VALUE")]
    sets: Vec<String>,

    /// Switch a market off
    #[arg(long = "disable", value_name = "MARKET")]
    disabled: Vec<String>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[command(flatten)]
    thresholds: ThresholdArgs,

    /// Output format (overrides output.format)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (overrides output.path)
    #[arg(long)]
    output: Option<String>,
}

#[derive(Args, Debug)]
struct SweepArgs {
    #[command(flatten)]
    thresholds: ThresholdArgs,

    /// Comma-separated Kelly floors to try
    #[arg(long, value_delimiter = ',', default_value = "0,1,2,3,4,5")]
    kelly_floors: Vec<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut app = AppConfig::load()?;
    if let Some(data) = cli.data {
        app.data.path = data;
    }
    if let Some(preset) = cli.preset {
        app.data.preset = Some(preset);
    }

    app.logging.init();
    info!("BetLab {} ({})", env!("CARGO_PKG_VERSION"), app.digest());

    match cli.command {
        Command::Defaults => {
            print!("{}", render_thresholds(&defaults()));
        }
        Command::Variants => {
            let store = load_store(&app)?;
            println!("{:<20} {:>8} {:>8} {:>8}", "variant", "groups", "records", "leagues");
            for (variant, summary) in store.summary() {
                println!(
                    "{:<20} {:>8} {:>8} {:>8}",
                    variant, summary.groups, summary.records, summary.leagues
                );
            }
        }
        Command::Report(args) => {
            let store = load_store(&app)?;
            let config = build_thresholds(&app, &args.thresholds)?;
            if store.groups_for(config.strategy_variant()).next().is_none() {
                warn!(
                    variant = config.strategy_variant(),
                    available = ?store.variants(),
                    "No groups for selected variant"
                );
            }

            let result = aggregate(&store, &config);
            let report = Report::build(&config, &result);
            let format = args.format.unwrap_or(app.output.format);
            let output = args.output.or(app.output.path.clone());
            emit(&report, format, output.as_deref())?;
        }
        Command::Sweep(args) => {
            let store = load_store(&app)?;
            let config = build_thresholds(&app, &args.thresholds)?;
            let points = sweep_kelly_floor(&store, &config, &args.kelly_floors)?;
            print!("{}", render_sweep(&points));
        }
    }

    Ok(())
}

fn load_store(app: &AppConfig) -> Result<RecordStore> {
    RecordStore::from_path(&app.data.path)
        .with_context(|| format!("Failed to load dataset {}", app.data.path))
}

/// Defaults, then preset file, then command-line edits
fn build_thresholds(app: &AppConfig, args: &ThresholdArgs) -> Result<ThresholdConfig> {
    let mut config = defaults();

    if let Some(path) = &app.data.preset {
        let preset = ThresholdPreset::from_path(path)
            .with_context(|| format!("Failed to read preset {}", path))?;
        config = config.apply_preset(&preset)?;
        info!(preset = %path, "Preset applied");
    }
    if let Some(variant) = &args.variant {
        config = config.set_strategy_variant(variant);
    }
    if let Some(kelly) = args.kelly_floor {
        config = config.set_kelly_floor(kelly)?;
    }
    for assignment in &args.sets {
        let (market, field) = parse_assignment(assignment)?;
        config = config.set_market_field(market, field)?;
    }
    for key in &args.disabled {
        let market = Market::parse(key)
            .ok_or_else(|| betlab::error::ConfigurationError::UnknownMarket(key.clone()))?;
        config = config.set_market_field(market, MarketField::Enabled(false))?;
    }

    Ok(config)
}

fn emit(report: &Report, format: OutputFormat, output: Option<&str>) -> Result<()> {
    match (format, output) {
        (OutputFormat::Csv, Some(path)) => report.export_csv(path)?,
        (OutputFormat::Csv, None) => report.write_csv(io::stdout().lock())?,
        (OutputFormat::Json, path) => write_text(&report.to_json()?, path)?,
        (OutputFormat::Table, path) => write_text(&report.render_table(), path)?,
    }
    Ok(())
}

fn write_text(text: &str, output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path))?;
            info!("Report written to {}", path);
        }
        None => println!("{}", text),
    }
    Ok(())
}
