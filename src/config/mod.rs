//! Runtime settings for the BetLab binary
//!
//! Loads from optional config files + environment variables via .env.
//! Threshold floors live in `thresholds::defaults`, not here.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data: DataConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Backtest dataset (JSON array of groups)
    pub path: String,
    /// Optional threshold preset applied on top of the defaults
    #[serde(default)]
    pub preset: Option<String>,
}

/// Report rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Write the report here instead of stdout
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Emit JSON log lines
    pub json: bool,
}

impl LoggingConfig {
    /// Install the global tracing subscriber (logs go to stderr)
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        if self.json {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        } else {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name("config/local").required(false))
                // Override with environment variables (BETLAB_*)
                .add_source(Environment::with_prefix("BETLAB").separator("__")),
        )
    }

    /// Defaults only; useful for tests and embedding
    pub fn from_defaults() -> Result<Self> {
        Self::from_builder(Config::builder())
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let config = builder
            .set_default("data.path", "data/sample_backtest.json")?
            .set_default("output.format", "table")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate a one-line digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "data={} preset={} format={:?} output={}",
            self.data.path,
            self.data.preset.as_deref().unwrap_or("none"),
            self.output.format,
            self.output.path.as_deref().unwrap_or("stdout"),
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
