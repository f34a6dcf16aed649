//! Reports - flatten an aggregation into rows and export them
//!
//! Supports:
//! - Plain-text table for the terminal
//! - JSON (rows with projected metrics)
//! - CSV export, one row per rollup

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::engine::{AggregationResult, RollupStats, SweepPoint};
use crate::metrics::{format_percent, project};
use crate::thresholds::ThresholdConfig;
use crate::types::Market;

/// Which rollup a row comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Global,
    Market,
    League,
}

/// One flattened rollup with its projected metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub scope: Scope,
    pub league: Option<String>,
    pub market: Option<Market>,
    pub bets: u64,
    pub wins: u64,
    pub pnl: f64,
    pub win_rate_pct: Option<f64>,
    pub roi_pct: Option<f64>,
}

impl ReportRow {
    fn new(
        scope: Scope,
        league: Option<&str>,
        market: Option<Market>,
        stats: &RollupStats,
    ) -> Self {
        let metrics = project(stats);
        Self {
            scope,
            league: league.map(str::to_string),
            market,
            bets: stats.bet_count(),
            wins: stats.win_count(),
            pnl: stats.total_pnl(),
            win_rate_pct: metrics.win_rate_percent,
            roi_pct: metrics.roi_percent,
        }
    }
}

/// Report for one aggregation run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: String,
    pub strategy_variant: String,
    pub kelly_floor: f64,
    pub considered: u64,
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Flatten global, per-market, then per-league rollups (in that order)
    pub fn build(config: &ThresholdConfig, result: &AggregationResult) -> Self {
        let mut rows = vec![ReportRow::new(Scope::Global, None, None, &result.global)];

        for market in Market::ALL {
            rows.push(ReportRow::new(
                Scope::Market,
                None,
                Some(market),
                &result.market(market),
            ));
        }

        for (league, markets) in &result.by_league {
            for (market, stats) in markets {
                if stats.is_empty() {
                    continue;
                }
                rows.push(ReportRow::new(
                    Scope::League,
                    Some(league.as_str()),
                    Some(*market),
                    stats,
                ));
            }
        }

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            strategy_variant: config.strategy_variant().to_string(),
            kelly_floor: config.kelly_floor(),
            considered: result.considered,
            rows,
        }
    }

    /// Terminal table
    pub fn render_table(&self) -> String {
        let mut out = format!(
            "variant={} kelly_floor={:.1} considered={}\n",
            self.strategy_variant, self.kelly_floor, self.considered
        );
        out.push_str(&format!(
            "{:<8} {:<16} {:<10} {:>6} {:>6} {:>10} {:>8} {:>8}\n",
            "scope", "league", "market", "bets", "wins", "pnl", "win%", "roi%"
        ));

        for row in &self.rows {
            let scope = match row.scope {
                Scope::Global => "global",
                Scope::Market => "market",
                Scope::League => "league",
            };
            out.push_str(&format!(
                "{:<8} {:<16} {:<10} {:>6} {:>6} {:>10.2} {:>8} {:>8}\n",
                scope,
                row.league.as_deref().unwrap_or("-"),
                row.market.map(|m| m.key()).unwrap_or("-"),
                row.bets,
                row.wins,
                row.pnl,
                format_percent(row.win_rate_pct),
                format_percent(row.roi_pct),
            ));
        }

        out
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }

    /// Write rows as CSV (header included)
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = WriterBuilder::new().has_headers(true).from_writer(writer);
        for row in &self.rows {
            csv.serialize(CsvRow::from(row))
                .context("Failed to write report row")?;
        }
        csv.flush().context("Failed to flush CSV writer")?;
        Ok(())
    }

    /// Export rows to a CSV file, replacing it if present
    pub fn export_csv(&self, output_path: impl AsRef<Path>) -> Result<()> {
        let path = output_path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create export directory")?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .context("Failed to create export file")?;

        self.write_csv(file)?;
        info!("Exported {} report rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}

/// CSV cannot hold nested options cleanly; flatten to plain strings
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    scope: Scope,
    league: &'a str,
    market: &'a str,
    bets: u64,
    wins: u64,
    pnl: f64,
    win_rate_pct: String,
    roi_pct: String,
}

impl<'a> From<&'a ReportRow> for CsvRow<'a> {
    fn from(row: &'a ReportRow) -> Self {
        Self {
            scope: row.scope,
            league: row.league.as_deref().unwrap_or(""),
            market: row.market.map(|m| m.key()).unwrap_or(""),
            bets: row.bets,
            wins: row.wins,
            pnl: row.pnl,
            win_rate_pct: row.win_rate_pct.map(|v| v.to_string()).unwrap_or_default(),
            roi_pct: row.roi_pct.map(|v| v.to_string()).unwrap_or_default(),
        }
    }
}

/// Terminal table for a Kelly-floor sweep
pub fn render_sweep(points: &[SweepPoint]) -> String {
    let mut out = format!(
        "{:>8} {:>6} {:>6} {:>10} {:>8} {:>8}\n",
        "kelly", "bets", "wins", "pnl", "win%", "roi%"
    );
    for point in points {
        let metrics = project(&point.global);
        out.push_str(&format!(
            "{:>8.2} {:>6} {:>6} {:>10.2} {:>8} {:>8}\n",
            point.kelly_floor,
            point.global.bet_count(),
            point.global.win_count(),
            point.global.total_pnl(),
            format_percent(metrics.win_rate_percent),
            format_percent(metrics.roi_percent),
        ));
    }
    out
}

/// Terminal table of the current thresholds
pub fn render_thresholds(config: &ThresholdConfig) -> String {
    let mut out = format!(
        "variant={} kelly_floor={:.1}\n{:<10} {:<10} {:>8} {:>8} {:>8}\n",
        config.strategy_variant(),
        config.kelly_floor(),
        "market",
        "label",
        "edge>=",
        "prob>=",
        "enabled"
    );
    for (market, t) in config.markets() {
        out.push_str(&format!(
            "{:<10} {:<10} {:>8.1} {:>8.1} {:>8}\n",
            market.key(),
            market.label(),
            t.edge_floor,
            t.probability_floor,
            t.enabled
        ));
    }
    out
}
