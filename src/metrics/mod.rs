//! Derived Metrics Projector
//!
//! Turns raw rollup counters into display percentages. An empty rollup has
//! no win rate and no ROI; callers get `None`, never `NaN`.

use serde::Serialize;

use crate::engine::RollupStats;

/// Placeholder shown when a percentage is undefined
pub const NO_DATA: &str = "—";

/// Win rate and ROI for one rollup, both in percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProjectedMetrics {
    pub win_rate_percent: Option<f64>,
    pub roi_percent: Option<f64>,
}

impl ProjectedMetrics {
    pub fn has_data(&self) -> bool {
        self.win_rate_percent.is_some()
    }
}

/// Project a rollup into percentages.
///
/// `win_rate = 100 * wins / bets`, `roi = 100 * pnl / bets`; both `None`
/// when `bets == 0` or the result would not be finite.
pub fn project(stats: &RollupStats) -> ProjectedMetrics {
    if stats.bet_count() == 0 {
        return ProjectedMetrics::default();
    }

    let bets = stats.bet_count() as f64;
    ProjectedMetrics {
        win_rate_percent: finite(100.0 * stats.win_count() as f64 / bets),
        roi_percent: finite(100.0 * stats.total_pnl() / bets),
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Render a percentage with one decimal, or the no-data placeholder
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v),
        None => NO_DATA.to_string(),
    }
}
