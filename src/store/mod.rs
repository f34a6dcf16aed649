//! Record Store - immutable backtest dataset
//!
//! Holds every simulated bet, grouped by match and strategy variant. Loaded
//! once, read-only afterwards; safe to share across threads behind an `Arc`.

pub mod wire;

pub use wire::{parse_groups, RawBet, RawGroup};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{DataFormatError, Result};
use crate::types::{LeagueKey, Market, VariantKey};

/// One simulated betting decision for one market on one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRecord {
    /// Market key as found in the dataset; may be outside the known set
    pub market: String,
    /// Model win probability (0.0 - 1.0)
    pub model_probability: f64,
    /// Edge over the bookmaker's implied probability, in percent
    pub edge_percentage: f64,
    /// Recommended Kelly stake, in percent of bankroll
    pub kelly_percentage: f64,
    /// Did the bet settle as a win?
    pub won: bool,
    /// Profit/loss in staking units
    pub profit_and_loss: f64,
    /// Best available odds (informational)
    pub best_odds: Option<f64>,
}

impl BetRecord {
    /// Resolve the record's market against the known set
    pub fn market(&self) -> Option<Market> {
        Market::parse(&self.market)
    }
}

/// One match under one strategy variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetGroup {
    pub league: LeagueKey,
    pub strategy_variant: VariantKey,
    pub date: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub bets: Vec<BetRecord>,
}

/// Group/record counts for one strategy variant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantSummary {
    pub groups: usize,
    pub records: usize,
    pub leagues: usize,
}

/// Immutable backtest dataset
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    groups: Vec<BetGroup>,
}

impl RecordStore {
    /// Validate raw groups and build the store.
    ///
    /// Fails on the first group lacking a league or variant tag, or on the
    /// first record with a malformed field.
    pub fn load(raw_groups: Vec<RawGroup>) -> std::result::Result<Self, DataFormatError> {
        let groups = raw_groups
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| raw.into_group(idx))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let store = Self { groups };
        info!(
            groups = store.groups.len(),
            records = store.record_count(),
            variants = ?store.variants(),
            "Record store loaded"
        );
        Ok(store)
    }

    /// Load from a JSON document
    pub fn from_json_str(json: &str) -> std::result::Result<Self, DataFormatError> {
        Self::load(parse_groups(json)?)
    }

    /// Load from a JSON file on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        info!(path = %path.display(), bytes = json.len(), "Reading dataset");
        Ok(Self::from_json_str(&json)?)
    }

    /// Groups belonging to one strategy variant (exact match).
    ///
    /// An unknown variant yields an empty iterator.
    pub fn groups_for<'a>(&'a self, variant: &'a str) -> impl Iterator<Item = &'a BetGroup> + 'a {
        self.groups
            .iter()
            .filter(move |g| g.strategy_variant == variant)
    }

    /// All groups, in load order
    pub fn groups(&self) -> &[BetGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|g| g.bets.len()).sum()
    }

    /// Distinct strategy variants, sorted
    pub fn variants(&self) -> Vec<VariantKey> {
        self.groups
            .iter()
            .map(|g| g.strategy_variant.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct leagues present under one variant, sorted
    pub fn leagues(&self, variant: &str) -> Vec<LeagueKey> {
        self.groups_for(variant)
            .map(|g| g.league.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Group/record/league counts per variant
    pub fn summary(&self) -> BTreeMap<VariantKey, VariantSummary> {
        let mut leagues: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut summary: BTreeMap<VariantKey, VariantSummary> = BTreeMap::new();

        for group in &self.groups {
            let entry = summary.entry(group.strategy_variant.clone()).or_default();
            entry.groups += 1;
            entry.records += group.bets.len();
            leagues
                .entry(group.strategy_variant.as_str())
                .or_default()
                .insert(group.league.as_str());
        }

        for (variant, entry) in summary.iter_mut() {
            entry.leagues = leagues.get(variant.as_str()).map_or(0, |s| s.len());
        }

        summary
    }
}
