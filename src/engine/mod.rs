//! Aggregation Engine
//!
//! Replays the record store against a threshold configuration and rolls the
//! accepted bets up three ways: globally, per market, and per league per
//! market. Every call is a full recomputation; nothing is cached between
//! calls and the inputs are never modified.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ConfigurationError;
use crate::store::{BetRecord, RecordStore};
use crate::thresholds::ThresholdConfig;
use crate::types::{LeagueKey, Market};

/// Counter triple over a filtered subset of records.
///
/// `win_count <= bet_count` always holds; only the engine accumulates into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RollupStats {
    bet_count: u64,
    win_count: u64,
    total_pnl: f64,
}

impl RollupStats {
    /// Build from precomputed counters; `None` if wins exceed bets
    pub fn from_counts(bet_count: u64, win_count: u64, total_pnl: f64) -> Option<Self> {
        (win_count <= bet_count).then_some(Self {
            bet_count,
            win_count,
            total_pnl,
        })
    }

    fn record(&mut self, bet: &BetRecord) {
        self.bet_count += 1;
        self.win_count += u64::from(bet.won);
        self.total_pnl += bet.profit_and_loss;
    }

    fn merge(&mut self, other: &RollupStats) {
        self.bet_count += other.bet_count;
        self.win_count += other.win_count;
        self.total_pnl += other.total_pnl;
    }

    pub fn bet_count(&self) -> u64 {
        self.bet_count
    }

    pub fn win_count(&self) -> u64 {
        self.win_count
    }

    pub fn total_pnl(&self) -> f64 {
        self.total_pnl
    }

    pub fn loss_count(&self) -> u64 {
        self.bet_count.saturating_sub(self.win_count)
    }

    pub fn is_empty(&self) -> bool {
        self.bet_count == 0
    }
}

/// Per-market rollups, always holding an entry for every known market
pub type MarketRollups = BTreeMap<Market, RollupStats>;

fn zeroed_markets() -> MarketRollups {
    Market::ALL
        .into_iter()
        .map(|m| (m, RollupStats::default()))
        .collect()
}

/// Why a record was not counted as a placed bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    UnknownMarket,
    Disabled,
    BelowEdgeFloor,
    BelowProbabilityFloor,
    BelowKellyFloor,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::UnknownMarket => write!(f, "unknown_market"),
            RejectReason::Disabled => write!(f, "disabled"),
            RejectReason::BelowEdgeFloor => write!(f, "below_edge_floor"),
            RejectReason::BelowProbabilityFloor => write!(f, "below_probability_floor"),
            RejectReason::BelowKellyFloor => write!(f, "below_kelly_floor"),
        }
    }
}

/// Outcome of applying the thresholds to one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept(Market),
    Reject(RejectReason),
}

/// Apply the current rules to a single record.
///
/// All three floors are inclusive and must hold together.
pub fn evaluate(record: &BetRecord, config: &ThresholdConfig) -> Decision {
    let Some(market) = record.market() else {
        return Decision::Reject(RejectReason::UnknownMarket);
    };

    let threshold = config.market(market);
    if !threshold.enabled {
        return Decision::Reject(RejectReason::Disabled);
    }
    if record.edge_percentage < threshold.edge_floor {
        return Decision::Reject(RejectReason::BelowEdgeFloor);
    }
    // Scale the floor, not the record: 0.57 * 100.0 lands below 57.0
    if record.model_probability < threshold.probability_floor / 100.0 {
        return Decision::Reject(RejectReason::BelowProbabilityFloor);
    }
    if record.kelly_percentage < config.kelly_floor() {
        return Decision::Reject(RejectReason::BelowKellyFloor);
    }

    Decision::Accept(market)
}

/// Skipped-record counts per reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipBreakdown {
    pub unknown_market: u64,
    pub disabled: u64,
    pub below_edge_floor: u64,
    pub below_probability_floor: u64,
    pub below_kelly_floor: u64,
}

impl SkipBreakdown {
    fn record(&mut self, reason: RejectReason) {
        let slot = match reason {
            RejectReason::UnknownMarket => &mut self.unknown_market,
            RejectReason::Disabled => &mut self.disabled,
            RejectReason::BelowEdgeFloor => &mut self.below_edge_floor,
            RejectReason::BelowProbabilityFloor => &mut self.below_probability_floor,
            RejectReason::BelowKellyFloor => &mut self.below_kelly_floor,
        };
        *slot += 1;
    }

    pub fn get(&self, reason: RejectReason) -> u64 {
        match reason {
            RejectReason::UnknownMarket => self.unknown_market,
            RejectReason::Disabled => self.disabled,
            RejectReason::BelowEdgeFloor => self.below_edge_floor,
            RejectReason::BelowProbabilityFloor => self.below_probability_floor,
            RejectReason::BelowKellyFloor => self.below_kelly_floor,
        }
    }

    pub fn total(&self) -> u64 {
        self.unknown_market
            + self.disabled
            + self.below_edge_floor
            + self.below_probability_floor
            + self.below_kelly_floor
    }
}

/// Engine output; owns no references into the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub global: RollupStats,
    pub by_market: MarketRollups,
    pub by_league: BTreeMap<LeagueKey, MarketRollups>,
    /// Records in the selected variant, accepted or not
    pub considered: u64,
    pub skipped: SkipBreakdown,
}

impl AggregationResult {
    fn empty() -> Self {
        Self {
            global: RollupStats::default(),
            by_market: zeroed_markets(),
            by_league: BTreeMap::new(),
            considered: 0,
            skipped: SkipBreakdown::default(),
        }
    }

    /// Rollup for one market (zeroed entries are always present)
    pub fn market(&self, market: Market) -> RollupStats {
        self.by_market.get(&market).copied().unwrap_or_default()
    }

    /// Rollup for one league/market pair, if the league is in the working set
    pub fn league_market(&self, league: &str, market: Market) -> Option<RollupStats> {
        self.by_league
            .get(league)
            .map(|markets| markets.get(&market).copied().unwrap_or_default())
    }

    /// League-level total across markets
    pub fn league_total(&self, league: &str) -> Option<RollupStats> {
        self.by_league.get(league).map(|markets| {
            markets.values().fold(RollupStats::default(), |mut acc, s| {
                acc.merge(s);
                acc
            })
        })
    }
}

/// Recompute every rollup for one configuration.
///
/// `global` is summed directly from accepted records, never derived from the
/// per-market buckets.
pub fn aggregate(store: &RecordStore, config: &ThresholdConfig) -> AggregationResult {
    let mut result = AggregationResult::empty();

    for group in store.groups_for(config.strategy_variant()) {
        for bet in &group.bets {
            result.considered += 1;

            let market = match evaluate(bet, config) {
                Decision::Accept(market) => market,
                Decision::Reject(reason) => {
                    result.skipped.record(reason);
                    continue;
                }
            };

            result.global.record(bet);
            result.by_market.entry(market).or_default().record(bet);
            result
                .by_league
                .entry(group.league.clone())
                .or_insert_with(zeroed_markets)
                .entry(market)
                .or_default()
                .record(bet);
        }
    }

    debug!(
        variant = config.strategy_variant(),
        considered = result.considered,
        accepted = result.global.bet_count,
        leagues = result.by_league.len(),
        "Aggregation complete"
    );

    result
}

/// Global rollup at one candidate Kelly floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    pub kelly_floor: f64,
    pub global: RollupStats,
}

/// Re-run the aggregation once per Kelly floor, all else unchanged
pub fn sweep_kelly_floor(
    store: &RecordStore,
    config: &ThresholdConfig,
    floors: &[f64],
) -> Result<Vec<SweepPoint>, ConfigurationError> {
    floors
        .iter()
        .map(|&floor| {
            let candidate = config.set_kelly_floor(floor)?;
            Ok(SweepPoint {
                kelly_floor: floor,
                global: aggregate(store, &candidate).global,
            })
        })
        .collect()
}
