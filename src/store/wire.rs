//! Wire format adapter
//!
//! Backtest exports use one-letter keys (`l`, `c`, `b`, `m`, `p`, ...). This is
//! the only place that knows about them; everything downstream works on the
//! typed [`BetGroup`] / [`BetRecord`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BetGroup, BetRecord};
use crate::error::DataFormatError;

/// One group exactly as it appears in a dataset file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGroup {
    #[serde(rename = "l", alias = "league", default)]
    pub league: Option<String>,
    #[serde(
        rename = "c",
        alias = "strategy_variant",
        alias = "strategyVariant",
        alias = "variant",
        default
    )]
    pub strategy_variant: Option<String>,
    #[serde(rename = "d", alias = "date", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "h", alias = "home_team", default, skip_serializing_if = "Option::is_none")]
    pub home_team: Option<String>,
    #[serde(rename = "a", alias = "away_team", default, skip_serializing_if = "Option::is_none")]
    pub away_team: Option<String>,
    #[serde(rename = "b", alias = "bets", default)]
    pub bets: Option<Vec<RawBet>>,
}

/// One bet exactly as it appears in a dataset file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBet {
    #[serde(rename = "m", alias = "market", default)]
    pub market: Option<String>,
    #[serde(
        rename = "p",
        alias = "probability",
        alias = "model_probability",
        alias = "modelProbability",
        default
    )]
    pub probability: Option<f64>,
    #[serde(
        rename = "e",
        alias = "edge",
        alias = "edge_percentage",
        alias = "edgePercentage",
        default
    )]
    pub edge: Option<f64>,
    #[serde(
        rename = "k",
        alias = "kelly",
        alias = "kelly_percentage",
        alias = "kellyPercentage",
        default
    )]
    pub kelly: Option<f64>,
    #[serde(rename = "w", alias = "won", default)]
    pub won: Option<Value>,
    #[serde(
        rename = "pnl",
        alias = "profit_and_loss",
        alias = "profitAndLoss",
        default
    )]
    pub pnl: Option<f64>,
    #[serde(
        rename = "o",
        alias = "odds",
        alias = "best_odds",
        alias = "bestOdds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub odds: Option<f64>,
}

/// Parse a dataset document into raw groups
pub fn parse_groups(json: &str) -> Result<Vec<RawGroup>, DataFormatError> {
    serde_json::from_str(json).map_err(|e| DataFormatError::Malformed(e.to_string()))
}

impl RawGroup {
    /// Validate and convert into a typed group
    pub(crate) fn into_group(self, group: usize) -> Result<BetGroup, DataFormatError> {
        let league = non_empty(self.league).ok_or(DataFormatError::MissingLeague { group })?;
        let strategy_variant =
            non_empty(self.strategy_variant).ok_or(DataFormatError::MissingVariant { group })?;
        let raw_bets = self.bets.ok_or(DataFormatError::MissingBets { group })?;

        let bets = raw_bets
            .into_iter()
            .enumerate()
            .map(|(record, bet)| bet.into_record(group, record))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BetGroup {
            league,
            strategy_variant,
            date: self.date,
            home_team: self.home_team,
            away_team: self.away_team,
            bets,
        })
    }
}

impl RawBet {
    fn into_record(self, group: usize, record: usize) -> Result<BetRecord, DataFormatError> {
        let missing = |field| DataFormatError::MissingField {
            group,
            record,
            field,
        };
        let finite = |field, value: f64| {
            if value.is_finite() {
                Ok(value)
            } else {
                Err(DataFormatError::OutOfRange {
                    group,
                    record,
                    field,
                    value,
                })
            }
        };

        let market = self.market.ok_or_else(|| missing("market"))?;
        let probability = self.probability.ok_or_else(|| missing("probability"))?;
        let probability = finite("probability", probability)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(DataFormatError::OutOfRange {
                group,
                record,
                field: "probability",
                value: probability,
            });
        }
        let edge = finite("edge", self.edge.ok_or_else(|| missing("edge"))?)?;
        let kelly = finite("kelly", self.kelly.ok_or_else(|| missing("kelly"))?)?;
        let won = parse_win_flag(self.won.ok_or_else(|| missing("won"))?, group, record)?;
        let pnl = finite("pnl", self.pnl.ok_or_else(|| missing("pnl"))?)?;
        let best_odds = self.odds.map(|o| finite("odds", o)).transpose()?;

        Ok(BetRecord {
            market,
            model_probability: probability,
            edge_percentage: edge,
            kelly_percentage: kelly,
            won,
            profit_and_loss: pnl,
            best_odds,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Win flags are 0/1 integers on the wire; booleans are tolerated
fn parse_win_flag(value: Value, group: usize, record: usize) -> Result<bool, DataFormatError> {
    match &value {
        Value::Bool(b) => return Ok(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_u64() {
                match i {
                    0 => return Ok(false),
                    1 => return Ok(true),
                    _ => {}
                }
            } else if let Some(f) = n.as_f64() {
                if f == 0.0 {
                    return Ok(false);
                }
                if f == 1.0 {
                    return Ok(true);
                }
            }
        }
        _ => {}
    }

    Err(DataFormatError::InvalidWinFlag {
        group,
        record,
        value: value.to_string(),
    })
}
