//! Threshold Configuration - the decision surface
//!
//! Per-market edge/probability floors with an enable switch, one Kelly floor
//! shared by all markets, and the selected strategy variant.
//!
//! Values are immutable: every setter validates and returns a new
//! configuration, so an out-of-range state can never be built.

pub mod defaults;

pub use defaults::{
    defaults, market_default, MarketDefault, KELLY_FLOOR_DEFAULT, MARKET_DEFAULTS,
    STRATEGY_VARIANT_DEFAULT,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::debug;

use crate::error::{ConfigurationError, Result};
use crate::types::Market;

/// Legal edge floor (%)
pub const EDGE_FLOOR_RANGE: RangeInclusive<f64> = -10.0..=50.0;
/// Legal probability floor (0-100)
pub const PROBABILITY_FLOOR_RANGE: RangeInclusive<f64> = 0.0..=100.0;
/// Legal Kelly floor (%)
pub const KELLY_FLOOR_RANGE: RangeInclusive<f64> = 0.0..=100.0;

/// Floors for one market
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketThreshold {
    /// Minimum edge, in percent
    pub edge_floor: f64,
    /// Minimum model probability, expressed 0-100
    pub probability_floor: f64,
    pub enabled: bool,
}

/// A single field edit on one market
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarketField {
    EdgeFloor(f64),
    ProbabilityFloor(f64),
    Enabled(bool),
}

impl MarketField {
    /// Build a typed edit from a field name and textual value
    /// (`edge=6.5`, `prob=45`, `enabled=false`)
    pub fn parse(field: &str, value: &str) -> std::result::Result<Self, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        };

        match field.trim().to_lowercase().as_str() {
            "edge" | "edge_floor" => value
                .trim()
                .parse::<f64>()
                .map(MarketField::EdgeFloor)
                .map_err(|_| invalid()),
            "prob" | "probability" | "probability_floor" => value
                .trim()
                .parse::<f64>()
                .map(MarketField::ProbabilityFloor)
                .map_err(|_| invalid()),
            "enabled" | "enable" => parse_bool(value)
                .map(MarketField::Enabled)
                .ok_or_else(invalid),
            other => Err(ConfigurationError::UnknownField(other.to_string())),
        }
    }
}

/// Parse a `market.field=value` assignment
pub fn parse_assignment(
    assignment: &str,
) -> std::result::Result<(Market, MarketField), ConfigurationError> {
    let (lhs, value) = assignment
        .split_once('=')
        .ok_or_else(|| ConfigurationError::InvalidValue {
            field: assignment.to_string(),
            value: String::new(),
        })?;
    let (market_key, field) = lhs
        .rsplit_once('.')
        .ok_or_else(|| ConfigurationError::UnknownField(lhs.to_string()))?;
    let market = Market::parse(market_key)
        .ok_or_else(|| ConfigurationError::UnknownMarket(market_key.to_string()))?;
    Ok((market, MarketField::parse(field, value)?))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    range: &RangeInclusive<f64>,
) -> std::result::Result<f64, ConfigurationError> {
    if !value.is_finite() {
        return Err(ConfigurationError::NotFinite { field });
    }
    if !range.contains(&value) {
        return Err(ConfigurationError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        });
    }
    Ok(value)
}

/// Full threshold configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdConfig {
    markets: BTreeMap<Market, MarketThreshold>,
    kelly_floor: f64,
    strategy_variant: String,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        defaults()
    }
}

impl ThresholdConfig {
    /// Floors for one market
    pub fn market(&self, market: Market) -> MarketThreshold {
        self.markets.get(&market).copied().unwrap_or_else(|| {
            let row = market_default(market);
            MarketThreshold {
                edge_floor: row.edge_floor,
                probability_floor: row.probability_floor,
                enabled: row.enabled,
            }
        })
    }

    /// All markets with their floors, in display order
    pub fn markets(&self) -> impl Iterator<Item = (Market, MarketThreshold)> + '_ {
        Market::ALL.into_iter().map(move |m| (m, self.market(m)))
    }

    pub fn kelly_floor(&self) -> f64 {
        self.kelly_floor
    }

    pub fn strategy_variant(&self) -> &str {
        &self.strategy_variant
    }

    /// Markets currently switched on
    pub fn enabled_markets(&self) -> Vec<Market> {
        self.markets()
            .filter(|(_, t)| t.enabled)
            .map(|(m, _)| m)
            .collect()
    }

    /// Return a copy with one market field changed
    pub fn set_market_field(
        &self,
        market: Market,
        field: MarketField,
    ) -> std::result::Result<Self, ConfigurationError> {
        let mut threshold = self.market(market);
        match field {
            MarketField::EdgeFloor(v) => {
                threshold.edge_floor = check_range("edge_floor", v, &EDGE_FLOOR_RANGE)?;
            }
            MarketField::ProbabilityFloor(v) => {
                threshold.probability_floor =
                    check_range("probability_floor", v, &PROBABILITY_FLOOR_RANGE)?;
            }
            MarketField::Enabled(v) => threshold.enabled = v,
        }

        debug!(market = %market, ?field, "Threshold updated");
        let mut next = self.clone();
        next.markets.insert(market, threshold);
        Ok(next)
    }

    /// Return a copy with a new Kelly floor
    pub fn set_kelly_floor(&self, value: f64) -> std::result::Result<Self, ConfigurationError> {
        let kelly_floor = check_range("kelly_floor", value, &KELLY_FLOOR_RANGE)?;
        Ok(Self {
            kelly_floor,
            ..self.clone()
        })
    }

    /// Return a copy selecting another strategy variant.
    ///
    /// Any key is accepted; one with no matching groups simply aggregates to
    /// zero.
    pub fn set_strategy_variant(&self, key: &str) -> Self {
        Self {
            strategy_variant: key.trim().to_string(),
            ..self.clone()
        }
    }

    /// Discard every edit and return the baseline
    pub fn reset_to_defaults(&self) -> Self {
        defaults()
    }

    /// Apply a partial override document through the validated setters
    pub fn apply_preset(
        &self,
        preset: &ThresholdPreset,
    ) -> std::result::Result<Self, ConfigurationError> {
        let mut next = self.clone();

        if let Some(kelly) = preset.kelly_floor {
            next = next.set_kelly_floor(kelly)?;
        }
        if let Some(variant) = &preset.strategy_variant {
            next = next.set_strategy_variant(variant);
        }

        for (key, overrides) in &preset.markets {
            let market =
                Market::parse(key).ok_or_else(|| ConfigurationError::UnknownMarket(key.clone()))?;
            if let Some(v) = overrides.edge_floor {
                next = next.set_market_field(market, MarketField::EdgeFloor(v))?;
            }
            if let Some(v) = overrides.probability_floor {
                next = next.set_market_field(market, MarketField::ProbabilityFloor(v))?;
            }
            if let Some(v) = overrides.enabled {
                next = next.set_market_field(market, MarketField::Enabled(v))?;
            }
        }

        Ok(next)
    }
}

/// Optional per-market overrides in a preset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketPreset {
    #[serde(default, alias = "edge")]
    pub edge_floor: Option<f64>,
    #[serde(default, alias = "probability", alias = "prob")]
    pub probability_floor: Option<f64>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Partial threshold override document (YAML or JSON)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPreset {
    #[serde(default)]
    pub kelly_floor: Option<f64>,
    #[serde(default, alias = "variant")]
    pub strategy_variant: Option<String>,
    #[serde(default)]
    pub markets: BTreeMap<String, MarketPreset>,
}

impl ThresholdPreset {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }
}
