//! Baseline threshold table
//!
//! The one place default floors are declared. Startup and "reset" both go
//! through [`defaults`], so they cannot drift apart.

use std::collections::BTreeMap;

use super::{MarketThreshold, ThresholdConfig};
use crate::types::Market;

/// One row of the defaults table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketDefault {
    pub market: Market,
    pub edge_floor: f64,
    pub probability_floor: f64,
    pub enabled: bool,
}

/// Per-market baseline: edge floor (%), probability floor (0-100), enabled
pub const MARKET_DEFAULTS: [MarketDefault; 7] = [
    MarketDefault {
        market: Market::Home,
        edge_floor: 8.0,
        probability_floor: 42.0,
        enabled: true,
    },
    MarketDefault {
        market: Market::Draw,
        edge_floor: 10.0,
        probability_floor: 28.0,
        enabled: true,
    },
    MarketDefault {
        market: Market::Away,
        edge_floor: 9.0,
        probability_floor: 35.0,
        enabled: true,
    },
    MarketDefault {
        market: Market::Over25,
        edge_floor: 5.0,
        probability_floor: 52.0,
        enabled: true,
    },
    MarketDefault {
        market: Market::Under25,
        edge_floor: 5.0,
        probability_floor: 52.0,
        enabled: true,
    },
    MarketDefault {
        market: Market::AhHome,
        edge_floor: 6.0,
        probability_floor: 48.0,
        enabled: true,
    },
    MarketDefault {
        market: Market::AhAway,
        edge_floor: 6.0,
        probability_floor: 48.0,
        enabled: true,
    },
];

/// Minimum Kelly stake (%) applied to every market
pub const KELLY_FLOOR_DEFAULT: f64 = 1.0;

/// Strategy variant selected at startup
pub const STRATEGY_VARIANT_DEFAULT: &str = "optimal";

/// Look up the default row for one market
pub fn market_default(market: Market) -> MarketDefault {
    MARKET_DEFAULTS
        .iter()
        .copied()
        .find(|row| row.market == market)
        .unwrap_or(MarketDefault {
            market,
            edge_floor: 0.0,
            probability_floor: 0.0,
            enabled: false,
        })
}

/// The canonical baseline configuration
pub fn defaults() -> ThresholdConfig {
    let markets: BTreeMap<Market, MarketThreshold> = MARKET_DEFAULTS
        .iter()
        .map(|row| {
            (
                row.market,
                MarketThreshold {
                    edge_floor: row.edge_floor,
                    probability_floor: row.probability_floor,
                    enabled: row.enabled,
                },
            )
        })
        .collect();

    ThresholdConfig {
        markets,
        kelly_floor: KELLY_FLOOR_DEFAULT,
        strategy_variant: STRATEGY_VARIANT_DEFAULT.to_string(),
    }
}
