//! Core types used throughout BetLab
//!
//! Defines the closed set of betting markets and the key aliases shared by
//! the store, the threshold surface and the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// League / competition identifier as it appears in the dataset (e.g. "ligue_1")
pub type LeagueKey = String;

/// Strategy variant identifier (e.g. "optimal", "ml_stack")
pub type VariantKey = String;

/// Supported betting markets
///
/// The set is closed: thresholds exist for exactly these markets and any other
/// key found in a dataset is ignored by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    Home,
    Draw,
    Away,
    #[serde(rename = "over_2_5")]
    Over25,
    #[serde(rename = "under_2_5")]
    Under25,
    AhHome,
    AhAway,
}

impl Market {
    /// Every market, in display order
    pub const ALL: [Market; 7] = [
        Market::Home,
        Market::Draw,
        Market::Away,
        Market::Over25,
        Market::Under25,
        Market::AhHome,
        Market::AhAway,
    ];

    /// Canonical key used in datasets, presets and reports
    pub fn key(&self) -> &'static str {
        match self {
            Market::Home => "home",
            Market::Draw => "draw",
            Market::Away => "away",
            Market::Over25 => "over_2_5",
            Market::Under25 => "under_2_5",
            Market::AhHome => "ah_home",
            Market::AhAway => "ah_away",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Market::Home => "Home win",
            Market::Draw => "Draw",
            Market::Away => "Away win",
            Market::Over25 => "Over 2.5",
            Market::Under25 => "Under 2.5",
            Market::AhHome => "AH home",
            Market::AhAway => "AH away",
        }
    }

    /// Parse from a dataset or command-line key (case-insensitive, with aliases)
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(&['-', ' ', '.'][..], "_");
        match normalized.as_str() {
            "home" | "1" | "home_win" => Some(Market::Home),
            "draw" | "x" => Some(Market::Draw),
            "away" | "2" | "away_win" => Some(Market::Away),
            "over_2_5" | "over25" | "o25" => Some(Market::Over25),
            "under_2_5" | "under25" | "u25" => Some(Market::Under25),
            "ah_home" | "ahh" | "ah_h" | "asian_handicap_home" => Some(Market::AhHome),
            "ah_away" | "aha" | "ah_a" | "asian_handicap_away" => Some(Market::AhAway),
            _ => None,
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
