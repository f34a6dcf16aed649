//! Error types for BetLab
//!
//! Only two things can go wrong inside the library: a malformed dataset at
//! load time, or an out-of-range threshold edit. Aggregation itself is
//! infallible once both inputs exist.

use thiserror::Error;

/// Malformed input handed to the record store loader.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataFormatError {
    #[error("group {group}: missing league tag")]
    MissingLeague { group: usize },

    #[error("group {group}: missing strategy variant")]
    MissingVariant { group: usize },

    #[error("group {group}: missing bets array")]
    MissingBets { group: usize },

    #[error("group {group}, record {record}: missing field `{field}`")]
    MissingField {
        group: usize,
        record: usize,
        field: &'static str,
    },

    #[error("group {group}, record {record}: win flag must be 0 or 1, got {value}")]
    InvalidWinFlag {
        group: usize,
        record: usize,
        value: String,
    },

    #[error("group {group}, record {record}: `{field}` out of range: {value}")]
    OutOfRange {
        group: usize,
        record: usize,
        field: &'static str,
        value: f64,
    },

    #[error("dataset is not an array of groups: {0}")]
    Malformed(String),
}

/// Rejected edit to the threshold configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("unknown market: {0}")]
    UnknownMarket(String),

    #[error("unknown threshold field: {0}")]
    UnknownField(String),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    DataFormat(#[from] DataFormatError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
