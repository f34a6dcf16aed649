//! BetLab Library
//!
//! Threshold-driven backtest aggregation: filter a fixed set of simulated
//! bets through per-market edge/probability floors and a global Kelly floor,
//! then roll the survivors up globally, per market and per league.
//!
//! ```no_run
//! use betlab::engine::aggregate;
//! use betlab::metrics::project;
//! use betlab::store::RecordStore;
//! use betlab::thresholds::defaults;
//!
//! let store = RecordStore::from_path("data/sample_backtest.json")?;
//! let result = aggregate(&store, &defaults());
//! let global = project(&result.global);
//! println!("ROI: {:?}", global.roi_percent);
//! # Ok::<(), betlab::error::Error>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod report;
pub mod store;
pub mod thresholds;
pub mod types;

pub use engine::{aggregate, AggregationResult, RollupStats};
pub use metrics::{project, ProjectedMetrics};
pub use store::RecordStore;
pub use thresholds::{defaults, ThresholdConfig};
pub use types::Market;
