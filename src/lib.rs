//! Kuba Expr - Graphite-style derived series functions
//!
//! This library evaluates derived time-series functions over raw series
//! that a federation layer has already fetched from its backends:
//! - Moving averages over sample-count or wall-clock windows
//! - Top-K selection by in-window maximum or latest value
//! - Series arithmetic (sum, multiply, difference, divide) via merge
//! - Elementwise transforms (abs, scale)
//!
//! Evaluation is synchronous and in-memory. Nothing here performs I/O apart
//! from optional configuration file loading.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

/// Configuration management with TOML support
pub mod config;

/// Counter rollover options consumed by rate calculations
pub mod rate;

/// Sample views, interpolation, aggregators and the series merger
pub mod aggregation;

/// Derived series functions and the function registry
pub mod functions;

// Re-export main types
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use functions::{Expression, FunctionRegistry};
pub use rate::RateOptions;
pub use types::{DataPoint, GroupedInput, Sample, Series, Window};
