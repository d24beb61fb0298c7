//! Graphite-style derived series functions
//!
//! Every function implements [`Expression`]: it receives the evaluation
//! window, the already-fetched input series grouped by sub-query, and its own
//! parameter strings, and returns the derived series.
//!
//! | Function | Result |
//! |---|---|
//! | `movingAverage(w)` | trailing average of all inputs merged together |
//! | `highestMax(k)` | the k series with the greatest in-window sample |
//! | `highestCurrent(k)` | the k series with the greatest latest sample |
//! | `sumSeries` / `multiplySeries` | one series, all inputs merged |
//! | `differenceSeries` / `divideSeries` | one series, `x - y` / `x / y` |
//! | `abs` / `scale(f)` | every series of the first group, transformed |
//!
//! # Example
//!
//! ```rust
//! use kuba_expr::functions::FunctionRegistry;
//! use kuba_expr::types::{Series, Window};
//!
//! let registry = FunctionRegistry::new();
//! let window = Window::new(0, 100_000).unwrap();
//! let input = vec![vec![
//!     Series::new("a").with_point(10, 2),
//!     Series::new("b").with_point(10, 3),
//! ]];
//!
//! let out = registry.evaluate("sumSeries", &window, input, &[]).unwrap();
//! assert_eq!(out[0].dps[&10], 5.into());
//! assert_eq!(registry.render("sumSeries", &[], "a,b").unwrap(), "sumSeries(a,b)");
//! ```

pub mod combine;
pub mod highest;
pub mod moving_average;
pub mod transform;
pub mod window;

pub use combine::{DifferenceSeries, DivideSeries, MultiplySeries, SumSeries};
pub use highest::{HighestCurrent, HighestMax, RankCriterion};
pub use moving_average::MovingAverageFunction;
pub use transform::{AbsoluteValue, Scale};
pub use window::WindowSpec;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::types::{total_series, GroupedInput, Series, Window};

/// A derived-series function
///
/// Functions perform no I/O. Input series are owned by the call: functions
/// that transform samples in place return the same series they were given,
/// everything else allocates new output.
pub trait Expression: Send + Sync {
    /// Canonical function name, as used in rendered expressions
    fn name(&self) -> &'static str;

    /// Compute the derived series
    fn evaluate(&self, window: &Window, input: GroupedInput, params: &[String])
        -> Result<Vec<Series>>;

    /// Render the canonical call form, e.g. `sumSeries(<inner>)`
    fn render(&self, _params: &[String], inner: &str) -> String {
        format!("{}({})", self.name(), inner)
    }
}

/// Fail when no groups were supplied at all
pub(crate) fn require_input(input: &GroupedInput) -> Result<()> {
    if input.is_empty() {
        return Err(Error::invalid_argument("query results cannot be empty"));
    }
    Ok(())
}

/// First series of the first group, if there is one
pub(crate) fn first_series(input: &GroupedInput) -> Option<&Series> {
    input.first().and_then(|group| group.first())
}

/// Placeholder returned when a merge has no first series to copy metadata
/// from, so enclosing expressions can still compose.
pub(crate) fn placeholder() -> Vec<Series> {
    vec![Series::default()]
}

// ============================================================================
// Registry
// ============================================================================

/// Name -> function lookup and dispatch
pub struct FunctionRegistry {
    functions: HashMap<&'static str, Arc<dyn Expression>>,
    config: Arc<EngineConfig>,
}

impl FunctionRegistry {
    /// Registry with every built-in function and default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Registry with every built-in function sharing `config`
    pub fn with_config(config: EngineConfig) -> Self {
        let config = Arc::new(config);
        let mut registry = Self {
            functions: HashMap::new(),
            config: config.clone(),
        };

        registry.register(Arc::new(MovingAverageFunction::new(config.clone())), &[]);
        registry.register(Arc::new(HighestMax::new(config.clone())), &[]);
        registry.register(Arc::new(HighestCurrent::new(config.clone())), &[]);
        registry.register(Arc::new(SumSeries::new(config.clone())), &["sum"]);
        registry.register(Arc::new(MultiplySeries::new(config.clone())), &["multiply"]);
        registry.register(
            Arc::new(DifferenceSeries::new(config.clone())),
            &["difference"],
        );
        registry.register(Arc::new(DivideSeries::new(config)), &["divide"]);
        registry.register(Arc::new(AbsoluteValue), &["absolute"]);
        registry.register(Arc::new(Scale), &[]);

        registry
    }

    /// Register a function under its own name and any aliases
    pub fn register(&mut self, function: Arc<dyn Expression>, aliases: &[&'static str]) {
        for alias in aliases {
            self.functions.insert(*alias, function.clone());
        }
        self.functions.insert(function.name(), function);
    }

    /// Look up a function by name or alias
    pub fn get(&self, name: &str) -> Option<&dyn Expression> {
        self.functions.get(name).map(|f| f.as_ref())
    }

    /// Registered names and aliases, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Shared configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate the function registered as `name`
    pub fn evaluate(
        &self,
        name: &str,
        window: &Window,
        input: GroupedInput,
        params: &[String],
    ) -> Result<Vec<Series>> {
        let function = self
            .get(name)
            .ok_or_else(|| Error::invalid_argument(format!("unknown function '{}'", name)))?;

        let series = total_series(&input);
        debug!(
            function = function.name(),
            groups = input.len(),
            series,
            params = ?params,
            "evaluating expression"
        );
        self.config.check_input_size(series)?;

        function.evaluate(window, input, params)
    }

    /// Render the canonical call form of `name`
    pub fn render(&self, name: &str, params: &[String], inner: &str) -> Result<String> {
        let function = self
            .get(name)
            .ok_or_else(|| Error::invalid_argument(format!("unknown function '{}'", name)))?;
        Ok(function.render(params, inner))
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
