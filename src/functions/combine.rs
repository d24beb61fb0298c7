//! Series arithmetic: sum, multiply, difference, divide
//!
//! All four merge their inputs into a single output series whose metadata is
//! copied from the first input series. Subtraction and division are not
//! separate combine rules: `x - y` merges `x` with a negated view of `y`
//! under SUM, and `x / y` merges `x` with a reciprocal view of `y` under
//! MULTIPLY.
//!
//! Division by a zero sample follows IEEE rules: the reciprocal of zero is
//! `+inf`, so `x / 0` is `±inf` and `0 / 0` is `NaN`.

use std::sync::Arc;

use tracing::debug;

use crate::aggregation::{
    identity_views, Aggregator, Merger, Multiply, SampleView, Sum, ViewTransform,
};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::functions::{first_series, placeholder, require_input, Expression};
use crate::types::{flatten, GroupedInput, Series, Window};

/// Merge views into a new series carrying `meta`'s metadata
fn merge_into<A: Aggregator>(
    config: &EngineConfig,
    meta: &Series,
    views: Vec<SampleView<'_>>,
    aggregator: A,
) -> Series {
    let mut output = meta.copy_meta();
    debug!(
        aggregator = aggregator.name(),
        inputs = views.len(),
        metric = %meta.metric,
        "merging series"
    );
    Merger::new(views, aggregator, config.interpolation, config.skip_missing)
        .collect_into(&mut output);
    output
}

/// Merge every input series with one combine rule
fn merge_all<A: Aggregator>(
    config: &EngineConfig,
    window: &Window,
    input: &GroupedInput,
    aggregator: A,
) -> Result<Vec<Series>> {
    require_input(input)?;

    let views = identity_views(&flatten(input), window)?;
    match first_series(input) {
        Some(meta) => Ok(vec![merge_into(config, meta, views, aggregator)]),
        None => Ok(placeholder()),
    }
}

/// Pick `(x, y)` out of exactly two series
///
/// Accepts two groups of one series each, or one group of two series.
fn operand_pair(input: &GroupedInput) -> Result<(&Series, &Series)> {
    require_input(input)?;

    match input.as_slice() {
        [a, b] if a.len() == 1 && b.len() == 1 => Ok((&a[0], &b[0])),
        [group] if group.len() == 2 => Ok((&group[0], &group[1])),
        _ => Err(Error::invalid_argument(format!(
            "expected two query results, got {} groups with {} series",
            input.len(),
            input.iter().map(Vec::len).sum::<usize>()
        ))),
    }
}

/// Merge `x` with a transformed view of `y`
fn merge_pair<A: Aggregator>(
    config: &EngineConfig,
    window: &Window,
    input: &GroupedInput,
    y_transform: ViewTransform,
    aggregator: A,
) -> Result<Vec<Series>> {
    let (x, y) = operand_pair(input)?;

    let views = vec![
        SampleView::identity(x, window)?,
        SampleView::new(y, window, y_transform)?,
    ];
    Ok(vec![merge_into(config, x, views, aggregator)])
}

// ============================================================================
// Functions
// ============================================================================

/// `sumSeries`: adds every input series together
pub struct SumSeries {
    config: Arc<EngineConfig>,
}

impl SumSeries {
    /// Create the function with shared configuration
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }
}

impl Expression for SumSeries {
    fn name(&self) -> &'static str {
        "sumSeries"
    }

    fn evaluate(
        &self,
        window: &Window,
        input: GroupedInput,
        _params: &[String],
    ) -> Result<Vec<Series>> {
        merge_all(&self.config, window, &input, Sum)
    }
}

/// `multiplySeries`: multiplies every input series together
pub struct MultiplySeries {
    config: Arc<EngineConfig>,
}

impl MultiplySeries {
    /// Create the function with shared configuration
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }
}

impl Expression for MultiplySeries {
    fn name(&self) -> &'static str {
        "multiplySeries"
    }

    fn evaluate(
        &self,
        window: &Window,
        input: GroupedInput,
        _params: &[String],
    ) -> Result<Vec<Series>> {
        merge_all(&self.config, window, &input, Multiply)
    }
}

/// `differenceSeries`: `x + (-y)`
pub struct DifferenceSeries {
    config: Arc<EngineConfig>,
}

impl DifferenceSeries {
    /// Create the function with shared configuration
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }
}

impl Expression for DifferenceSeries {
    fn name(&self) -> &'static str {
        "differenceSeries"
    }

    fn evaluate(
        &self,
        window: &Window,
        input: GroupedInput,
        _params: &[String],
    ) -> Result<Vec<Series>> {
        merge_pair(&self.config, window, &input, ViewTransform::Negate, Sum)
    }
}

/// `divideSeries`: `x * (1/y)`
pub struct DivideSeries {
    config: Arc<EngineConfig>,
}

impl DivideSeries {
    /// Create the function with shared configuration
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }
}

impl Expression for DivideSeries {
    fn name(&self) -> &'static str {
        "divideSeries"
    }

    fn evaluate(
        &self,
        window: &Window,
        input: GroupedInput,
        _params: &[String],
    ) -> Result<Vec<Series>> {
        merge_pair(&self.config, window, &input, ViewTransform::Reciprocal, Multiply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;

    fn config() -> Arc<EngineConfig> {
        Arc::new(EngineConfig::default())
    }

    fn window() -> Window {
        Window::new(0, 1_000_000).unwrap()
    }

    fn constant(metric: &str, value: i64) -> Series {
        (0..5).fold(Series::new(metric).with_tag("host", metric), |s, i| {
            s.with_point(100 + i * 10, value)
        })
    }

    #[test]
    fn test_sum_constants() {
        let input = vec![vec![constant("a", 2)], vec![constant("b", 3)]];
        let out = SumSeries::new(config())
            .evaluate(&window(), input, &[])
            .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].metric, "a");
        assert_eq!(out[0].tags.get("host").map(String::as_str), Some("a"));
        assert_eq!(out[0].len(), 5);
        assert!(out[0].dps.values().all(|v| *v == Sample::Int(5)));
    }

    #[test]
    fn test_multiply() {
        let input = vec![vec![constant("a", 2), constant("b", 3), constant("c", 4)]];
        let out = MultiplySeries::new(config())
            .evaluate(&window(), input, &[])
            .unwrap();
        assert!(out[0].dps.values().all(|v| *v == Sample::Int(24)));
    }

    #[test]
    fn test_sum_empty_input_is_error() {
        let result = SumSeries::new(config()).evaluate(&window(), vec![], &[]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_sum_missing_first_series_returns_placeholder() {
        let input = vec![vec![], vec![constant("b", 3)]];
        let out = SumSeries::new(config())
            .evaluate(&window(), input, &[])
            .unwrap();
        assert_eq!(out, vec![Series::default()]);
    }

    #[test]
    fn test_difference_shapes() {
        let f = DifferenceSeries::new(config());

        let two_groups = vec![vec![constant("x", 10)], vec![constant("y", 4)]];
        let out = f.evaluate(&window(), two_groups, &[]).unwrap();
        assert!(out[0].dps.values().all(|v| *v == Sample::Int(6)));

        let one_group = vec![vec![constant("x", 10), constant("y", 4)]];
        let out = f.evaluate(&window(), one_group, &[]).unwrap();
        assert_eq!(out[0].metric, "x");
        assert!(out[0].dps.values().all(|v| *v == Sample::Int(6)));
    }

    #[test]
    fn test_pair_shape_errors() {
        let f = DivideSeries::new(config());
        let bad_shapes = vec![
            vec![vec![constant("x", 1)]],
            vec![vec![constant("x", 1), constant("y", 1), constant("z", 1)]],
            vec![vec![constant("x", 1), constant("y", 1)], vec![constant("z", 1)]],
            vec![vec![], vec![constant("y", 1)]],
        ];
        for input in bad_shapes {
            let err = f.evaluate(&window(), input, &[]).unwrap_err();
            assert!(err.to_string().contains("expected two query results"));
        }
    }

    #[test]
    fn test_divide() {
        let input = vec![vec![constant("x", 10)], vec![constant("y", 4)]];
        let out = DivideSeries::new(config())
            .evaluate(&window(), input, &[])
            .unwrap();
        assert!(out[0].dps.values().all(|v| *v == Sample::Float(2.5)));
    }

    #[test]
    fn test_divide_by_zero_is_infinite() {
        let x = Series::new("x").with_point(10, 3).with_point(20, 0);
        let y = Series::new("y").with_point(10, 0).with_point(20, 0);
        let out = DivideSeries::new(config())
            .evaluate(&window(), vec![vec![x, y]], &[])
            .unwrap();
        assert_eq!(out[0].dps[&10], Sample::Float(f64::INFINITY));
        assert!(out[0].dps[&20].as_f64().is_nan());
    }

    #[test]
    fn test_window_bounds_merge() {
        let a = Series::new("a").with_point(5, 1).with_point(15, 1).with_point(25, 1);
        let b = Series::new("b").with_point(5, 1).with_point(15, 1).with_point(25, 1);
        let window = Window::new(10_000, 25_000).unwrap();
        let out = SumSeries::new(config())
            .evaluate(&window, vec![vec![a, b]], &[])
            .unwrap();
        assert_eq!(out[0].dps.keys().copied().collect::<Vec<_>>(), vec![15]);
    }
}
