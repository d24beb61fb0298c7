//! Integration tests for expression evaluation through the function registry
//!
//! These tests drive the public contract end to end:
//! - JSON series in, derived series out
//! - Nested expressions composed from the outputs of inner calls
//! - Canonical text rendering of expression trees
//! - Configuration loaded from disk changing merge behaviour

use std::io::Write;

use kuba_expr::aggregation::Interpolation;
use kuba_expr::functions::FunctionRegistry;
use kuba_expr::types::{GroupedInput, Sample, Series, Window};
use kuba_expr::{EngineConfig, Error, RateOptions};
use serde_json::json;

// ============================================================================
// Helper Functions
// ============================================================================

/// One hour window starting at epoch second 1_000
fn hour_window() -> Window {
    Window::new(1_000_000, 4_600_000).expect("valid window")
}

/// A series sampled every 60 seconds from epoch second 1_000
fn minutely(metric: &str, host: &str, values: &[i64]) -> Series {
    values
        .iter()
        .enumerate()
        .fold(Series::new(metric).with_tag("host", host), |s, (i, v)| {
            s.with_point(1_000 + i as i64 * 60, *v)
        })
}

fn params(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn hosts(out: &[Series]) -> Vec<&str> {
    out.iter()
        .map(|s| s.tags.get("host").map(String::as_str).unwrap_or(""))
        .collect()
}

// ============================================================================
// Top-K Tests
// ============================================================================

#[test]
fn test_highest_max_end_to_end() {
    let registry = FunctionRegistry::new();
    let window = Window::new(0, 10_000).unwrap();
    let input = vec![vec![
        Series::new("a").with_point(0, 10).with_point(1, 20),
        Series::new("b").with_point(0, 5).with_point(1, 30),
    ]];

    let out = registry
        .evaluate("highestMax", &window, input, &params(&["1"]))
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].metric, "b");
}

#[test]
fn test_highest_across_groups() {
    let registry = FunctionRegistry::new();
    let input: GroupedInput = vec![
        vec![
            minutely("cpu", "web01", &[10, 80, 20]),
            minutely("cpu", "web02", &[40, 40, 40]),
        ],
        vec![
            minutely("cpu", "db01", &[90, 10, 5]),
            minutely("cpu", "db02", &[1, 2, 60]),
        ],
    ];

    let out = registry
        .evaluate("highestMax", &hour_window(), input.clone(), &params(&["2"]))
        .unwrap();
    assert_eq!(hosts(&out), vec!["db01", "web01"]);

    let out = registry
        .evaluate("highestCurrent", &hour_window(), input.clone(), &params(&["3"]))
        .unwrap();
    assert_eq!(hosts(&out), vec!["db02", "web02", "web01"]);

    let out = registry
        .evaluate("highestCurrent", &hour_window(), input, &params(&["4"]))
        .unwrap();
    assert_eq!(hosts(&out), vec!["web01", "web02", "db01", "db02"]);
}

#[test]
fn test_highest_respects_window() {
    let registry = FunctionRegistry::new();
    // The 1000 spike at second 5_000 lies outside the window
    let spiky = minutely("cpu", "spiky", &[1, 2, 3]).with_point(5_000, 1_000);
    let steady = minutely("cpu", "steady", &[50, 50, 50]);

    let out = registry
        .evaluate(
            "highestMax",
            &hour_window(),
            vec![vec![spiky, steady]],
            &params(&["1"]),
        )
        .unwrap();
    assert_eq!(hosts(&out), vec!["steady"]);
}

// ============================================================================
// Combination Tests
// ============================================================================

#[test]
fn test_sum_of_json_results() {
    let raw = json!([
        {"metric": "requests", "tags": {"dc": "east"}, "dps": {"1000": 2, "1060": 2, "1120": 2}},
        {"metric": "requests", "tags": {"dc": "west"}, "dps": {"1000": 3, "1060": 3, "1120": 3}}
    ]);
    let group: Vec<Series> = raw
        .as_array()
        .unwrap()
        .iter()
        .map(|v| Series::from_json(v).unwrap())
        .collect();

    let registry = FunctionRegistry::new();
    let out = registry
        .evaluate("sum", &hour_window(), vec![group], &[])
        .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].tags.get("dc").map(String::as_str), Some("east"));
    assert_eq!(out[0].len(), 3);
    assert!(out[0].dps.values().all(|v| *v == Sample::Int(5)));
}

#[test]
fn test_non_numeric_json_sample_is_type_mismatch() {
    let raw = json!({"metric": "requests", "dps": {"1000": true}});
    assert!(matches!(
        Series::from_json(&raw),
        Err(Error::TypeMismatch(_))
    ));
}

#[test]
fn test_difference_with_unaligned_series() {
    let registry = FunctionRegistry::new();
    let x = Series::new("x").with_point(1_000, 100).with_point(1_120, 160);
    let y = Series::new("y").with_point(1_060, 30);

    let out = registry
        .evaluate(
            "differenceSeries",
            &hour_window(),
            vec![vec![x], vec![y]],
            &[],
        )
        .unwrap();

    // x interpolates to 130 at 1_060
    assert_eq!(out[0].dps[&1_000], Sample::Int(100));
    assert_eq!(out[0].dps[&1_060], Sample::Int(100));
    assert_eq!(out[0].dps[&1_120], Sample::Int(160));
}

#[test]
fn test_pair_functions_reject_three_series() {
    let registry = FunctionRegistry::new();
    let input = vec![vec![
        minutely("m", "a", &[1]),
        minutely("m", "b", &[1]),
        minutely("m", "c", &[1]),
    ]];
    for name in ["differenceSeries", "divideSeries"] {
        let err = registry
            .evaluate(name, &hour_window(), input.clone(), &[])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}

// ============================================================================
// Composition Tests
// ============================================================================

#[test]
fn test_nested_expression() {
    // sumSeries(scale(abs(a), 2), b)
    let registry = FunctionRegistry::new();
    let window = hour_window();

    let a = minutely("m", "a", &[-1, -2, -3]);
    let b = minutely("m", "b", &[10, 10, 10]);

    let abs = registry.evaluate("abs", &window, vec![vec![a]], &[]).unwrap();
    let scaled = registry
        .evaluate("scale", &window, vec![abs], &params(&["'2'"]))
        .unwrap();
    let summed = registry
        .evaluate("sumSeries", &window, vec![scaled, vec![b]], &[])
        .unwrap();

    let values: Vec<Sample> = summed[0].dps.values().copied().collect();
    assert_eq!(
        values,
        vec![Sample::Int(12), Sample::Int(14), Sample::Int(16)]
    );

    let abs_text = registry.render("abs", &[], "a").unwrap();
    let scale_text = registry.render("scale", &params(&["2"]), &abs_text).unwrap();
    let text = registry.render("sumSeries", &[], &scale_text).unwrap();
    assert_eq!(text, "sumSeries(scale(abs(a)))");
}

#[test]
fn test_placeholder_keeps_tree_composable() {
    let registry = FunctionRegistry::new();
    let window = hour_window();

    let inner = registry
        .evaluate("sumSeries", &window, vec![vec![]], &[])
        .unwrap();
    assert_eq!(inner, vec![Series::default()]);

    let outer = registry
        .evaluate("movingAverage", &window, vec![inner], &params(&["2"]))
        .unwrap();
    assert_eq!(outer.len(), 1);
    assert!(outer[0].is_empty());
}

#[test]
fn test_moving_average_over_sum() {
    let registry = FunctionRegistry::new();
    let input = vec![vec![
        minutely("m", "a", &[1, 2, 3, 4]),
        minutely("m", "b", &[1, 2, 3, 4]),
    ]];

    let out = registry
        .evaluate("movingAverage", &hour_window(), input, &params(&["'2min'"]))
        .unwrap();
    let values: Vec<Sample> = out[0].dps.values().copied().collect();
    // merged sums 2, 4, 6, 8 every minute; a 2min window holds 3 of them
    assert_eq!(
        values,
        vec![Sample::Int(0), Sample::Int(0), Sample::Int(4), Sample::Int(6)]
    );
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_config_file_drives_merge() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "skip_missing = true").unwrap();
    let config = EngineConfig::from_file_with_env(file.path()).unwrap();
    assert_eq!(config.interpolation, Interpolation::Lerp);

    let x = Series::new("x").with_point(1_000, 100).with_point(1_120, 160);
    let y = Series::new("y").with_point(1_060, 30);
    let input = vec![vec![x, y]];

    let lerp = FunctionRegistry::new()
        .evaluate("sumSeries", &hour_window(), input.clone(), &[])
        .unwrap();
    assert_eq!(lerp[0].dps[&1_060], Sample::Int(160));

    let skipping = FunctionRegistry::with_config(config)
        .evaluate("sumSeries", &hour_window(), input, &[])
        .unwrap();
    assert_eq!(skipping[0].dps[&1_060], Sample::Int(30));
}

#[test]
fn test_rate_options_text_form() {
    let opts = RateOptions::default();
    assert_eq!(opts.to_string(), format!("{{false,{},0}}", i64::MAX));

    let parsed: RateOptions = "{true,4294967295,1000}".parse().unwrap();
    assert!(parsed.is_counter());
    assert_eq!(parsed.counter_max(), 4_294_967_295);
    assert_eq!(parsed.reset_value(), 1_000);
}
