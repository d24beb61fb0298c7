//! Core data types shared by every expression function
//!
//! # Key Types
//!
//! - **`Sample`**: a single numeric value, either an exact integer or a float
//! - **`DataPoint`**: a timestamp (epoch seconds) paired with a `Sample`
//! - **`Series`**: metric name, tags and an ordered timestamp -> sample map
//! - **`Window`**: millisecond evaluation bounds `[start, end)`
//! - **`GroupedInput`**: series grouped by the sub-query that produced them
//!
//! # Example
//!
//! ```rust
//! use kuba_expr::types::{Sample, Series, Window};
//!
//! let mut series = Series::new("cpu.user");
//! series.insert(1_000, Sample::Int(10));
//! series.insert(1_060, Sample::Float(12.5));
//!
//! let window = Window::new(1_000_000, 2_000_000).unwrap();
//! assert_eq!(window.start_secs(), 1_000);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Series grouped by originating sub-query
///
/// Flattening order (group-major, then series within group) is significant:
/// positional lookups and top-K tie-breaks depend on it.
pub type GroupedInput = Vec<Vec<Series>>;

/// A numeric sample, tracked per value as integer or float
///
/// Values are never silently coerced: integer inputs stay integers unless an
/// operation is defined to produce a float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sample {
    /// Exact 64-bit integer value
    Int(i64),
    /// Floating point value
    Float(f64),
}

impl Sample {
    /// Convert a raw JSON value into a sample
    ///
    /// Fails with [`Error::TypeMismatch`] when the value is not a number.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Sample::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Sample::Float(f))
                } else {
                    Err(Error::type_mismatch(format!(
                        "number {} does not fit an integer or float sample",
                        n
                    )))
                }
            }
            other => Err(Error::type_mismatch(format!(
                "expected integer or float sample, found {}",
                json_kind(other)
            ))),
        }
    }

    /// Returns true if the sample holds an integer
    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self, Sample::Int(_))
    }

    /// Widen the sample to `f64`
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Sample::Int(v) => v as f64,
            Sample::Float(v) => v,
        }
    }

    /// Zero of the same kind as `self`
    #[inline]
    pub fn zero_like(&self) -> Sample {
        match self {
            Sample::Int(_) => Sample::Int(0),
            Sample::Float(_) => Sample::Float(0.0),
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sample::Int(v) => write!(f, "{}", v),
            Sample::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Sample {
    fn from(v: i64) -> Self {
        Sample::Int(v)
    }
}

impl From<i32> for Sample {
    fn from(v: i32) -> Self {
        Sample::Int(v as i64)
    }
}

impl From<f64> for Sample {
    fn from(v: f64) -> Self {
        Sample::Float(v)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// A single sample with its timestamp
///
/// Timestamps are epoch seconds, the granularity at which series are merged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Epoch seconds
    pub timestamp: i64,
    /// Sample value
    pub value: Sample,
}

impl DataPoint {
    /// Create a new data point
    pub fn new(timestamp: i64, value: impl Into<Sample>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }
}

/// A named, tagged, time-ordered series of samples
///
/// `dps` is a `BTreeMap`, so iteration is always in strictly increasing
/// timestamp order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Metric name
    #[serde(default)]
    pub metric: String,

    /// Tag key/value pairs identifying the series
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Tag keys that were aggregated away by the backend
    #[serde(default, rename = "aggregateTags")]
    pub aggregated_tags: Vec<String>,

    /// Samples keyed by epoch seconds
    #[serde(default)]
    pub dps: BTreeMap<i64, Sample>,
}

impl Series {
    /// Create an empty series for `metric`
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            ..Default::default()
        }
    }

    /// Builder-style tag setter
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Builder-style sample setter
    pub fn with_point(mut self, timestamp: i64, value: impl Into<Sample>) -> Self {
        self.dps.insert(timestamp, value.into());
        self
    }

    /// Insert or replace a sample
    pub fn insert(&mut self, timestamp: i64, value: Sample) {
        self.dps.insert(timestamp, value);
    }

    /// Append a merged data point
    pub fn add_point(&mut self, point: DataPoint) {
        self.dps.insert(point.timestamp, point.value);
    }

    /// Copy metric, tags and aggregated tags into a new series with no samples
    pub fn copy_meta(&self) -> Series {
        Series {
            metric: self.metric.clone(),
            tags: self.tags.clone(),
            aggregated_tags: self.aggregated_tags.clone(),
            dps: BTreeMap::new(),
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.dps.len()
    }

    /// Returns true if the series holds no samples
    pub fn is_empty(&self) -> bool {
        self.dps.is_empty()
    }

    /// Iterate samples in timestamp order
    pub fn points(&self) -> impl Iterator<Item = DataPoint> + '_ {
        self.dps.iter().map(|(&ts, &v)| DataPoint::new(ts, v))
    }

    /// Build a series from an OpenTSDB-style JSON result object
    ///
    /// `dps` keys are epoch-second strings. Sample values must be numbers;
    /// anything else fails with [`Error::TypeMismatch`].
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::invalid_argument("series must be a JSON object"))?;

        let metric = obj
            .get("metric")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string();

        let mut tags = BTreeMap::new();
        if let Some(raw) = obj.get("tags").and_then(|t| t.as_object()) {
            for (k, v) in raw {
                let v = v.as_str().ok_or_else(|| {
                    Error::invalid_argument(format!("tag '{}' must be a string", k))
                })?;
                tags.insert(k.clone(), v.to_string());
            }
        }

        let aggregated_tags = obj
            .get("aggregateTags")
            .and_then(|t| t.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let mut dps = BTreeMap::new();
        if let Some(raw) = obj.get("dps").and_then(|d| d.as_object()) {
            for (ts, v) in raw {
                let ts: i64 = ts.trim().parse().map_err(|_| {
                    Error::invalid_argument(format!("invalid timestamp '{}'", ts))
                })?;
                dps.insert(ts, Sample::from_json(v)?);
            }
        }

        Ok(Series {
            metric,
            tags,
            aggregated_tags,
            dps,
        })
    }
}

/// Evaluation window in epoch milliseconds, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Start timestamp in milliseconds (inclusive)
    pub start_ms: i64,
    /// End timestamp in milliseconds (exclusive)
    pub end_ms: i64,
}

impl Window {
    /// Create a new window, rejecting `start > end`
    ///
    /// ```rust
    /// use kuba_expr::types::Window;
    ///
    /// assert!(Window::new(1000, 2000).is_ok());
    /// assert!(Window::new(2000, 1000).is_err());
    /// ```
    pub fn new(start_ms: i64, end_ms: i64) -> Result<Self> {
        if start_ms > end_ms {
            return Err(Error::invalid_argument(format!(
                "Invalid window: start {} > end {}",
                start_ms, end_ms
            )));
        }
        Ok(Self { start_ms, end_ms })
    }

    /// Start bound in epoch seconds
    #[inline]
    pub fn start_secs(&self) -> i64 {
        self.start_ms / 1000
    }

    /// End bound in epoch seconds
    #[inline]
    pub fn end_secs(&self) -> i64 {
        self.end_ms / 1000
    }

    /// Check if an epoch-second timestamp falls inside the window
    #[inline]
    pub fn contains_secs(&self, timestamp: i64) -> bool {
        timestamp >= self.start_secs() && timestamp < self.end_secs()
    }
}

/// Flatten grouped input in group-major order
pub fn flatten(input: &[Vec<Series>]) -> Vec<&Series> {
    input.iter().flat_map(|group| group.iter()).collect()
}

/// Count series across all groups
pub fn total_series(input: &[Vec<Series>]) -> usize {
    input.iter().map(Vec::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_window_validation() {
        let window = Window::new(1_500, 10_999).unwrap();
        assert_eq!(window.start_secs(), 1);
        assert_eq!(window.end_secs(), 10);
        assert!(window.contains_secs(1));
        assert!(window.contains_secs(9));
        assert!(!window.contains_secs(10));

        assert!(matches!(
            Window::new(10, 5),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_copy_meta_drops_samples() {
        let series = Series::new("sys.cpu")
            .with_tag("host", "web01")
            .with_point(10, 1)
            .with_point(20, 2.5);
        let meta = series.copy_meta();

        assert_eq!(meta.metric, "sys.cpu");
        assert_eq!(meta.tags.get("host").map(String::as_str), Some("web01"));
        assert!(meta.is_empty());
    }

    #[test]
    fn test_points_are_ordered() {
        let series = Series::new("m")
            .with_point(30, 3)
            .with_point(10, 1)
            .with_point(20, 2);
        let ts: Vec<i64> = series.points().map(|p| p.timestamp).collect();
        assert_eq!(ts, vec![10, 20, 30]);
    }

    #[test]
    fn test_series_from_json() {
        let raw = json!({
            "metric": "sys.cpu.user",
            "tags": {"host": "web01"},
            "aggregateTags": ["cpu"],
            "dps": {"1000": 10, "1060": 12.5}
        });
        let series = Series::from_json(&raw).unwrap();

        assert_eq!(series.metric, "sys.cpu.user");
        assert_eq!(series.aggregated_tags, vec!["cpu".to_string()]);
        assert_eq!(series.dps[&1000], Sample::Int(10));
        assert_eq!(series.dps[&1060], Sample::Float(12.5));
    }

    #[test]
    fn test_series_from_json_rejects_non_numeric() {
        let raw = json!({"metric": "m", "dps": {"1000": "ten"}});
        assert!(matches!(
            Series::from_json(&raw),
            Err(Error::TypeMismatch(_))
        ));

        let raw = json!({"metric": "m", "dps": {"abc": 1}});
        assert!(matches!(
            Series::from_json(&raw),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_sample_serde_untagged() {
        let int: Sample = serde_json::from_str("42").unwrap();
        let float: Sample = serde_json::from_str("4.5").unwrap();
        assert_eq!(int, Sample::Int(42));
        assert_eq!(float, Sample::Float(4.5));
        assert_eq!(serde_json::to_string(&Sample::Int(7)).unwrap(), "7");
    }

    #[test]
    fn test_flatten_is_group_major() {
        let input = vec![
            vec![Series::new("a"), Series::new("b")],
            vec![Series::new("c")],
        ];
        let names: Vec<&str> = flatten(&input).iter().map(|s| s.metric.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(total_series(&input), 3);
    }
}
