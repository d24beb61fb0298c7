//! Sample stream adapters
//!
//! A [`SampleView`] is a forward-only cursor over one series' samples that
//! fall inside an evaluation window. Views can lazily negate or invert each
//! sample as it is read, which is how series subtraction and division are
//! expressed on top of SUM and MULTIPLY.

use std::collections::btree_map;

use crate::error::{Error, Result};
use crate::types::{DataPoint, Sample, Series, Window};

/// Per-sample transform applied when a view yields a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewTransform {
    /// Samples are yielded unchanged
    #[default]
    Identity,
    /// Samples are negated, integers stay integers
    Negate,
    /// Samples are replaced by `1.0 / value`, always a float
    Reciprocal,
}

impl ViewTransform {
    /// Apply the transform to a single sample
    pub fn apply(self, sample: Sample) -> Sample {
        match (self, sample) {
            (ViewTransform::Identity, s) => s,
            (ViewTransform::Negate, Sample::Int(v)) => match v.checked_neg() {
                Some(n) => Sample::Int(n),
                None => Sample::Float(-(v as f64)),
            },
            (ViewTransform::Negate, Sample::Float(v)) => Sample::Float(-v),
            // 1/0 is +inf by IEEE rules; no error is raised.
            (ViewTransform::Reciprocal, s) => Sample::Float(1.0 / s.as_f64()),
        }
    }
}

/// Forward-only, ordered cursor over a series' samples in `[start, end)`
///
/// Bounds are in epoch seconds, the window's millisecond bounds divided
/// by 1000.
#[derive(Debug)]
pub struct SampleView<'a> {
    inner: btree_map::Range<'a, i64, Sample>,
    transform: ViewTransform,
}

impl<'a> SampleView<'a> {
    /// Create a view over `series` restricted to `window`
    pub fn new(series: &'a Series, window: &Window, transform: ViewTransform) -> Result<Self> {
        let (start, end) = (window.start_secs(), window.end_secs());
        if start > end {
            return Err(Error::invalid_argument(format!(
                "cannot build sample view for '{}': start {} > end {}",
                series.metric, start, end
            )));
        }

        Ok(Self {
            inner: series.dps.range(start..end),
            transform,
        })
    }

    /// Untransformed view over `series`
    pub fn identity(series: &'a Series, window: &Window) -> Result<Self> {
        Self::new(series, window, ViewTransform::Identity)
    }

    /// The transform this view applies
    pub fn transform(&self) -> ViewTransform {
        self.transform
    }
}

impl Iterator for SampleView<'_> {
    type Item = DataPoint;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(&ts, &v)| DataPoint::new(ts, self.transform.apply(v)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Build identity views over every series, in order
pub fn identity_views<'a>(series: &[&'a Series], window: &Window) -> Result<Vec<SampleView<'a>>> {
    series
        .iter()
        .map(|s| SampleView::identity(s, window))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> Series {
        Series::new("m")
            .with_point(5, 1)
            .with_point(10, -4)
            .with_point(20, 2.5)
            .with_point(30, 0)
    }

    #[test]
    fn test_view_respects_half_open_window() {
        let s = series();
        let window = Window::new(10_000, 30_000).unwrap();
        let ts: Vec<i64> = SampleView::identity(&s, &window)
            .unwrap()
            .map(|p| p.timestamp)
            .collect();
        assert_eq!(ts, vec![10, 20]);
    }

    #[test]
    fn test_negate_keeps_integer_kind() {
        let s = series();
        let window = Window::new(0, 100_000).unwrap();
        let values: Vec<Sample> = SampleView::new(&s, &window, ViewTransform::Negate)
            .unwrap()
            .map(|p| p.value)
            .collect();
        assert_eq!(
            values,
            vec![
                Sample::Int(-1),
                Sample::Int(4),
                Sample::Float(-2.5),
                Sample::Int(0)
            ]
        );
    }

    #[test]
    fn test_negate_overflow_promotes_to_float() {
        let out = ViewTransform::Negate.apply(Sample::Int(i64::MIN));
        assert_eq!(out, Sample::Float(9.223372036854775808e18));
    }

    #[test]
    fn test_reciprocal_is_float() {
        assert_eq!(
            ViewTransform::Reciprocal.apply(Sample::Int(4)),
            Sample::Float(0.25)
        );
        assert_eq!(
            ViewTransform::Reciprocal.apply(Sample::Int(0)),
            Sample::Float(f64::INFINITY)
        );
    }

    #[test]
    fn test_view_rejects_inverted_window() {
        let s = series();
        let window = Window {
            start_ms: 10_000,
            end_ms: 0,
        };
        assert!(SampleView::identity(&s, &window).is_err());
    }
}
