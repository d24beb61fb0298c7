//! Combine rules applied by the merger at each timestamp
//!
//! An [`Aggregator`] receives every contributing sample at one timestamp and
//! reduces them to a single output sample. Integer inputs produce integer
//! outputs wherever the arithmetic stays exact; any float input, or integer
//! overflow, produces a float.

use std::collections::VecDeque;

use crate::types::Sample;

/// Reduces the samples of N series at one timestamp to a single sample
pub trait Aggregator {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Combine the samples contributed at `timestamp`
    ///
    /// Returns `None` when nothing should be emitted for this timestamp.
    fn aggregate(&mut self, timestamp: i64, values: &[Sample]) -> Option<Sample>;
}

// ============================================================================
// Sum / Multiply
// ============================================================================

/// Adds all contributing samples
#[derive(Debug, Default, Clone, Copy)]
pub struct Sum;

impl Aggregator for Sum {
    fn name(&self) -> &str {
        "sum"
    }

    fn aggregate(&mut self, _timestamp: i64, values: &[Sample]) -> Option<Sample> {
        fold_exact(values, i64::checked_add, |a, b| a + b)
    }
}

/// Multiplies all contributing samples
#[derive(Debug, Default, Clone, Copy)]
pub struct Multiply;

impl Aggregator for Multiply {
    fn name(&self) -> &str {
        "multiply"
    }

    fn aggregate(&mut self, _timestamp: i64, values: &[Sample]) -> Option<Sample> {
        fold_exact(values, i64::checked_mul, |a, b| a * b)
    }
}

/// Fold with integer arithmetic while every value is an integer and nothing
/// overflows, otherwise fold everything as floats.
fn fold_exact(
    values: &[Sample],
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Option<Sample> {
    let (first, rest) = values.split_first()?;

    let mut exact = match first {
        Sample::Int(v) => Some(*v),
        Sample::Float(_) => None,
    };
    if exact.is_some() {
        for value in rest {
            exact = match (exact, value) {
                (Some(acc), Sample::Int(v)) => int_op(acc, *v),
                _ => None,
            };
            if exact.is_none() {
                break;
            }
        }
    }
    if let Some(v) = exact {
        return Some(Sample::Int(v));
    }

    let acc = rest
        .iter()
        .fold(first.as_f64(), |acc, v| float_op(acc, v.as_f64()));
    Some(Sample::Float(acc))
}

// ============================================================================
// Moving Average
// ============================================================================

/// Trailing average over the per-timestamp sums of all contributing series
///
/// The window either covers the last `count` sums (sample-count window) or
/// every sum within `count` milliseconds of the current timestamp
/// (duration window). Until the window has filled, zero is emitted.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    count: i64,
    duration_based: bool,
    history: VecDeque<(i64, Sample)>,
    first_timestamp: Option<i64>,
    filled: bool,
}

impl MovingAverage {
    /// Create a moving average over `count` samples, or `count` milliseconds
    /// when `duration_based` is set.
    pub fn new(count: i64, duration_based: bool) -> Self {
        Self {
            count,
            duration_based,
            history: VecDeque::new(),
            first_timestamp: None,
            filled: false,
        }
    }

    fn push(&mut self, timestamp: i64, sum: Sample) {
        self.history.push_back((timestamp, sum));
        let first = *self.first_timestamp.get_or_insert(timestamp);

        if self.duration_based {
            let span_ms = self.count;
            if (timestamp - first).saturating_mul(1000) >= span_ms {
                self.filled = true;
            }
            while let Some(&(ts, _)) = self.history.front() {
                if (timestamp - ts).saturating_mul(1000) > span_ms {
                    self.history.pop_front();
                } else {
                    break;
                }
            }
        } else {
            let capacity = usize::try_from(self.count).unwrap_or(usize::MAX);
            while self.history.len() > capacity {
                self.history.pop_front();
            }
            if self.history.len() >= capacity {
                self.filled = true;
            }
        }
    }

    fn average(&self) -> Option<Sample> {
        let len = self.history.len();
        if len == 0 {
            return None;
        }
        if self.history.iter().all(|(_, s)| s.is_integer()) {
            let total: i128 = self
                .history
                .iter()
                .map(|(_, s)| match s {
                    Sample::Int(v) => *v as i128,
                    Sample::Float(_) => 0,
                })
                .sum();
            Some(Sample::Int((total / len as i128) as i64))
        } else {
            let total: f64 = self.history.iter().map(|(_, s)| s.as_f64()).sum();
            Some(Sample::Float(total / len as f64))
        }
    }
}

impl Aggregator for MovingAverage {
    fn name(&self) -> &str {
        "movingAverage"
    }

    fn aggregate(&mut self, timestamp: i64, values: &[Sample]) -> Option<Sample> {
        let sum = fold_exact(values, i64::checked_add, |a, b| a + b)?;
        self.push(timestamp, sum);

        if self.filled {
            self.average()
        } else {
            Some(sum.zero_like())
        }
    }
}
