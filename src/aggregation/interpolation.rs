//! Interpolation policies for merging unaligned series
//!
//! When series are merged, a series that has no sample at a timestamp but
//! does have samples on both sides of it contributes an estimated value. The
//! policy decides what that estimate is.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::types::{DataPoint, Sample};

/// How a missing value between two samples is filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Linear interpolation between the neighbouring samples
    #[default]
    Lerp,
    /// Zero if missing
    Zim,
    /// Missing counts as the largest representable value
    Max,
    /// Missing counts as the smallest representable value
    Min,
}

impl Interpolation {
    /// Estimate the value at `timestamp`, strictly between `prev` and `next`
    ///
    /// The result is an integer when both neighbours are integers.
    pub fn interpolate(self, prev: DataPoint, next: DataPoint, timestamp: i64) -> Sample {
        let integral = prev.value.is_integer() && next.value.is_integer();

        match self {
            Interpolation::Lerp => match (prev.value, next.value) {
                (Sample::Int(y0), Sample::Int(y1)) => {
                    let span = (next.timestamp - prev.timestamp) as i128;
                    if span == 0 {
                        return Sample::Int(y0);
                    }
                    let offset = (timestamp - prev.timestamp) as i128;
                    let delta = (y1 as i128 - y0 as i128) * offset / span;
                    // Bounded by y0 and y1, so it fits back into i64.
                    Sample::Int((y0 as i128 + delta) as i64)
                }
                (a, b) => {
                    let span = (next.timestamp - prev.timestamp) as f64;
                    if span == 0.0 {
                        return Sample::Float(a.as_f64());
                    }
                    let (y0, y1) = (a.as_f64(), b.as_f64());
                    let offset = (timestamp - prev.timestamp) as f64;
                    Sample::Float(y0 + (y1 - y0) * offset / span)
                }
            },
            Interpolation::Zim if integral => Sample::Int(0),
            Interpolation::Zim => Sample::Float(0.0),
            Interpolation::Max if integral => Sample::Int(i64::MAX),
            Interpolation::Max => Sample::Float(f64::MAX),
            Interpolation::Min if integral => Sample::Int(i64::MIN),
            Interpolation::Min => Sample::Float(f64::MIN),
        }
    }

    /// Lowercase name of the policy
    pub fn as_str(&self) -> &'static str {
        match self {
            Interpolation::Lerp => "lerp",
            Interpolation::Zim => "zim",
            Interpolation::Max => "max",
            Interpolation::Min => "min",
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interpolation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lerp" => Ok(Interpolation::Lerp),
            "zim" => Ok(Interpolation::Zim),
            "max" => Ok(Interpolation::Max),
            "min" => Ok(Interpolation::Min),
            other => Err(Error::Configuration(format!(
                "unknown interpolation '{}'",
                other
            ))),
        }
    }
}
