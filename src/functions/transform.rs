//! Elementwise transforms: `abs` and `scale`
//!
//! Only the first input group is transformed; any later groups are ignored.
//! The series of that group are rewritten in place and handed back, so the
//! output is the caller's own series, not a copy.

use tracing::debug;

use crate::error::{Error, Result};
use crate::functions::{require_input, Expression};
use crate::types::{GroupedInput, Sample, Series, Window};

/// Take ownership of the first group, dropping the rest
fn first_group(input: GroupedInput) -> Result<Vec<Series>> {
    require_input(&input)?;
    let groups = input.len();
    if groups > 1 {
        debug!(ignored = groups - 1, "transform applies to the first group only");
    }
    Ok(input.into_iter().next().unwrap_or_default())
}

/// Apply `f` to every sample of every series
fn map_samples(series: &mut [Series], f: impl Fn(Sample) -> Sample) {
    for s in series.iter_mut() {
        for value in s.dps.values_mut() {
            *value = f(*value);
        }
    }
}

// ============================================================================
// abs
// ============================================================================

fn absolute(sample: Sample) -> Sample {
    match sample {
        Sample::Int(v) => match v.checked_abs() {
            Some(a) => Sample::Int(a),
            None => Sample::Float((v as f64).abs()),
        },
        Sample::Float(v) => Sample::Float(v.abs()),
    }
}

/// `abs`: absolute value of every sample
///
/// Integers stay integers; `i64::MIN`, which has no integer absolute value,
/// becomes a float.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbsoluteValue;

impl Expression for AbsoluteValue {
    fn name(&self) -> &'static str {
        "abs"
    }

    fn evaluate(
        &self,
        _window: &Window,
        input: GroupedInput,
        _params: &[String],
    ) -> Result<Vec<Series>> {
        let mut series = first_group(input)?;
        map_samples(&mut series, absolute);
        Ok(series)
    }
}

// ============================================================================
// scale
// ============================================================================

/// Parse the scale factor, ignoring quote characters and whitespace
fn parse_factor(params: &[String]) -> Result<f64> {
    let raw = params
        .first()
        .ok_or_else(|| Error::invalid_argument("scaling parameter not available"))?;
    let cleaned: String = raw.chars().filter(|c| *c != '\'' && *c != '"').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .map_err(|e| Error::invalid_argument(format!("invalid scale factor '{}': {}", raw, e)))
}

/// Multiply a sample by `factor`
///
/// Integer samples are multiplied and then truncated toward zero. Integral
/// factors use exact integer arithmetic when the product fits.
fn scale_sample(sample: Sample, factor: f64) -> Sample {
    match sample {
        Sample::Int(v) => {
            let integral = factor.fract() == 0.0
                && factor >= i64::MIN as f64
                && factor < i64::MAX as f64;
            if integral {
                if let Some(product) = v.checked_mul(factor as i64) {
                    return Sample::Int(product);
                }
            }
            // `as` truncates toward zero and saturates out-of-range values.
            Sample::Int((v as f64 * factor) as i64)
        }
        Sample::Float(v) => Sample::Float(v * factor),
    }
}

/// `scale(factor)`: multiply every sample by a constant
#[derive(Debug, Default, Clone, Copy)]
pub struct Scale;

impl Expression for Scale {
    fn name(&self) -> &'static str {
        "scale"
    }

    fn evaluate(
        &self,
        _window: &Window,
        input: GroupedInput,
        params: &[String],
    ) -> Result<Vec<Series>> {
        let factor = parse_factor(params)?;
        let mut series = first_group(input)?;
        map_samples(&mut series, |s| scale_sample(s, factor));
        Ok(series)
    }
}
