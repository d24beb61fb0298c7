//! Moving-average window parameter parsing
//!
//! Two grammars are accepted:
//!
//! ```text
//! window   := count | duration
//! count    := [0-9]+                   e.g. 5        -> 5 samples
//! duration := "'" [0-9]+ unit "'"      e.g. '10min'  -> 600000 ms
//! unit     := "sec" | "min" | "hr"
//! ```
//!
//! A count window slides over a fixed number of merged samples. A duration
//! window covers a fixed wall-clock span and so may hold a variable number
//! of samples.

use nom::{
    bytes::complete::take_while,
    character::complete::{char, digit0, digit1},
    combinator::all_consuming,
    IResult, Parser,
};

use crate::error::{Error, Result};

const MS_PER_SEC: i64 = 1_000;
const MS_PER_MIN: i64 = 60_000;
const MS_PER_HR: i64 = 3_600_000;

/// Parsed window specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    /// Sample count, or milliseconds when `duration_based`
    pub count: i64,
    /// The window spans a wall-clock duration rather than a sample count
    pub duration_based: bool,
}

impl WindowSpec {
    /// Parse the first entry of a function's parameter list
    pub fn from_params(params: &[String]) -> Result<Self> {
        let param = params
            .first()
            .ok_or_else(|| Error::invalid_argument("need aggregation window for moving average"))?;
        Self::parse(param)
    }

    /// Parse a single window parameter
    ///
    /// ```rust
    /// use kuba_expr::functions::window::WindowSpec;
    ///
    /// let spec = WindowSpec::parse("'10min'").unwrap();
    /// assert_eq!(spec.count, 600_000);
    /// assert!(spec.duration_based);
    /// ```
    pub fn parse(param: &str) -> Result<Self> {
        let param = param.trim();
        if param.is_empty() {
            return Err(Error::invalid_argument(format!(
                "invalid window='{}'",
                param
            )));
        }

        let spec = if let Ok((_, digits)) = all_consuming(digit1::<&str, nom::error::Error<&str>>)
            .parse(param)
        {
            WindowSpec {
                count: parse_digits(digits, param)?,
                duration_based: false,
            }
        } else if let Ok((_, (digits, unit))) = all_consuming(quoted_duration).parse(param) {
            WindowSpec {
                count: duration_ms(digits, unit, param)?,
                duration_based: true,
            }
        } else {
            return Err(Error::invalid_argument(format!(
                "invalid window='{}': expected a sample count or a quoted duration",
                param
            )));
        };

        if spec.count <= 0 {
            return Err(Error::invalid_argument(format!(
                "window must be positive, got '{}'",
                param
            )));
        }
        Ok(spec)
    }
}

/// `'` digits unit `'`, with either part possibly empty so the caller can
/// report which one is wrong.
fn quoted_duration(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = char('\'')(input)?;
    let (input, digits) = digit0(input)?;
    let (input, unit) = take_while(|c: char| c != '\'').parse(input)?;
    let (input, _) = char('\'')(input)?;
    Ok((input, (digits, unit)))
}

fn parse_digits(digits: &str, param: &str) -> Result<i64> {
    digits
        .parse::<i64>()
        .map_err(|e| Error::invalid_argument(format!("invalid window='{}': {}", param, e)))
}

fn duration_ms(digits: &str, unit: &str, param: &str) -> Result<i64> {
    if digits.is_empty() {
        return Err(Error::invalid_argument(format!(
            "invalid parameter: {}",
            param
        )));
    }
    let amount = parse_digits(digits, param)?;

    let per_unit = match unit {
        "sec" => MS_PER_SEC,
        "min" => MS_PER_MIN,
        "hr" => MS_PER_HR,
        other => {
            return Err(Error::invalid_argument(format!(
                "unknown time unit={}",
                other
            )))
        }
    };

    amount
        .checked_mul(per_unit)
        .ok_or_else(|| Error::invalid_argument(format!("window '{}' is too large", param)))
}
