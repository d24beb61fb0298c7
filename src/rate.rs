//! Counter rollover options for rate-of-change calculations
//!
//! These options only matter when a rate is computed over a metric whose raw
//! values are counters: values that only increase until they hit a ceiling
//! and then roll over to zero. The rate computation itself lives outside this
//! crate; this type is the contract it consumes.
//!
//! The canonical text form is `{counter,counter_max,reset_value}`:
//!
//! ```rust
//! use kuba_expr::rate::RateOptions;
//!
//! let opts = RateOptions::new(true, 65_535, 1_000);
//! assert_eq!(opts.to_string(), "{true,65535,1000}");
//! assert_eq!("{true,65535,1000}".parse::<RateOptions>().unwrap(), opts);
//! ```

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map_res, opt, recognize, value},
    sequence::{delimited, pair},
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Default rate magnitude above which a rate is treated as a counter reset
pub const DEFAULT_RESET_VALUE: i64 = 0;

/// Options applied when calculating rates over counter metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateOptions {
    /// Values are a monotonically increasing, possibly wrapping counter
    #[serde(default)]
    pub counter: bool,

    /// Ceiling at which the counter wraps back to zero
    #[serde(default = "default_counter_max")]
    pub counter_max: i64,

    /// Rates larger than this are reported as zero (assumed counter reset)
    #[serde(default)]
    pub reset_value: i64,
}

fn default_counter_max() -> i64 {
    i64::MAX
}

impl Default for RateOptions {
    fn default() -> Self {
        Self {
            counter: false,
            counter_max: default_counter_max(),
            reset_value: DEFAULT_RESET_VALUE,
        }
    }
}

impl RateOptions {
    /// Create options with every field set explicitly
    pub fn new(counter: bool, counter_max: i64, reset_value: i64) -> Self {
        Self {
            counter,
            counter_max,
            reset_value,
        }
    }

    /// Whether the series should be treated as counters
    pub fn is_counter(&self) -> bool {
        self.counter
    }

    /// The value at which counters roll over
    pub fn counter_max(&self) -> i64 {
        self.counter_max
    }

    /// Rate change above which a reset is assumed
    pub fn reset_value(&self) -> i64 {
        self.reset_value
    }

    /// Set whether the series should be treated as counters
    pub fn set_counter(&mut self, counter: bool) {
        self.counter = counter;
    }

    /// Set the rollover ceiling
    pub fn set_counter_max(&mut self, counter_max: i64) {
        self.counter_max = counter_max;
    }

    /// Set the reset threshold
    pub fn set_reset_value(&mut self, reset_value: i64) {
        self.reset_value = reset_value;
    }
}

impl fmt::Display for RateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{},{},{}}}",
            self.counter, self.counter_max, self.reset_value
        )
    }
}

impl FromStr for RateOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match all_consuming(parse_rate_options).parse(s.trim()) {
            Ok((_, opts)) => Ok(opts),
            Err(e) => Err(Error::invalid_argument(format!(
                "invalid rate options '{}': {:?}",
                s, e
            ))),
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

fn ws<'a, O, P>(inner: P) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    P: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn parse_bool(input: &str) -> IResult<&str, bool> {
    alt((value(true, tag("true")), value(false, tag("false")))).parse(input)
}

fn parse_i64(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), str::parse::<i64>).parse(input)
}

fn parse_rate_options(input: &str) -> IResult<&str, RateOptions> {
    let (input, _) = char('{').parse(input)?;
    let (input, counter) = ws(parse_bool).parse(input)?;
    let (input, _) = char(',').parse(input)?;
    let (input, counter_max) = ws(parse_i64).parse(input)?;
    let (input, _) = char(',').parse(input)?;
    let (input, reset_value) = ws(parse_i64).parse(input)?;
    let (input, _) = char('}').parse(input)?;

    Ok((input, RateOptions::new(counter, counter_max, reset_value)))
}
