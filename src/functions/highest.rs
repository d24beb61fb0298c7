//! Top-K selection: `highestMax` and `highestCurrent`
//!
//! Both functions pick K series out of every input group by a per-series
//! ranking value and differ only in how that value is computed:
//!
//! - **max**: the greatest sample anywhere in the window
//! - **current**: the sample at the series' most recent in-window timestamp
//!
//! Ranking values are computed by scanning each series' own samples. Linear
//! interpolation never produces a value outside its two neighbours, so this
//! matches what a full cross-series merge would observe.
//!
//! # Ranking rules
//!
//! - Integer and float observations are tracked separately; when a series has
//!   both, the greater of the two (compared as floats) is its value.
//! - NaN samples are ignored.
//! - A series with no in-window samples is *unobserved* and ranks below every
//!   observed series.
//! - Ties keep flattened input order (group-major, then series in group).

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::aggregation::SampleView;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::functions::Expression;
use crate::types::{total_series, GroupedInput, Sample, Series, Window};

/// Which per-series value the ranking uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankCriterion {
    /// Greatest sample in the window
    Max,
    /// Sample at the latest in-window timestamp
    Current,
}

/// Per-series maxima, kept separately for integer and float observations
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SeriesMaxima {
    /// Greatest integer sample seen, if any
    pub int_max: Option<i64>,
    /// Greatest float sample seen, if any
    pub float_max: Option<f64>,
}

impl SeriesMaxima {
    fn observe(&mut self, sample: Sample) {
        match sample {
            Sample::Int(v) => {
                self.int_max = Some(self.int_max.map_or(v, |m| m.max(v)));
            }
            Sample::Float(v) if v.is_nan() => {}
            Sample::Float(v) => {
                self.float_max = Some(self.float_max.map_or(v, |m| m.max(v)));
            }
        }
    }

    /// The ranking value, or `None` if nothing was observed
    pub fn resolve(&self) -> Option<f64> {
        match (self.int_max, self.float_max) {
            (Some(i), Some(f)) => Some((i as f64).max(f)),
            (Some(i), None) => Some(i as f64),
            (None, Some(f)) => Some(f),
            (None, None) => None,
        }
    }
}

impl RankCriterion {
    /// Scan one series' view and collect its maxima under this criterion
    pub fn scan(self, view: SampleView<'_>) -> SeriesMaxima {
        let mut maxima = SeriesMaxima::default();
        match self {
            RankCriterion::Max => {
                for point in view {
                    maxima.observe(point.value);
                }
            }
            RankCriterion::Current => {
                if let Some(point) = view.last() {
                    maxima.observe(point.value);
                }
            }
        }
        maxima
    }
}

/// One row of the ranking table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankEntry {
    /// Ranking value, `None` when the series had no usable samples
    pub value: Option<f64>,
    /// Position in the flattened input
    pub index: usize,
}

impl RankEntry {
    /// Descending by value, unobserved last
    fn descending(a: &RankEntry, b: &RankEntry) -> Ordering {
        match (a.value, b.value) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl fmt::Display for RankEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(v) => write!(f, "#{}={}", self.index, v),
            None => write!(f, "#{}=unobserved", self.index),
        }
    }
}

/// Parse K from the first parameter
fn parse_k(params: &[String]) -> Result<usize> {
    let raw = params
        .first()
        .ok_or_else(|| Error::invalid_argument("need number of series to select"))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_argument(format!("invalid k='{}'", raw)));
    }

    let k: i64 = trimmed
        .parse()
        .map_err(|e| Error::invalid_argument(format!("invalid k='{}': {}", raw, e)))?;
    if k <= 0 {
        return Err(Error::invalid_argument(format!(
            "k must be positive, got {}",
            k
        )));
    }
    usize::try_from(k).map_err(|_| Error::invalid_argument(format!("k={} is too large", k)))
}

/// Build the sorted ranking table over `series`
pub fn rank(
    series: &[Series],
    window: &Window,
    criterion: RankCriterion,
) -> Result<Vec<RankEntry>> {
    let mut table = Vec::with_capacity(series.len());
    for (index, s) in series.iter().enumerate() {
        let maxima = criterion.scan(SampleView::identity(s, window)?);
        let value = maxima.resolve();
        if value.is_none() {
            debug!(index, metric = %s.metric, "series has no samples in window, ranking last");
        }
        table.push(RankEntry { value, index });
    }

    // Stable: equal values keep flattened order.
    table.sort_by(RankEntry::descending);
    Ok(table)
}

/// Shared implementation of both top-K functions
fn select_highest(
    config: &EngineConfig,
    window: &Window,
    input: GroupedInput,
    params: &[String],
    criterion: RankCriterion,
) -> Result<Vec<Series>> {
    let k = parse_k(params)?;
    let n = total_series(&input);
    if n == 0 {
        return Err(Error::invalid_argument("query results cannot be empty"));
    }

    let all: Vec<Series> = input.into_iter().flatten().collect();
    if k >= n {
        debug!(k, n, "k covers every series, returning input unranked");
        return Ok(all);
    }

    let table = rank(&all, window, criterion)?;
    if config.log_rankings {
        info!(?criterion, ranking = %render_table(&table), "ranked series");
    } else {
        debug!(?criterion, ranking = %render_table(&table), "ranked series");
    }

    if table.len() < k {
        return Err(Error::invariant(format!(
            "ranking table has {} entries, need {}",
            table.len(),
            k
        )));
    }

    let mut slots: Vec<Option<Series>> = all.into_iter().map(Some).collect();
    table[..k]
        .iter()
        .map(|entry| {
            slots
                .get_mut(entry.index)
                .and_then(Option::take)
                .ok_or_else(|| {
                    Error::invariant(format!("series #{} selected twice or missing", entry.index))
                })
        })
        .collect()
}

fn render_table(table: &[RankEntry]) -> String {
    table
        .iter()
        .map(RankEntry::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Functions
// ============================================================================

/// `highestMax(k)`: the k series with the greatest in-window sample
pub struct HighestMax {
    config: Arc<EngineConfig>,
}

impl HighestMax {
    /// Create the function with shared configuration
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }
}

impl Expression for HighestMax {
    fn name(&self) -> &'static str {
        "highestMax"
    }

    fn evaluate(
        &self,
        window: &Window,
        input: GroupedInput,
        params: &[String],
    ) -> Result<Vec<Series>> {
        select_highest(&self.config, window, input, params, RankCriterion::Max)
    }
}

/// `highestCurrent(k)`: the k series with the greatest latest sample
pub struct HighestCurrent {
    config: Arc<EngineConfig>,
}

impl HighestCurrent {
    /// Create the function with shared configuration
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }
}

impl Expression for HighestCurrent {
    fn name(&self) -> &'static str {
        "highestCurrent"
    }

    fn evaluate(
        &self,
        window: &Window,
        input: GroupedInput,
        params: &[String],
    ) -> Result<Vec<Series>> {
        select_highest(&self.config, window, input, params, RankCriterion::Current)
    }
}
