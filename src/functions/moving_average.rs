//! `movingAverage(window)`
//!
//! Merges every input series and smooths the merged stream with a trailing
//! average. The window is either a sample count (`5`) or a quoted duration
//! (`'10min'`), see [`WindowSpec`].

use std::sync::Arc;

use tracing::debug;

use crate::aggregation::{identity_views, Merger, MovingAverage};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::functions::window::WindowSpec;
use crate::functions::{first_series, placeholder, Expression};
use crate::types::{flatten, GroupedInput, Series, Window};

/// `movingAverage`: trailing average over all inputs merged together
pub struct MovingAverageFunction {
    config: Arc<EngineConfig>,
}

impl MovingAverageFunction {
    /// Create the function with shared configuration
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }
}

impl Expression for MovingAverageFunction {
    fn name(&self) -> &'static str {
        "movingAverage"
    }

    fn evaluate(
        &self,
        window: &Window,
        input: GroupedInput,
        params: &[String],
    ) -> Result<Vec<Series>> {
        // No input groups at all is not an error here: there is simply
        // nothing to average.
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let spec = WindowSpec::from_params(params)?;
        let views = identity_views(&flatten(&input), window)?;

        let meta = match first_series(&input) {
            Some(meta) => meta,
            None => return Ok(placeholder()),
        };
        debug!(
            count = spec.count,
            duration_based = spec.duration_based,
            inputs = views.len(),
            "moving average"
        );

        let mut output = meta.copy_meta();
        Merger::new(
            views,
            MovingAverage::new(spec.count, spec.duration_based),
            self.config.interpolation,
            self.config.skip_missing,
        )
        .collect_into(&mut output);

        Ok(vec![output])
    }
}
