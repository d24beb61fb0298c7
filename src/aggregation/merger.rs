//! Merging N sample streams into one
//!
//! The merger walks every distinct timestamp across its input views in
//! ascending order. At each timestamp a view contributes:
//!
//! - its own sample, if it has one at that timestamp
//! - an interpolated sample, if the timestamp lies strictly between two of
//!   its samples (unless `skip_missing` is set)
//! - nothing, if its samples have not started yet or have already ended
//!
//! The contributions are reduced by an [`Aggregator`]. Output is produced
//! lazily, one point per call to `next()`.

use std::iter::Peekable;

use crate::aggregation::aggregators::Aggregator;
use crate::aggregation::interpolation::Interpolation;
use crate::aggregation::view::SampleView;
use crate::types::{DataPoint, Sample, Series};

struct Cursor<'a> {
    view: Peekable<SampleView<'a>>,
    prev: Option<DataPoint>,
}

/// Lazily merged stream over several [`SampleView`]s
pub struct Merger<'a, A: Aggregator> {
    cursors: Vec<Cursor<'a>>,
    aggregator: A,
    interpolation: Interpolation,
    skip_missing: bool,
    scratch: Vec<Sample>,
}

impl<'a, A: Aggregator> Merger<'a, A> {
    /// Create a merger over `views`
    pub fn new(
        views: Vec<SampleView<'a>>,
        aggregator: A,
        interpolation: Interpolation,
        skip_missing: bool,
    ) -> Self {
        let scratch = Vec::with_capacity(views.len());
        let cursors = views
            .into_iter()
            .map(|view| Cursor {
                view: view.peekable(),
                prev: None,
            })
            .collect();

        Self {
            cursors,
            aggregator,
            interpolation,
            skip_missing,
            scratch,
        }
    }

    /// Number of input streams
    pub fn width(&self) -> usize {
        self.cursors.len()
    }

    /// Drain the merged stream into `target`
    pub fn collect_into(self, target: &mut Series) {
        for point in self {
            target.add_point(point);
        }
    }
}

impl<A: Aggregator> Iterator for Merger<'_, A> {
    type Item = DataPoint;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let timestamp = self
                .cursors
                .iter_mut()
                .filter_map(|c| c.view.peek().map(|p| p.timestamp))
                .min()?;

            self.scratch.clear();
            for cursor in self.cursors.iter_mut() {
                match cursor.view.peek().copied() {
                    Some(point) if point.timestamp == timestamp => {
                        self.scratch.push(point.value);
                        cursor.prev = Some(point);
                        cursor.view.next();
                    }
                    Some(next) => {
                        if let (Some(prev), false) = (cursor.prev, self.skip_missing) {
                            self.scratch
                                .push(self.interpolation.interpolate(prev, next, timestamp));
                        }
                    }
                    None => {}
                }
            }

            if let Some(value) = self.aggregator.aggregate(timestamp, &self.scratch) {
                return Some(DataPoint::new(timestamp, value));
            }
        }
    }
}
