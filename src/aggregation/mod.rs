//! Sample streams, interpolation and merge aggregation
//!
//! This module holds the machinery the expression functions are built on:
//!
//! ```text
//!  Series ──► SampleView (window + lazy transform) ─┐
//!  Series ──► SampleView ───────────────────────────┼─► Merger ──► DataPoint stream
//!  Series ──► SampleView ───────────────────────────┘     │
//!                                              Interpolation + Aggregator
//! ```
//!
//! # Key Components
//!
//! - **`SampleView`**: forward-only cursor over one series inside a window,
//!   optionally negating or inverting samples as they are read
//! - **`Interpolation`**: how a series fills a timestamp it has no sample for
//! - **`Aggregator`**: combine rule for the samples at one timestamp
//!   (`Sum`, `Multiply`, `MovingAverage`)
//! - **`Merger`**: drives N views through an aggregator, lazily

pub mod aggregators;
pub mod interpolation;
pub mod merger;
pub mod view;

pub use aggregators::{Aggregator, MovingAverage, Multiply, Sum};
pub use interpolation::Interpolation;
pub use merger::Merger;
pub use view::{identity_views, SampleView, ViewTransform};
