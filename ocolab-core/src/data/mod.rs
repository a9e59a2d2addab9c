//! Ordered input series and post alignment.
//!
//! Both inputs reach the simulator as validated, timestamp-ordered containers:
//! - [`BookSeries`]: non-decreasing price updates with at-or-after lookup
//! - [`PostSeries`]: strictly increasing, second-aligned post counts

pub mod align;
pub mod series;

pub use align::{align_posts, floor_to_second};
pub use series::{BookSeries, PostSeries, SeriesError};
