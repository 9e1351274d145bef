//! `odist-perception` – turns repeated noisy depth samples into one robust
//! obstacle position.
//!
//! # Modules
//!
//! - [`closest`] – [`closest_point`][closest::closest_point]: reduces one
//!   point cloud to the point nearest the sensor origin.
//! - [`median`] – order-statistic helpers: distance ordering and lower-median
//!   selection over candidate points.
//! - [`aggregator`] – [`MedianAggregator`][aggregator::MedianAggregator]:
//!   polls a source `N` times, fans the closest-point reduction out over a
//!   fixed worker pool, and returns the lower-median candidate.

pub mod aggregator;
pub mod closest;
pub mod median;

pub use aggregator::MedianAggregator;
pub use closest::{closest_point, try_closest_point};
pub use median::{lower_median_index, median_point};
