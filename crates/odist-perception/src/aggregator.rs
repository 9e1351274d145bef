//! Median Aggregator – robust obstacle position from repeated samples.
//!
//! One call runs three phases:
//!
//! 1. **Acquire** – poll the source exactly `num_queries` times on the
//!    calling thread.  Empty clouds are skipped; the first error aborts the
//!    call and is returned unchanged.
//! 2. **Reduce** – split the non-empty clouds into at most `workers`
//!    contiguous groups and compute each cloud's closest point on the
//!    worker pool.  Each group owns its output list; nothing is shared
//!    mutably between workers.
//! 3. **Select** – concatenate the group outputs, sort by distance from the
//!    origin and return the lower-median candidate.
//!
//! The [`CancelToken`] is checked before every acquisition and before every
//! cloud a worker reduces.  A fired token yields
//! [`VisionError::Cancelled`], never a partial estimate.
//!
//! # Example
//!
//! ```rust
//! use odist_hal::{CancelToken, SimDepthCamera};
//! use odist_perception::MedianAggregator;
//!
//! // A wall 1.2 m away, with a spurious 5 cm return every third frame.
//! let camera = SimDepthCamera::new("depth_front", 1.2).with_spike_every(3);
//! let aggregator = MedianAggregator::new(4).unwrap();
//!
//! let obstacle = aggregator
//!     .estimate_from_source(&camera, 10, &CancelToken::new())
//!     .unwrap();
//! assert!((obstacle.z - 1.2).abs() <= 0.01 + 1e-9);
//! ```

use odist_hal::{CancelToken, CloudSource};
use odist_types::{Point3, PointCloud, VisionError};
use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use crate::closest::try_closest_point;
use crate::median::median_point;

/// Default worker count: the size of rayon's global pool, which follows the
/// machine's available parallelism.
pub fn default_workers() -> usize {
    rayon::current_num_threads().max(1)
}

/// Runs acquisition, parallel closest-point reduction, and median selection.
///
/// Owns a fixed-size rayon pool.  Keeps no state between calls.
pub struct MedianAggregator {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl MedianAggregator {
    /// Build an aggregator whose reduction phase uses `workers` groups
    /// (clamped to at least one).
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::WorkerPool`] if the thread pool cannot be
    /// spawned.
    pub fn new(workers: usize) -> Result<Self, VisionError> {
        let workers = workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("odist-reduce-{i}"))
            .build()
            .map_err(|e| VisionError::WorkerPool(e.to_string()))?;
        Ok(Self { pool, workers })
    }

    /// Build an aggregator sized by [`default_workers`].
    pub fn with_default_workers() -> Result<Self, VisionError> {
        Self::new(default_workers())
    }

    /// Number of worker groups used by the reduction phase.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Estimate the nearest obstacle from `num_queries` calls to `acquire`.
    ///
    /// # Errors
    ///
    /// - Whatever `acquire` returns, verbatim, on its first failure.  No
    ///   further calls are made.
    /// - [`VisionError::NoUsableSamples`] when every cloud was empty or
    ///   `num_queries` is zero.
    /// - [`VisionError::Cancelled`] when `cancel` fires.
    #[instrument(skip_all, fields(num_queries = num_queries, workers = self.workers))]
    pub fn estimate_obstacle<F>(
        &self,
        mut acquire: F,
        num_queries: usize,
        cancel: &CancelToken,
    ) -> Result<Point3, VisionError>
    where
        F: FnMut(&CancelToken) -> Result<PointCloud, VisionError>,
    {
        let clouds = acquire_clouds(&mut acquire, num_queries, cancel)?;
        if clouds.is_empty() {
            warn!(num_queries, "no usable point clouds acquired");
            return Err(VisionError::NoUsableSamples);
        }
        self.median_from_point_clouds(&clouds, cancel)
    }

    /// [`estimate_obstacle`][Self::estimate_obstacle] driven by a
    /// [`CloudSource`].
    pub fn estimate_from_source(
        &self,
        source: &dyn CloudSource,
        num_queries: usize,
        cancel: &CancelToken,
    ) -> Result<Point3, VisionError> {
        debug!(camera = source.id(), num_queries, "estimating obstacle");
        self.estimate_obstacle(|c| source.next_point_cloud(c), num_queries, cancel)
    }

    /// Reduce already-acquired clouds and return the lower-median closest
    /// point.  Clouds with no finite point contribute no candidate.
    ///
    /// # Errors
    ///
    /// [`VisionError::NoUsableSamples`] when no candidate survives;
    /// [`VisionError::Cancelled`] when `cancel` fires.
    pub fn median_from_point_clouds(
        &self,
        clouds: &[PointCloud],
        cancel: &CancelToken,
    ) -> Result<Point3, VisionError> {
        let groups = self.reduce_parallel(clouds, cancel)?;
        cancel.check()?;

        let candidates: Vec<Point3> = groups.into_iter().flatten().collect();
        let count = candidates.len();
        let median = median_point(candidates).ok_or(VisionError::NoUsableSamples)?;
        debug!(
            candidates = count,
            x = median.x,
            y = median.y,
            z = median.z,
            "selected median obstacle point"
        );
        Ok(median)
    }

    /// Fan the closest-point reduction out over the pool.  Returns one list
    /// per worker group, in group order.
    pub fn reduce_parallel(
        &self,
        clouds: &[PointCloud],
        cancel: &CancelToken,
    ) -> Result<Vec<Vec<Point3>>, VisionError> {
        if clouds.is_empty() {
            return Ok(Vec::new());
        }
        let groups = self.workers.min(clouds.len());
        let group_size = clouds.len().div_ceil(groups);
        self.pool.install(|| {
            clouds
                .par_chunks(group_size)
                .map(|group| reduce_group(group, cancel))
                .collect()
        })
    }
}

impl std::fmt::Debug for MedianAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MedianAggregator")
            .field("workers", &self.workers)
            .finish()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn acquire_clouds<F>(
    acquire: &mut F,
    num_queries: usize,
    cancel: &CancelToken,
) -> Result<Vec<PointCloud>, VisionError>
where
    F: FnMut(&CancelToken) -> Result<PointCloud, VisionError>,
{
    let mut clouds = Vec::with_capacity(num_queries);
    for attempt in 0..num_queries {
        cancel.check()?;
        let cloud = acquire(cancel)
            .inspect_err(|e| warn!(attempt, error = %e, "point cloud acquisition failed"))?;
        if cloud.is_empty() {
            debug!(attempt, "skipping empty point cloud");
            continue;
        }
        clouds.push(cloud);
    }
    Ok(clouds)
}

fn reduce_group(group: &[PointCloud], cancel: &CancelToken) -> Result<Vec<Point3>, VisionError> {
    let mut closest = Vec::with_capacity(group.len());
    for cloud in group {
        cancel.check()?;
        if let Some(p) = try_closest_point(cloud) {
            closest.push(p);
        }
    }
    Ok(closest)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
