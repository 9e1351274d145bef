//! Simulated cloud sources for CI/CD testing without physical hardware.
//!
//! - [`ScriptedCloudSource`] replays a fixed list of results and counts how
//!   often it was polled.  Tests use it to pin down exact acquisition
//!   behaviour (fail-fast, empty skipping, call counts).
//! - [`SimDepthCamera`] synthesises a flat obstacle patch in front of the
//!   sensor with deterministic frame-to-frame jitter and optional spurious
//!   near returns, which is what the median aggregation is built to reject.
//!
//! # Example
//!
//! ```rust
//! use odist_hal::{CancelToken, CloudSource, SimDepthCamera};
//!
//! let cam = SimDepthCamera::new("depth_front", 1.5).with_grid(3);
//! let cloud = cam.next_point_cloud(&CancelToken::new()).unwrap();
//! assert_eq!(cloud.len(), 9);
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use odist_types::{CameraFrame, Point3, PointCloud, VisionError};
use tracing::trace;

use crate::cancel::CancelToken;
use crate::source::CloudSource;

// ────────────────────────────────────────────────────────────────────────────
// Scripted source
// ────────────────────────────────────────────────────────────────────────────

/// A source that hands out pre-recorded results in order.  Once the script
/// is exhausted every further call returns an empty cloud.
pub struct ScriptedCloudSource {
    id: String,
    script: Mutex<VecDeque<Result<PointCloud, VisionError>>>,
    calls: AtomicUsize,
}

impl ScriptedCloudSource {
    /// Create a source replaying `script`.
    pub fn new(id: impl Into<String>, script: Vec<Result<PointCloud, VisionError>>) -> Self {
        Self {
            id: id.into(),
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a source replaying successful `clouds`.
    pub fn from_clouds(id: impl Into<String>, clouds: Vec<PointCloud>) -> Self {
        Self::new(id, clouds.into_iter().map(Ok).collect())
    }

    /// Number of times [`CloudSource::next_point_cloud`] has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CloudSource for ScriptedCloudSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn next_point_cloud(&self, cancel: &CancelToken) -> Result<PointCloud, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        cancel.check()?;
        let next = self
            .script
            .lock()
            .map_err(|_| VisionError::Acquisition {
                camera: self.id.clone(),
                details: "script lock poisoned".to_string(),
            })?
            .pop_front();
        next.unwrap_or_else(|| Ok(PointCloud::new()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Synthetic depth camera
// ────────────────────────────────────────────────────────────────────────────

/// Distance (metres) of the spurious return injected by
/// [`SimDepthCamera::with_spike_every`].
pub const SPIKE_DISTANCE: f64 = 0.05;

/// A simulated depth camera looking at a flat wall.
///
/// Every frame is a square grid of points on the plane `z = distance + δ`,
/// where `δ` is a small deterministic per-frame offset (at most ±1 cm).  The
/// grid is always odd-sized so the point on the optical axis is the closest
/// genuine return.
pub struct SimDepthCamera {
    id: String,
    distance: f64,
    grid: usize,
    spacing: f64,
    spike_every: Option<u64>,
    empty_every: Option<u64>,
    frame: AtomicU64,
}

impl SimDepthCamera {
    /// A 5×5 grid with 5 cm spacing at `distance` metres.
    pub fn new(id: impl Into<String>, distance: f64) -> Self {
        Self {
            id: id.into(),
            distance,
            grid: 5,
            spacing: 0.05,
            spike_every: None,
            empty_every: None,
            frame: AtomicU64::new(0),
        }
    }

    /// Points per side.  Rounded up to the next odd number.
    pub fn with_grid(mut self, grid: usize) -> Self {
        self.grid = grid.max(1) | 1;
        self
    }

    /// Every `n`-th frame also carries a spurious point [`SPIKE_DISTANCE`]
    /// metres in front of the sensor.
    pub fn with_spike_every(mut self, n: u64) -> Self {
        self.spike_every = (n > 0).then_some(n);
        self
    }

    /// Every `n`-th frame comes back empty.
    pub fn with_empty_every(mut self, n: u64) -> Self {
        self.empty_every = (n > 0).then_some(n);
        self
    }

    /// Number of frames produced so far.
    pub fn frames(&self) -> u64 {
        self.frame.load(Ordering::SeqCst)
    }

    fn jitter(frame: u64) -> f64 {
        (frame.wrapping_mul(7919) % 11) as f64 * 0.002 - 0.01
    }
}

impl CloudSource for SimDepthCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn next_point_cloud(&self, cancel: &CancelToken) -> Result<PointCloud, VisionError> {
        cancel.check()?;
        let frame = self.frame.fetch_add(1, Ordering::SeqCst) + 1;

        if self.empty_every.is_some_and(|n| frame % n == 0) {
            trace!(camera = %self.id, frame, "sim frame empty");
            return Ok(PointCloud::new());
        }

        let z = self.distance + Self::jitter(frame);
        let half = (self.grid / 2) as i64;
        let mut cloud = PointCloud::with_capacity(self.grid * self.grid + 1);
        for i in -half..=half {
            for j in -half..=half {
                cloud.push(Point3::new(i as f64 * self.spacing, j as f64 * self.spacing, z));
            }
        }
        if self.spike_every.is_some_and(|n| frame % n == 0) {
            cloud.push(Point3::new(0.0, 0.0, SPIKE_DISTANCE));
        }
        trace!(camera = %self.id, frame, points = cloud.len(), "sim frame");
        Ok(cloud)
    }

    /// A greyscale frame whose brightness falls off with wall distance.
    fn image(&self, cancel: &CancelToken) -> Result<CameraFrame, VisionError> {
        cancel.check()?;
        let shade = (255.0 - self.distance * 50.0).clamp(0.0, 255.0) as u8;
        Ok(CameraFrame {
            width: self.grid as u32,
            height: self.grid as u32,
            data: vec![shade; self.grid * self.grid],
        })
    }
}
