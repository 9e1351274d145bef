//! Generic `CloudSource` trait for depth-sensing hardware.

use odist_types::{CameraFrame, PointCloud, VisionError};

use crate::cancel::CancelToken;

/// A depth camera, lidar, or any other device that can produce a 3-D point
/// cloud on demand.
///
/// Drivers implement this trait and are handed to consumers through a
/// [`SourceRegistry`][crate::registry::SourceRegistry].  Methods take
/// `&self` so one driver can be shared between concurrent requests; drivers
/// with mutable state keep it behind interior mutability.
pub trait CloudSource: Send + Sync {
    /// Stable identifier for this source, e.g. `"depth_front"`.
    fn id(&self) -> &str;

    /// Acquire the next point cloud.
    ///
    /// Must be safe to call repeatedly in a tight loop.  An empty cloud means
    /// "no points this sample" and is not an error.  Blocking drivers should
    /// poll `cancel` and return [`VisionError::Cancelled`] once it fires.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Acquisition`] if the sample cannot be taken
    /// (e.g. the device is disconnected).
    fn next_point_cloud(&self, cancel: &CancelToken) -> Result<PointCloud, VisionError>;

    /// Capture a 2-D image alongside the depth data.
    ///
    /// Sources without an image stream keep the default, which reports the
    /// method as unsupported.
    fn image(&self, _cancel: &CancelToken) -> Result<CameraFrame, VisionError> {
        Err(VisionError::unsupported("Image"))
    }
}
