//! Closest-point reduction over a single point cloud.
//!
//! Distances are compared squared ([`Point3::norm2`]); the ordering is the
//! same as Euclidean distance and no square root is taken per point.

use odist_types::{Point3, PointCloud};

/// Return the point of `cloud` nearest the origin, or `None` when the cloud
/// holds no finite point.
///
/// Every point is visited once.  Ties keep the first point encountered.
/// Points with a NaN or infinite coordinate (sensor dropouts) are skipped.
pub fn try_closest_point(cloud: &PointCloud) -> Option<Point3> {
    let mut best: Option<(Point3, f64)> = None;
    for p in cloud.iter().filter(|p| p.is_finite()) {
        let d = p.norm2();
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((*p, d)),
        }
    }
    best.map(|(p, _)| p)
}

/// Return the point of `cloud` nearest the origin.
///
/// An empty cloud yields [`Point3::ORIGIN`], a zero-distance point that was
/// never observed.  Callers must drop empty clouds before reducing them, or
/// use [`try_closest_point`] to get an explicit `None`.
///
/// # Example
///
/// ```
/// use odist_perception::closest_point;
/// use odist_types::{Point3, PointCloud};
///
/// let cloud: PointCloud = [Point3::new(3.0, 0.0, 0.0), Point3::new(0.0, 1.0, 1.0)]
///     .into_iter()
///     .collect();
/// assert_eq!(closest_point(&cloud), Point3::new(0.0, 1.0, 1.0));
/// assert_eq!(closest_point(&PointCloud::new()), Point3::ORIGIN);
/// ```
pub fn closest_point(cloud: &PointCloud) -> Point3 {
    try_closest_point(cloud).unwrap_or(Point3::ORIGIN)
}
