//! Order-statistic helpers over candidate points.

use std::cmp::Ordering;

use odist_types::Point3;

/// Index of the lower median in a sorted sequence of `len` elements, i.e.
/// `(len - 1) / 2`.  `None` for an empty sequence.
///
/// Even lengths pick the lower of the two middle elements so the result is
/// always an observed candidate, never an interpolation.
pub fn lower_median_index(len: usize) -> Option<usize> {
    len.checked_sub(1).map(|n| n / 2)
}

/// Total order on points by squared distance from the origin.
///
/// Equal distances fall back to `x`, `y`, `z` so the order (and therefore
/// the selected median) does not depend on input order.
pub fn by_distance(a: &Point3, b: &Point3) -> Ordering {
    a.norm2()
        .total_cmp(&b.norm2())
        .then_with(|| a.x.total_cmp(&b.x))
        .then_with(|| a.y.total_cmp(&b.y))
        .then_with(|| a.z.total_cmp(&b.z))
}

/// Sort `points` ascending by distance from the origin.
pub fn sort_by_distance(points: &mut [Point3]) {
    points.sort_by(by_distance);
}

/// Sort `candidates` by distance and return the lower-median element.
///
/// # Example
///
/// ```
/// use odist_perception::median_point;
/// use odist_types::Point3;
///
/// // Squared distances 9, 1, 4 → sorted 1, 4, 9 → index 1.
/// let candidates = vec![
///     Point3::new(3.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(2.0, 0.0, 0.0),
/// ];
/// assert_eq!(median_point(candidates), Some(Point3::new(2.0, 0.0, 0.0)));
/// ```
pub fn median_point(mut candidates: Vec<Point3>) -> Option<Point3> {
    let index = lower_median_index(candidates.len())?;
    sort_by_distance(&mut candidates);
    Some(candidates[index])
}
