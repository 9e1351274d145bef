//! `odist-types` – shared data model for the obstacles-distance stack.
//!
//! Every crate in the workspace speaks in these types: sensors produce
//! [`PointCloud`]s, perception reduces them to a single [`Point3`], and the
//! service wraps that point into an [`ObstacleEstimate`] for the host.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Point3
// ────────────────────────────────────────────────────────────────────────────

/// A point in 3-D space, expressed in the sensor frame (metres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// The sensor origin.
    pub const ORIGIN: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance from the origin.
    ///
    /// Orders points exactly like [`norm`][Self::norm] without paying for a
    /// square root.
    pub fn norm2(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Euclidean distance from the origin.
    pub fn norm(&self) -> f64 {
        self.norm2().sqrt()
    }

    /// True when every coordinate is finite (not NaN, not ±∞).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PointCloud
// ────────────────────────────────────────────────────────────────────────────

/// An RGB colour attached to a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Auxiliary per-point data.  Carried through untouched; the obstacle
/// pipeline never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
}

/// An unordered, finite set of 3-D points sampled at one instant.
///
/// May be empty: a sensor that saw nothing returns an empty cloud rather
/// than an error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointCloud {
    points: Vec<Point3>,
    data: Vec<PointData>,
}

impl PointCloud {
    /// Create an empty cloud.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cloud with room for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            data: Vec::with_capacity(capacity),
        }
    }

    /// Append a point with default auxiliary data.
    pub fn push(&mut self, point: Point3) {
        self.set(point, PointData::default());
    }

    /// Append a point together with its auxiliary data.
    pub fn set(&mut self, point: Point3, data: PointData) {
        self.points.push(point);
        self.data.push(data);
    }

    /// Number of points in the cloud.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the cloud holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The points, in insertion order.
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Iterate over the points in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Point3> {
        self.points.iter()
    }

    /// Iterate over `(point, data)` pairs in insertion order.
    pub fn iter_with_data(&self) -> impl Iterator<Item = (&Point3, &PointData)> {
        self.points.iter().zip(self.data.iter())
    }
}

impl FromIterator<Point3> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3>>(iter: I) -> Self {
        let mut cloud = PointCloud::new();
        for p in iter {
            cloud.push(p);
        }
        cloud
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Obstacle estimate
// ────────────────────────────────────────────────────────────────────────────

/// Label attached to the marker geometry of every reported obstacle.
pub const OBSTACLE_LABEL: &str = "obstacle";

/// Marker geometry attached to a detected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Geometry {
    /// A zero-volume point marker.
    Point { center: Point3, label: String },
}

impl Geometry {
    /// Centre of the geometry.
    pub fn center(&self) -> Point3 {
        match self {
            Geometry::Point { center, .. } => *center,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        match self {
            Geometry::Point { label, .. } => label,
        }
    }
}

/// The single point reported as the nearest perceived obstacle, wrapped the
/// way a vision host expects an object: a (one-point) cloud plus a marker
/// geometry centred on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleEstimate {
    pub point_cloud: PointCloud,
    pub geometry: Geometry,
}

impl ObstacleEstimate {
    /// Wrap `point` into an estimate labelled [`OBSTACLE_LABEL`].
    pub fn at(point: Point3) -> Self {
        let mut point_cloud = PointCloud::with_capacity(1);
        point_cloud.set(point, PointData::default());
        Self {
            point_cloud,
            geometry: Geometry::Point {
                center: point,
                label: OBSTACLE_LABEL.to_string(),
            },
        }
    }

    /// The obstacle position.
    pub fn point(&self) -> Point3 {
        self.geometry.center()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vision service surface
// ────────────────────────────────────────────────────────────────────────────

/// A raw image frame returned by a camera driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw pixel data (e.g. RGB24 or greyscale).
    pub data: Vec<u8>,
}

/// What a capture call should include in its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaptureOptions {
    pub return_image: bool,
    pub return_object: bool,
    pub return_detections: bool,
    pub return_classifications: bool,
}

/// A 2-D detection.  Never produced by this stack; present so capture
/// responses keep the shape the host expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub score: f64,
}

/// An image classification.  Never produced by this stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub score: f64,
}

/// Combined response of a capture-all call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisCapture {
    pub image: Option<CameraFrame>,
    pub objects: Vec<ObstacleEstimate>,
    pub detections: Vec<Detection>,
    pub classifications: Vec<Classification>,
}

/// Which vision capabilities a service actually implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    pub classification_supported: bool,
    pub detection_supported: bool,
    pub object_pcds_supported: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Global error type spanning sensor failures, empty samples, configuration
/// rejections and unsupported capabilities.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VisionError {
    #[error("Acquisition failed on {camera}: {details}")]
    Acquisition { camera: String, details: String },

    #[error("none of the input point clouds contained any points")]
    NoUsableSamples,

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("could not find camera {0:?}")]
    SourceNotFound(String),

    #[error("no camera specified")]
    NoCameraSpecified,

    #[error("obstacles distance service does not implement {method}")]
    Unsupported { method: String },

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

impl VisionError {
    /// Shorthand for [`VisionError::Unsupported`].
    pub fn unsupported(method: &str) -> Self {
        VisionError::Unsupported {
            method: method.to_string(),
        }
    }
}
