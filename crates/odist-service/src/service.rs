//! [`ObstacleDistanceService`] – vision service reporting the closest
//! obstacle seen by a depth camera.
//!
//! The only capability actually implemented is object point clouds: the
//! service polls a camera `num_queries` times and reports the lower-median
//! closest point as a single [`ObstacleEstimate`].  Detection,
//! classification and generic commands answer with
//! [`VisionError::Unsupported`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use odist_hal::{CancelToken, SimDepthCamera, SourceRegistry};
//! use odist_service::{DistanceDetectorConfig, ObstacleDistanceService, ObstacleQuery};
//!
//! let deps = SourceRegistry::new().with(Arc::new(SimDepthCamera::new("depth_front", 0.8)));
//! let config = DistanceDetectorConfig {
//!     num_queries: 5,
//!     camera_name: "depth_front".to_string(),
//!     workers: Some(2),
//! };
//!
//! let service = ObstacleDistanceService::new("obstacles", config, deps).unwrap();
//! let estimate = service.get_obstacle_estimate(&CancelToken::new()).unwrap();
//! assert!((estimate.point().z - 0.8).abs() <= 0.01 + 1e-9);
//! ```

use std::sync::Arc;

use odist_hal::{CancelToken, CloudSource, SourceRegistry};
use odist_perception::MedianAggregator;
use odist_types::{
    CameraFrame, CaptureOptions, Classification, Detection, ObstacleEstimate, Properties,
    VisCapture, VisionError,
};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::config::DistanceDetectorConfig;

/// The capability a host consumes: "where is the closest obstacle right
/// now?"
pub trait ObstacleQuery: Send + Sync {
    /// Estimate the closest obstacle using the default source.
    ///
    /// # Errors
    ///
    /// Propagates acquisition failures verbatim; returns
    /// [`VisionError::NoUsableSamples`] when every sample was empty and
    /// [`VisionError::Cancelled`] when `cancel` fires.
    fn get_obstacle_estimate(&self, cancel: &CancelToken) -> Result<ObstacleEstimate, VisionError>;
}

/// Obstacles-distance vision service.
///
/// Construct with [`ObstacleDistanceService::new`], passing the validated
/// configuration inputs and every source the service may be asked to use.
pub struct ObstacleDistanceService {
    name: String,
    num_queries: usize,
    default_camera: Option<Arc<dyn CloudSource>>,
    deps: SourceRegistry,
    aggregator: MedianAggregator,
}

impl ObstacleDistanceService {
    /// Validate `config`, resolve its default camera from `deps`, and build
    /// the reduction worker pool.
    ///
    /// # Errors
    ///
    /// - [`VisionError::InvalidConfig`] for an out-of-range `num_queries`.
    /// - [`VisionError::SourceNotFound`] when the configured default camera
    ///   is not in `deps`.
    /// - [`VisionError::WorkerPool`] when the pool cannot be spawned.
    #[instrument(skip_all, fields(name = %name.as_ref()))]
    pub fn new(
        name: impl AsRef<str>,
        mut config: DistanceDetectorConfig,
        deps: SourceRegistry,
    ) -> Result<Self, VisionError> {
        config.validate()?;
        let num_queries = usize::try_from(config.num_queries)
            .map_err(|e| VisionError::InvalidConfig(e.to_string()))?;

        let default_camera = if config.camera_name.is_empty() {
            None
        } else {
            Some(deps.get(&config.camera_name)?)
        };
        let aggregator = MedianAggregator::new(config.effective_workers())?;

        info!(
            num_queries,
            camera = %config.camera_name,
            workers = aggregator.workers(),
            "obstacles distance service ready"
        );
        Ok(Self {
            name: name.as_ref().to_string(),
            num_queries,
            default_camera,
            deps,
            aggregator,
        })
    }

    /// Service instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquisitions performed per request.
    pub fn num_queries(&self) -> usize {
        self.num_queries
    }

    /// Estimate the closest obstacle seen by `camera_name`, or by the default
    /// camera when `camera_name` is empty.
    ///
    /// Returns exactly one object on success.
    ///
    /// # Errors
    ///
    /// [`VisionError::SourceNotFound`] / [`VisionError::NoCameraSpecified`]
    /// when no camera can be resolved, plus everything
    /// [`ObstacleQuery::get_obstacle_estimate`] can return.
    pub fn get_object_point_clouds(
        &self,
        camera_name: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<ObstacleEstimate>, VisionError> {
        let camera = self.resolve_camera(camera_name)?;
        Ok(vec![self.estimate(camera.as_ref(), cancel)?])
    }

    /// Combined capture: optional image, optional obstacle estimate.
    /// Detections and classifications are always empty.
    pub fn capture_all_from_camera(
        &self,
        camera_name: &str,
        options: CaptureOptions,
        cancel: &CancelToken,
    ) -> Result<VisCapture, VisionError> {
        let camera = self.resolve_camera(camera_name)?;
        let mut capture = VisCapture::default();

        if options.return_image {
            capture.image = Some(camera.image(cancel)?);
        }
        if options.return_object {
            capture.objects = vec![self.estimate(camera.as_ref(), cancel)?];
        }
        Ok(capture)
    }

    /// Not implemented by this service.
    pub fn detections(&self, _image: &CameraFrame) -> Result<Vec<Detection>, VisionError> {
        Err(VisionError::unsupported("Detections"))
    }

    /// Not implemented by this service.
    pub fn detections_from_camera(&self, _camera_name: &str) -> Result<Vec<Detection>, VisionError> {
        Err(VisionError::unsupported("DetectionsFromCamera"))
    }

    /// Not implemented by this service.
    pub fn classifications(
        &self,
        _image: &CameraFrame,
        _count: usize,
    ) -> Result<Vec<Classification>, VisionError> {
        Err(VisionError::unsupported("Classifications"))
    }

    /// Not implemented by this service.
    pub fn classifications_from_camera(
        &self,
        _camera_name: &str,
        _count: usize,
    ) -> Result<Vec<Classification>, VisionError> {
        Err(VisionError::unsupported("ClassificationsFromCamera"))
    }

    /// Not implemented by this service.
    pub fn do_command(&self, _cmd: &Map<String, Value>) -> Result<Map<String, Value>, VisionError> {
        Err(VisionError::unsupported("DoCommand"))
    }

    /// Capabilities advertised to the host.
    pub fn properties(&self) -> Properties {
        Properties {
            classification_supported: false,
            detection_supported: false,
            object_pcds_supported: true,
        }
    }

    /// Release resources.  The service holds nothing that needs closing.
    pub fn close(&self) -> Result<(), VisionError> {
        debug!(name = %self.name, "closing obstacles distance service");
        Ok(())
    }

    fn resolve_camera(&self, camera_name: &str) -> Result<Arc<dyn CloudSource>, VisionError> {
        if !camera_name.is_empty() {
            return self.deps.get(camera_name);
        }
        self.default_camera
            .clone()
            .ok_or(VisionError::NoCameraSpecified)
    }

    fn estimate(
        &self,
        camera: &dyn CloudSource,
        cancel: &CancelToken,
    ) -> Result<ObstacleEstimate, VisionError> {
        let point = self
            .aggregator
            .estimate_from_source(camera, self.num_queries, cancel)?;
        Ok(ObstacleEstimate::at(point))
    }
}

impl ObstacleQuery for ObstacleDistanceService {
    fn get_obstacle_estimate(&self, cancel: &CancelToken) -> Result<ObstacleEstimate, VisionError> {
        let camera = self.resolve_camera("")?;
        self.estimate(camera.as_ref(), cancel)
    }
}

impl std::fmt::Debug for ObstacleDistanceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObstacleDistanceService")
            .field("name", &self.name)
            .field("num_queries", &self.num_queries)
            .field(
                "default_camera",
                &self.default_camera.as_ref().map(|c| c.id().to_string()),
            )
            .field("deps", &self.deps)
            .field("aggregator", &self.aggregator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odist_hal::{ScriptedCloudSource, SimDepthCamera};
    use odist_types::{OBSTACLE_LABEL, Point3, PointCloud};

    fn single(d: f64) -> PointCloud {
        [Point3::new(0.0, 0.0, d)].into_iter().collect()
    }

    fn config(num_queries: i64, camera_name: &str) -> DistanceDetectorConfig {
        DistanceDetectorConfig {
            num_queries,
            camera_name: camera_name.to_string(),
            workers: Some(2),
        }
    }

    #[test]
    fn construction_rejects_invalid_num_queries() {
        let err = ObstacleDistanceService::new("o", config(25, ""), SourceRegistry::new()).unwrap_err();
        assert!(matches!(err, VisionError::InvalidConfig(_)));
    }

    #[test]
    fn construction_requires_default_camera_dependency() {
        let err =
            ObstacleDistanceService::new("o", config(5, "depth_front"), SourceRegistry::new()).unwrap_err();
        assert_eq!(err, VisionError::SourceNotFound("depth_front".to_string()));
    }

    #[test]
    fn default_num_queries_applied() {
        let svc = ObstacleDistanceService::new("o", config(0, ""), SourceRegistry::new()).unwrap();
        assert_eq!(svc.num_queries(), 10);
        assert_eq!(svc.name(), "o");
    }

    #[test]
    fn ten_queries_report_fifth_closest() {
        let src = Arc::new(ScriptedCloudSource::from_clouds(
            "depth",
            (1..=10).map(|d| single(d as f64)).collect(),
        ));
        let deps = SourceRegistry::new().with(src.clone());
        let svc = ObstacleDistanceService::new("o", config(10, "depth"), deps).unwrap();

        let est = svc.get_obstacle_estimate(&CancelToken::new()).unwrap();
        assert_eq!(est.point(), Point3::new(0.0, 0.0, 5.0));
        assert_eq!(est.geometry.label(), OBSTACLE_LABEL);
        assert_eq!(est.point_cloud.len(), 1);
        assert_eq!(src.calls(), 10);
    }

    #[test]
    fn named_camera_overrides_default() {
        let deps = SourceRegistry::new()
            .with(Arc::new(SimDepthCamera::new("near", 0.5)))
            .with(Arc::new(SimDepthCamera::new("far", 3.0)));
        let svc = ObstacleDistanceService::new("o", config(3, "near"), deps).unwrap();
        let token = CancelToken::new();

        let default = svc.get_object_point_clouds("", &token).unwrap();
        assert_eq!(default.len(), 1);
        assert!((default[0].point().z - 0.5).abs() <= 0.01 + 1e-9);

        let far = svc.get_object_point_clouds("far", &token).unwrap();
        assert!((far[0].point().z - 3.0).abs() <= 0.01 + 1e-9);
    }

    #[test]
    fn unknown_camera_is_not_found() {
        let svc = ObstacleDistanceService::new("o", config(3, ""), SourceRegistry::new()).unwrap();
        let err = svc.get_object_point_clouds("ghost", &CancelToken::new()).unwrap_err();
        assert_eq!(err, VisionError::SourceNotFound("ghost".to_string()));
    }

    #[test]
    fn no_camera_anywhere_is_reported() {
        let svc = ObstacleDistanceService::new("o", config(3, ""), SourceRegistry::new()).unwrap();
        let token = CancelToken::new();
        assert_eq!(
            svc.get_object_point_clouds("", &token).unwrap_err(),
            VisionError::NoCameraSpecified
        );
        assert_eq!(
            svc.get_obstacle_estimate(&token).unwrap_err(),
            VisionError::NoCameraSpecified
        );
    }

    #[test]
    fn acquisition_failure_surfaces_unchanged() {
        let failure = VisionError::Acquisition {
            camera: "depth".to_string(),
            details: "device unplugged".to_string(),
        };
        let src = Arc::new(ScriptedCloudSource::new(
            "depth",
            vec![Ok(single(1.0)), Err(failure.clone())],
        ));
        let deps = SourceRegistry::new().with(src.clone());
        let svc = ObstacleDistanceService::new("o", config(10, "depth"), deps).unwrap();

        assert_eq!(svc.get_obstacle_estimate(&CancelToken::new()).unwrap_err(), failure);
        assert_eq!(src.calls(), 2);
    }

    #[test]
    fn all_empty_samples_fail() {
        let deps = SourceRegistry::new().with(Arc::new(ScriptedCloudSource::new("depth", vec![])));
        let svc = ObstacleDistanceService::new("o", config(4, "depth"), deps).unwrap();
        assert_eq!(
            svc.get_obstacle_estimate(&CancelToken::new()).unwrap_err(),
            VisionError::NoUsableSamples
        );
    }

    #[test]
    fn capture_all_honours_options() {
        let deps = SourceRegistry::new().with(Arc::new(SimDepthCamera::new("depth", 1.0).with_grid(3)));
        let svc = ObstacleDistanceService::new("o", config(3, "depth"), deps).unwrap();
        let token = CancelToken::new();

        let nothing = svc
            .capture_all_from_camera("", CaptureOptions::default(), &token)
            .unwrap();
        assert_eq!(nothing, VisCapture::default());

        let all = svc
            .capture_all_from_camera(
                "depth",
                CaptureOptions {
                    return_image: true,
                    return_object: true,
                    ..Default::default()
                },
                &token,
            )
            .unwrap();
        assert_eq!(all.image.as_ref().map(|f| f.width), Some(3));
        assert_eq!(all.objects.len(), 1);
        assert!(all.detections.is_empty());
        assert!(all.classifications.is_empty());
    }

    #[test]
    fn capture_image_from_source_without_images_is_unsupported() {
        let deps = SourceRegistry::new().with(Arc::new(ScriptedCloudSource::new("depth", vec![])));
        let svc = ObstacleDistanceService::new("o", config(3, "depth"), deps).unwrap();
        let err = svc
            .capture_all_from_camera(
                "",
                CaptureOptions {
                    return_image: true,
                    ..Default::default()
                },
                &CancelToken::new(),
            )
            .unwrap_err();
        assert!(matches!(err, VisionError::Unsupported { .. }));
    }

    #[test]
    fn unsupported_methods_say_so() {
        let svc = ObstacleDistanceService::new("o", config(3, ""), SourceRegistry::new()).unwrap();
        let frame = CameraFrame {
            width: 1,
            height: 1,
            data: vec![0],
        };
        let errs = [
            svc.detections(&frame).unwrap_err(),
            svc.detections_from_camera("depth").unwrap_err(),
            svc.classifications(&frame, 3).unwrap_err(),
            svc.classifications_from_camera("depth", 3).unwrap_err(),
            svc.do_command(&Map::new()).unwrap_err(),
        ];
        for err in errs {
            assert!(matches!(err, VisionError::Unsupported { .. }), "got {err:?}");
        }
    }

    #[test]
    fn properties_advertise_object_point_clouds_only() {
        let svc = ObstacleDistanceService::new("o", config(3, ""), SourceRegistry::new()).unwrap();
        let props = svc.properties();
        assert!(props.object_pcds_supported);
        assert!(!props.detection_supported);
        assert!(!props.classification_supported);
        assert!(svc.close().is_ok());
    }

    #[test]
    fn cancelled_request_returns_cancelled() {
        let src = Arc::new(SimDepthCamera::new("depth", 1.0));
        let deps = SourceRegistry::new().with(src.clone());
        let svc = ObstacleDistanceService::new("o", config(5, "depth"), deps).unwrap();
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(svc.get_obstacle_estimate(&token).unwrap_err(), VisionError::Cancelled);
        assert_eq!(src.frames(), 0);
    }

    #[test]
    fn usable_through_trait_object() {
        let deps = SourceRegistry::new().with(Arc::new(SimDepthCamera::new("depth", 2.0)));
        let query: Box<dyn ObstacleQuery> =
            Box::new(ObstacleDistanceService::new("o", config(3, "depth"), deps).unwrap());
        let est = query.get_obstacle_estimate(&CancelToken::new()).unwrap();
        assert!((est.point().z - 2.0).abs() <= 0.01 + 1e-9);
    }
}
