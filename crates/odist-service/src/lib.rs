//! `odist-service` – the obstacles-distance vision service.
//!
//! Exposes the [`MedianAggregator`][odist_perception::MedianAggregator] to a
//! host as a single "closest obstacle" capability, plus the rest of the
//! vision-service surface it answers (or explicitly declines).
//!
//! # Modules
//!
//! - [`config`] – [`DistanceDetectorConfig`][config::DistanceDetectorConfig]:
//!   TOML-backed settings with validation and `ODIST_*` env overrides.
//! - [`service`] – [`ObstacleDistanceService`][service::ObstacleDistanceService]:
//!   built from an explicit config and an explicit
//!   [`SourceRegistry`][odist_hal::SourceRegistry]; no global registration.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   process-wide `tracing` subscriber.

pub mod config;
pub mod service;
pub mod telemetry;

pub use config::{DEFAULT_NUM_QUERIES, DistanceDetectorConfig};
pub use service::{ObstacleDistanceService, ObstacleQuery};
pub use telemetry::init_tracing;
