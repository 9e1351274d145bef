//! `odist-hal` – Sensor abstraction layer.
//!
//! # Modules
//!
//! - [`source`] – [`CloudSource`][source::CloudSource]: the trait every
//!   depth-sensing driver implements to hand out one point cloud per call.
//! - [`cancel`] – [`CancelToken`][cancel::CancelToken]: a cloneable
//!   cancellation signal threaded through acquisition and reduction.
//! - [`registry`] – [`SourceRegistry`][registry::SourceRegistry]: explicit,
//!   name-keyed dependency set used to resolve cameras at construction time.
//! - [`sim`] – scripted and synthetic sources for CI and demos without
//!   physical hardware.

pub mod cancel;
pub mod registry;
pub mod sim;
pub mod source;

pub use cancel::CancelToken;
pub use registry::SourceRegistry;
pub use sim::{ScriptedCloudSource, SimDepthCamera};
pub use source::CloudSource;
