//! `odist-cli` – run the obstacles-distance service against a simulated
//! depth camera.
//!
//! ```text
//! odist [WALL_DISTANCE_M]
//! ```
//!
//! 1. Loads `~/.odist/config.toml` (or `$ODIST_CONFIG`), falling back to
//!    defaults when absent.
//! 2. Registers a [`SimDepthCamera`] looking at a wall `WALL_DISTANCE_M`
//!    metres away (default 1.0) with occasional spurious near returns.
//! 3. Installs a **Ctrl-C** handler that fires the request's
//!    [`CancelToken`].
//! 4. Prints the estimated obstacle position.

use std::process::ExitCode;
use std::sync::Arc;

use colored::Colorize;
use odist_hal::{CancelToken, SimDepthCamera, SourceRegistry};
use odist_service::config;
use odist_service::{DistanceDetectorConfig, ObstacleDistanceService, ObstacleQuery};
use odist_types::VisionError;
use tracing::warn;

const SIM_CAMERA: &str = "sim_depth";

fn main() -> ExitCode {
    if let Err(e) = odist_service::init_tracing("odist-cli") {
        eprintln!("tracing already initialised: {e}");
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), VisionError> {
    let wall_distance = parse_wall_distance(std::env::args().nth(1).as_deref())?;

    let mut cfg = match config::load()? {
        Some(cfg) => {
            println!("  Config loaded from {}", config::config_path().display().to_string().bold());
            cfg
        }
        None => DistanceDetectorConfig::default(),
    };
    if cfg.camera_name.is_empty() {
        cfg.camera_name = SIM_CAMERA.to_string();
    }

    let camera_name = cfg.camera_name.clone();
    let camera = SimDepthCamera::new(camera_name.clone(), wall_distance)
        .with_spike_every(4)
        .with_empty_every(7);
    let deps = SourceRegistry::new().with(Arc::new(camera));
    let service = ObstacleDistanceService::new("obstacles-distance", cfg, deps)?;

    let cancel = CancelToken::new();
    let cancel_on_ctrlc = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – cancelling request …".yellow().bold());
        cancel_on_ctrlc.cancel();
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the request cannot be cancelled");
    }

    println!(
        "  Sampling {} point clouds from {} …",
        service.num_queries(),
        camera_name.dimmed()
    );
    let estimate = service.get_obstacle_estimate(&cancel)?;
    let p = estimate.point();
    println!(
        "  {} {} at ({:.3}, {:.3}, {:.3}) – {:.3} m away",
        "✓".green(),
        estimate.geometry.label().bold(),
        p.x,
        p.y,
        p.z,
        p.norm()
    );
    service.close()
}

fn parse_wall_distance(arg: Option<&str>) -> Result<f64, VisionError> {
    match arg {
        None => Ok(1.0),
        Some(raw) => match raw.parse::<f64>() {
            Ok(d) if d.is_finite() && d > 0.0 => Ok(d),
            _ => Err(VisionError::InvalidConfig(format!(
                "wall distance must be a positive number of metres, got {raw:?}"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_distance_defaults_to_one_metre() {
        assert_eq!(parse_wall_distance(None).unwrap(), 1.0);
    }

    #[test]
    fn wall_distance_parses_positive_numbers() {
        assert_eq!(parse_wall_distance(Some("2.5")).unwrap(), 2.5);
    }

    #[test]
    fn wall_distance_rejects_garbage() {
        for raw in ["-1", "0", "abc", "NaN", "inf"] {
            assert!(
                matches!(parse_wall_distance(Some(raw)), Err(VisionError::InvalidConfig(_))),
                "{raw} must be rejected"
            );
        }
    }
}
