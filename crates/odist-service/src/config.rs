//! Service configuration – reads `~/.odist/config.toml`.
//!
//! ```toml
//! num_queries = 10          # 1..=20, 0 or absent means the default (10)
//! camera_name = "depth_front"
//! workers = 4               # optional, defaults to available parallelism
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use odist_perception::aggregator::default_workers;
use odist_types::VisionError;
use serde::{Deserialize, Serialize};

/// Number of acquisitions per request when the config leaves it unset.
pub const DEFAULT_NUM_QUERIES: i64 = 10;
/// Smallest accepted `num_queries`.
pub const MIN_NUM_QUERIES: i64 = 1;
/// Largest accepted `num_queries`.
pub const MAX_NUM_QUERIES: i64 = 20;

/// Settings for one obstacles-distance service instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DistanceDetectorConfig {
    /// Sequential point-cloud acquisitions per request.  `0` selects
    /// [`DEFAULT_NUM_QUERIES`].
    #[serde(default)]
    pub num_queries: i64,

    /// Camera used when a request names none.  Empty means "no default".
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub camera_name: String,

    /// Worker groups for the reduction phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl DistanceDetectorConfig {
    /// Fill in defaults and check ranges.
    ///
    /// Returns the names of the sources this config requires (the default
    /// camera, when one is set).
    ///
    /// # Errors
    ///
    /// [`VisionError::InvalidConfig`] when `num_queries` is outside
    /// `[1, 20]` after defaulting.
    pub fn validate(&mut self) -> Result<Vec<String>, VisionError> {
        if self.num_queries == 0 {
            self.num_queries = DEFAULT_NUM_QUERIES;
        }
        if !(MIN_NUM_QUERIES..=MAX_NUM_QUERIES).contains(&self.num_queries) {
            return Err(VisionError::InvalidConfig(format!(
                "invalid number of queries ({}), pick a number between {} and {}",
                self.num_queries, MIN_NUM_QUERIES, MAX_NUM_QUERIES
            )));
        }

        let mut required = Vec::new();
        if !self.camera_name.is_empty() {
            required.push(self.camera_name.clone());
        }
        Ok(required)
    }

    /// Worker groups to use: the configured value (at least one) or
    /// [`default_workers`].
    pub fn effective_workers(&self) -> usize {
        self.workers.map_or_else(default_workers, |w| w.max(1))
    }
}

/// Return the config path: `$ODIST_CONFIG` when set, otherwise
/// `~/.odist/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("ODIST_CONFIG") {
        return PathBuf::from(p);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".odist").join("config.toml")
}

/// Load the config from [`config_path`] and apply env overrides.  Returns
/// `None` if the file does not exist.
pub fn load() -> Result<Option<DistanceDetectorConfig>, VisionError> {
    let mut cfg = load_from(&config_path())?;
    if let Some(c) = cfg.as_mut() {
        apply_env_overrides(c);
    }
    Ok(cfg)
}

/// Load the config from a specific path.
pub fn load_from(path: &Path) -> Result<Option<DistanceDetectorConfig>, VisionError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        VisionError::InvalidConfig(format!("failed to read config at {}: {}", path.display(), e))
    })?;
    let cfg: DistanceDetectorConfig = toml::from_str(&raw)
        .map_err(|e| VisionError::InvalidConfig(format!("failed to parse config: {}", e)))?;
    Ok(Some(cfg))
}

/// Apply `ODIST_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `ODIST_NUM_QUERIES` | `num_queries` |
/// | `ODIST_CAMERA` | `camera_name` |
/// | `ODIST_WORKERS` | `workers` |
///
/// Numeric values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut DistanceDetectorConfig) {
    if let Ok(v) = std::env::var("ODIST_NUM_QUERIES")
        && let Ok(n) = v.parse::<i64>()
    {
        cfg.num_queries = n;
    }
    if let Ok(v) = std::env::var("ODIST_CAMERA") {
        cfg.camera_name = v;
    }
    if let Ok(v) = std::env::var("ODIST_WORKERS")
        && let Ok(n) = v.parse::<usize>()
    {
        cfg.workers = Some(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_num_queries_defaults_to_ten() {
        let mut cfg = DistanceDetectorConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.num_queries, DEFAULT_NUM_QUERIES);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        for n in [1, 20] {
            let mut cfg = DistanceDetectorConfig {
                num_queries: n,
                ..Default::default()
            };
            assert!(cfg.validate().is_ok(), "{n} must be accepted");
        }
    }

    #[test]
    fn out_of_range_num_queries_rejected() {
        for n in [-1, 21, 100] {
            let mut cfg = DistanceDetectorConfig {
                num_queries: n,
                ..Default::default()
            };
            match cfg.validate() {
                Err(VisionError::InvalidConfig(msg)) => {
                    assert!(msg.contains("between 1 and 20"), "unexpected message: {msg}")
                }
                other => panic!("expected InvalidConfig for {n}, got {other:?}"),
            }
        }
    }

    #[test]
    fn default_camera_is_required_dependency() {
        let mut cfg = DistanceDetectorConfig {
            camera_name: "depth_front".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.validate().unwrap(), vec!["depth_front".to_string()]);

        let mut no_cam = DistanceDetectorConfig::default();
        assert!(no_cam.validate().unwrap().is_empty());
    }

    #[test]
    fn effective_workers_clamps_and_defaults() {
        let cfg = DistanceDetectorConfig {
            workers: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.effective_workers(), 1);
        assert!(DistanceDetectorConfig::default().effective_workers() >= 1);
    }

    #[test]
    fn config_path_points_to_odist_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".odist"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn load_from_parses_toml() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "num_queries = 5\ncamera_name = \"depth_front\"\nworkers = 2\n").unwrap();

        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.num_queries, 5);
        assert_eq!(cfg.camera_name, "depth_front");
        assert_eq!(cfg.workers, Some(2));
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "num_queries = \"ten\"\n").unwrap();
        assert!(matches!(load_from(&path), Err(VisionError::InvalidConfig(_))));
    }

    #[test]
    fn toml_roundtrip_omits_unset_fields() {
        let cfg = DistanceDetectorConfig {
            num_queries: 12,
            ..Default::default()
        };
        let raw = toml::to_string(&cfg).unwrap();
        assert!(!raw.contains("camera_name"));
        assert!(!raw.contains("workers"));
        let back: DistanceDetectorConfig = toml::from_str(&raw).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn apply_env_overrides_changes_fields() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe {
            std::env::set_var("ODIST_NUM_QUERIES", "15");
            std::env::set_var("ODIST_CAMERA", "lidar_top");
            std::env::set_var("ODIST_WORKERS", "not-a-number");
        }
        let mut cfg = DistanceDetectorConfig::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.num_queries, 15);
        assert_eq!(cfg.camera_name, "lidar_top");
        assert_eq!(cfg.workers, None, "unparsable values are ignored");
        unsafe {
            std::env::remove_var("ODIST_NUM_QUERIES");
            std::env::remove_var("ODIST_CAMERA");
            std::env::remove_var("ODIST_WORKERS");
        }
    }
}
