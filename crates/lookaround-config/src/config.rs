//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where panoramas come from and how big the sphere is.
    pub viewer: ViewerConfig,
    /// Tile fetching settings.
    pub tiles: TileConfig,
    /// Dynamic resolution refresh settings.
    pub refresh: RefreshConfig,
    /// Face geometry settings.
    pub mesh: MeshConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Viewer-facing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Tile server endpoint, prepended verbatim to every tile path.
    pub endpoint: String,
    /// Radius of the panorama sphere before mesh scaling.
    pub sphere_radius: f32,
}

/// Tile fetching configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TileConfig {
    /// Resolution tier used for the initial 6-face load (lower = sharper).
    pub initial_tier: u8,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Maximum simultaneous tile requests (0 = unlimited).
    pub max_concurrent_fetches: usize,
}

/// Refresh controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefreshConfig {
    /// Upgrade visible faces as the camera moves and zooms.
    pub dynamic_loading: bool,
    /// Below this vertical field of view (degrees) the fine tier is requested.
    pub fine_fov_threshold_deg: f32,
    /// Tier requested when zoomed in.
    pub fine_tier: u8,
    /// Tier requested otherwise.
    pub medium_tier: u8,
    /// Only every n-th proxy vertex is tested against the frustum.
    pub frustum_sample_stride: usize,
}

/// Face geometry configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeshConfig {
    /// Vertical tessellation of every face.
    pub height_segments: u32,
    /// Merge the top and bottom caps into the mesh.
    pub polar_faces_enabled: bool,
    /// Rotation of the top cap about the vertical axis, in degrees.
    ///
    /// The correct alignment angle is not known yet.
    pub top_cap_rotation_deg: f32,
    /// Rotation of the bottom cap about the vertical axis, in degrees.
    pub bottom_cap_rotation_deg: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "lookaround_adapter=trace").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000".to_string(),
            sphere_radius: 10.0,
        }
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            initial_tier: 4,
            request_timeout_secs: 30,
            max_concurrent_fetches: 0,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            dynamic_loading: true,
            fine_fov_threshold_deg: 55.0,
            fine_tier: 0,
            medium_tier: 2,
            frustum_sample_stride: 20,
        }
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            height_segments: 32,
            polar_faces_enabled: false,
            top_cap_rotation_deg: 0.0,
            bottom_cap_rotation_deg: 27.5 - 90.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load `config.ron` from `config_dir`, writing the defaults there first
    /// if it does not exist yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", path.display());
            return Ok(config);
        }

        let config = Self::read(&path)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config to `config_dir/config.ron`, creating the directory.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| ConfigError::Write { path, source }
        };
        std::fs::create_dir_all(config_dir).map_err(write_err(config_dir))?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty)?;

        let path = config_dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, serialized).map_err(write_err(&path))
    }

    /// Re-read the file. `Some` only if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let latest = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;
        if latest == *self {
            return Ok(None);
        }
        log::info!("Config reloaded with changes");
        Ok(Some(latest))
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_file_names_every_knob() {
        let dir = tempfile::tempdir().unwrap();
        Config::default().save(dir.path()).unwrap();
        let text = std::fs::read_to_string(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        for key in ["initial_tier: 4", "frustum_sample_stride: 20", "polar_faces_enabled: false"] {
            assert!(text.contains(key), "missing {key}");
        }
        assert_eq!(ron::from_str::<Config>(&text).unwrap(), Config::default());
    }

    #[test]
    fn test_defaults_match_viewer_contract() {
        let config = Config::default();
        assert_eq!(config.refresh.fine_fov_threshold_deg, 55.0);
        assert_eq!(config.refresh.fine_tier, 0);
        assert_eq!(config.refresh.medium_tier, 2);
        assert_eq!(config.mesh.top_cap_rotation_deg, 0.0);
        assert!((config.mesh.bottom_cap_rotation_deg + 62.5).abs() < 1e-6);
        assert_eq!(config.tiles.max_concurrent_fetches, 0);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(viewer: (), tiles: (), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.mesh, MeshConfig::default());
        assert_eq!(config.refresh, RefreshConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let ron_str = "(refresh: (fine_fov_threshold_deg: 40.0))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.refresh.fine_fov_threshold_deg, 40.0);
        assert_eq!(config.refresh.frustum_sample_stride, 20);
    }

    #[test]
    fn test_unknown_keys_tolerated() {
        let config: Config = ron::from_str("(viewer: (legacy_flag: 1), future_setting: true)").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.viewer.endpoint = "https://tiles.example.org".to_string();
        config.mesh.polar_faces_enabled = true;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_reload_reports_only_changes() {
        let dir = tempfile::tempdir().unwrap();
        let current = Config::default();
        current.save(dir.path()).unwrap();
        assert_eq!(current.reload(dir.path()).unwrap(), None);

        let mut edited = current.clone();
        edited.refresh.dynamic_loading = false;
        edited.save(dir.path()).unwrap();
        assert_eq!(current.reload(dir.path()).unwrap(), Some(edited));
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{{not valid}}").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_reload_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::default().reload(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
