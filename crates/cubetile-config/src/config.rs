//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use cubetile_geometry::Projection;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name used inside a config directory.
pub const CONFIG_FILE: &str = "config.ron";

/// Deepest zoom a tile builder will index.
pub const MAX_ZOOM_LIMIT: u8 = 20;

/// Top-level tiler configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Tile building settings.
    pub tiling: TilingConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Options for building tiles from a feature collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TilingConfig {
    /// Force a projection. When unset, GeoJSON input is tiled in Web
    /// Mercator and face input on the cube sphere.
    pub projection: Option<Projection>,
    /// Lowest zoom that serves tiles.
    pub minzoom: u8,
    /// Highest zoom that serves tiles; geometry is kept at full detail here.
    pub maxzoom: u8,
    /// Face roots are split eagerly down to this zoom when the builder is
    /// created. Values above `maxzoom` stop at `maxzoom`.
    pub index_maxzoom: u8,
    /// Simplification tolerance in 1/4096ths of a tile.
    pub tolerance: f64,
    /// Extra margin around each tile for lines and polygons, as a fraction
    /// of the tile.
    pub buffer: f64,
    /// Compute a lon/lat bounding box for features that lack one.
    pub build_bbox: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            projection: None,
            minzoom: 0,
            maxzoom: 16,
            index_maxzoom: 4,
            tolerance: 3.0,
            buffer: 0.0625,
            build_bbox: false,
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

impl TilingConfig {
    /// Checks the zoom range and numeric options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.maxzoom > MAX_ZOOM_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "maxzoom {} is above {MAX_ZOOM_LIMIT}",
                self.maxzoom
            )));
        }
        if self.minzoom > self.maxzoom {
            return Err(ConfigError::Invalid(format!(
                "minzoom {} is above maxzoom {}",
                self.minzoom, self.maxzoom
            )));
        }
        if self.index_maxzoom > MAX_ZOOM_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "index_maxzoom {} is above {MAX_ZOOM_LIMIT}",
                self.index_maxzoom
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if !self.buffer.is_finite() || self.buffer < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "buffer must be a non-negative number, got {}",
                self.buffer
            )));
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Parse and validate a config from RON text.
    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = ron::from_str(contents).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tiling.validate()
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config = Config::from_ron_str(&contents)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        log::debug!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config = Config::from_ron_str(&contents)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
