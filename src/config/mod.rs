use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::api::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use crate::domain::check_coordinates;
use crate::present::{DEFAULT_ZOOM, MAX_ZOOM};

/// Environment variable holding the LocationIQ access token
pub const API_KEY_ENV: &str = "LOCATIONIQ_API_KEY";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_zoom() -> u8 {
    DEFAULT_ZOOM
}
fn default_output() -> PathBuf {
    PathBuf::from("locmap.html")
}

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub map: MapConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            map: MapConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MapConfig {
    /// [lat, lon] the map opens on, regardless of results
    #[serde(default)]
    pub center: Option<[f64; 2]>,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: None,
            zoom: default_zoom(),
            output: default_output(),
        }
    }
}

impl MapConfig {
    /// Fixed map center: command-line coordinates win over the file's `center`.
    ///
    /// Out-of-range coordinates from either source are an error.
    pub fn resolve_center(&self, cli: Option<(f64, f64)>) -> Result<Option<(f64, f64)>> {
        let center = cli.or(self.center.map(|[lat, lon]| (lat, lon)));
        if let Some((lat, lon)) = center {
            check_coordinates(lat, lon)
                .with_context(|| format!("Invalid map center ({}, {})", lat, lon))?;
        }
        Ok(center)
    }

    /// Zoom level: command-line value wins over the file's `zoom`
    pub fn resolve_zoom(&self, cli: Option<u8>) -> Result<u8> {
        let zoom = cli.unwrap_or(self.zoom);
        if zoom > MAX_ZOOM {
            bail!("Map zoom {} is outside 0..={}", zoom, MAX_ZOOM);
        }
        Ok(zoom)
    }
}

impl FileConfig {
    /// Load the first parseable config file from the standard locations
    pub fn load() -> Option<Self> {
        for path in get_config_paths() {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => {
                        debug!(path = %path.display(), "Loaded config file");
                        return Some(config);
                    }
                    Err(e) => {
                        warn!("Failed to parse config file {:?}: {}", path, e);
                    }
                }
            }
        }
        None
    }

    /// Load an explicitly requested config file; unlike [`FileConfig::load`] a
    /// missing or broken file is an error
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Resolve the API key: flag, then environment, then this file.
    ///
    /// Blank values are ignored at every level.
    pub fn api_key(&self, flag: Option<&str>, env: Option<&str>) -> Option<String> {
        [flag, env, self.api_key.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|key| !key.is_empty())
            .map(str::to_string)
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("locmap.toml"));
    paths.push(PathBuf::from(".locmap.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("locmap").join("config.toml"));
        paths.push(config_dir.join("locmap.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".locmap.toml"));
        paths.push(home.join(".config").join("locmap").join("config.toml"));
    }

    paths
}
