use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::constants::*;
use crate::data::poi::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Linear,
    Grid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dataset_path: PathBuf,
    pub gazetteer_path: Option<PathBuf>,
    pub default_center: Coordinate,
    pub initial_radius_km: f64,
    pub radius_presets_km: Vec<f64>,
    pub index: IndexKind,
    pub grid_cell_deg: f64,
    pub highlight_dismiss_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("emergency_bells.json"),
            gazetteer_path: None,
            default_center: Coordinate::new(DEFAULT_CENTER_LAT, DEFAULT_CENTER_LNG),
            initial_radius_km: DEFAULT_RADIUS_KM,
            radius_presets_km: RADIUS_PRESETS_KM.to_vec(),
            index: IndexKind::Linear,
            grid_cell_deg: DEFAULT_GRID_CELL_DEG,
            highlight_dismiss_secs: HIGHLIGHT_DISMISS_SECS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(serde_json::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Config parse error: {}", e),
            ConfigError::Invalid(s) => write!(f, "Invalid config: {}", s),
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let reader = BufReader::new(File::open(path)?);
        let config: AppConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_center.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "default_center {}, {} is not a valid coordinate",
                self.default_center.lat, self.default_center.lng
            )));
        }
        if !(self.initial_radius_km.is_finite() && self.initial_radius_km > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial_radius_km must be positive, got {}",
                self.initial_radius_km
            )));
        }
        if let Some(bad) = self.radius_presets_km.iter().find(|r| !(r.is_finite() && **r > 0.0)) {
            return Err(ConfigError::Invalid(format!("radius preset {} must be positive", bad)));
        }
        if !(self.grid_cell_deg.is_finite() && self.grid_cell_deg > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "grid_cell_deg must be positive, got {}",
                self.grid_cell_deg
            )));
        }
        Ok(())
    }
}
