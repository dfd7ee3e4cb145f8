use tracing::{info, warn};

use crate::config::constants::{DEFAULT_CENTER_LAT, DEFAULT_CENTER_LNG};
use crate::data::poi::Coordinate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    Unsupported,
    PermissionDenied,
    Unavailable(String),
}

impl std::fmt::Display for LocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationError::Unsupported => write!(f, "Location services are not supported"),
            LocationError::PermissionDenied => write!(f, "Location permission denied"),
            LocationError::Unavailable(reason) => write!(f, "Location unavailable: {}", reason),
        }
    }
}

impl std::error::Error for LocationError {}

/// Supplies the user's current position.
pub trait LocationProvider {
    fn current_position(&self) -> Result<Coordinate, LocationError>;
}

/// Provider that always reports the same fix.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

impl LocationProvider for FixedLocation {
    fn current_position(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}

/// Provider for environments without location support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl LocationProvider for NoLocation {
    fn current_position(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unsupported)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Device,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartPosition {
    pub coordinate: Coordinate,
    pub source: LocationSource,
}

pub fn default_position() -> Coordinate {
    Coordinate::new(DEFAULT_CENTER_LAT, DEFAULT_CENTER_LNG)
}

/// Ask the provider for a fix, falling back to `fallback` on any failure.
pub fn resolve_start_position(provider: &dyn LocationProvider, fallback: Coordinate) -> StartPosition {
    match provider.current_position() {
        Ok(coordinate) if coordinate.is_valid() => {
            info!(lat = coordinate.lat, lng = coordinate.lng, "Using device location");
            StartPosition { coordinate, source: LocationSource::Device }
        }
        Ok(coordinate) => {
            warn!(lat = coordinate.lat, lng = coordinate.lng, "Device reported an invalid fix, using default position");
            StartPosition { coordinate: fallback, source: LocationSource::Fallback }
        }
        Err(e) => {
            warn!(error = %e, "Could not get device location, using default position");
            StartPosition { coordinate: fallback, source: LocationSource::Fallback }
        }
    }
}
