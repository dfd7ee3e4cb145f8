use serde::Serialize;
use crate::config::constants::{DEFAULT_CENTER_LAT, DEFAULT_CENTER_LNG, DEFAULT_RADIUS_KM, INITIAL_ZOOM_LEVEL};
use crate::core::proximity_index::CategoryFilter;
use crate::data::poi::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewPhase {
    /// No location fix, click or search has happened yet.
    Idle,
    Centered,
}

#[derive(Debug)]
pub enum ViewportError {
    InvalidRadius(f64),
    InvalidCoordinate(f64, f64),
    NotAPreset(f64),
}

impl std::fmt::Display for ViewportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewportError::InvalidRadius(r) => write!(f, "Radius must be a positive number of kilometers, got {}", r),
            ViewportError::InvalidCoordinate(lat, lng) => write!(f, "Invalid coordinate: {}, {}", lat, lng),
            ViewportError::NotAPreset(r) => write!(f, "{}km is not one of the radius presets", r),
        }
    }
}

impl std::error::Error for ViewportError {}

/// What the user is currently looking at.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    center: Coordinate,
    radius_km: f64,
    zoom_level: u8,
    filter: CategoryFilter,
    highlighted: Option<usize>,
    phase: ViewPhase,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(Coordinate::new(DEFAULT_CENTER_LAT, DEFAULT_CENTER_LNG), DEFAULT_RADIUS_KM)
    }
}

impl ViewportState {
    pub fn new(center: Coordinate, radius_km: f64) -> Self {
        Self {
            center,
            radius_km,
            zoom_level: INITIAL_ZOOM_LEVEL,
            filter: CategoryFilter::All,
            highlighted: None,
            phase: ViewPhase::Idle,
        }
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn zoom_level(&self) -> u8 {
        self.zoom_level
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    /// Move the view without making it the user's point of interest.
    pub fn move_to(&mut self, center: Coordinate) -> Result<(), ViewportError> {
        if !center.is_valid() {
            return Err(ViewportError::InvalidCoordinate(center.lat, center.lng));
        }
        self.center = center;
        Ok(())
    }

    /// Center on a point the user picked; leaves `Idle` for good.
    pub fn center_on(&mut self, center: Coordinate) -> Result<(), ViewportError> {
        self.move_to(center)?;
        self.phase = ViewPhase::Centered;
        Ok(())
    }

    pub fn set_radius(&mut self, radius_km: f64) -> Result<(), ViewportError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(ViewportError::InvalidRadius(radius_km));
        }
        self.radius_km = radius_km;
        Ok(())
    }

    pub fn set_zoom_level(&mut self, level: u8) {
        self.zoom_level = level;
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
    }

    pub fn set_highlighted(&mut self, id: Option<usize>) {
        self.highlighted = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_at_city_hall() {
        let state = ViewportState::default();
        assert_eq!(state.phase(), ViewPhase::Idle);
        assert_eq!(state.center(), Coordinate::new(37.5665, 126.9780));
        assert_eq!(state.radius_km(), 2.0);
        assert_eq!(state.zoom_level(), 8);
    }

    #[test]
    fn panning_does_not_center() {
        let mut state = ViewportState::default();
        state.move_to(Coordinate::new(37.0, 127.0)).unwrap();
        assert_eq!(state.phase(), ViewPhase::Idle);
        state.center_on(Coordinate::new(37.1, 127.1)).unwrap();
        assert_eq!(state.phase(), ViewPhase::Centered);
    }

    #[test]
    fn rejects_bad_radius_and_keeps_old_value() {
        let mut state = ViewportState::default();
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(state.set_radius(bad).is_err());
        }
        assert_eq!(state.radius_km(), 2.0);
        state.set_radius(0.5).unwrap();
        assert_eq!(state.radius_km(), 0.5);
    }

    #[test]
    fn rejects_bad_center() {
        let mut state = ViewportState::default();
        assert!(state.center_on(Coordinate::new(f64::NAN, 0.0)).is_err());
        assert_eq!(state.phase(), ViewPhase::Idle);
    }
}
