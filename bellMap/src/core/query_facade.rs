use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::app_config::{AppConfig, IndexKind};
use crate::config::constants::{LOCATION_FIX_ZOOM_LEVEL, RADIUS_PRESETS_KM, SEARCH_ZOOM_LEVEL};
use crate::core::grid_index::GridIndex;
use crate::core::highlight_timer::HighlightTimer;
use crate::core::proximity_index::{CategoryFilter, LinearIndex, SpatialQuery};
use crate::data::poi::Coordinate;
use crate::models::bell::Bell;
use crate::models::viewport::{ViewPhase, ViewportError, ViewportState};
use crate::services::geolocation::{resolve_start_position, LocationProvider, LocationSource, StartPosition};
use crate::services::place_search::{search_place, PlaceHit, PlaceSearch, SearchError};
use crate::utils::logging::{self, OperationCategory, QueryType};

/// `"350m"` below one kilometer, `"1.23km"` from there up.
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{}m", (km * 1000.0).round() as i64)
    } else {
        format!("{:.2}km", km)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestBell {
    pub bell: Bell,
    pub distance_km: f64,
    pub distance_text: String,
}

impl NearestBell {
    fn new(bell: &Bell, distance_km: f64) -> Self {
        Self {
            bell: bell.clone(),
            distance_km,
            distance_text: format_distance(distance_km),
        }
    }
}

/// Plain-data result of a re-query, ready for a presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot<'a> {
    pub center: Coordinate,
    pub radius_km: f64,
    pub zoom_level: u8,
    #[serde(serialize_with = "serialize_filter")]
    pub filter: CategoryFilter,
    pub visible: Vec<&'a Bell>,
    pub nearest: Option<NearestBell>,
    pub highlighted: Option<usize>,
    /// Last location fix, click or search hit.
    pub focus: Option<Coordinate>,
}

fn serialize_filter<S: serde::Serializer>(filter: &CategoryFilter, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(filter)
}

#[derive(Debug)]
pub enum SearchOutcome<'a> {
    Found { place: PlaceHit, view: ViewSnapshot<'a> },
    /// Blank input, nothing happened.
    Ignored,
}

/// Query core and viewport state behind the map UI.
///
/// Every mutation re-runs the radius query around the current center; only
/// events that pick a new point of interest (location fix, click, search)
/// recompute the nearest bell.
pub struct QueryFacade {
    index: Box<dyn SpatialQuery>,
    viewport: ViewportState,
    timer: HighlightTimer,
    default_center: Coordinate,
    radius_presets: Vec<f64>,
    nearest: Option<NearestBell>,
    focus: Option<Coordinate>,
}

impl QueryFacade {
    pub fn new(index: Box<dyn SpatialQuery>, viewport: ViewportState, timer: HighlightTimer) -> Self {
        let default_center = viewport.center();
        Self {
            index,
            viewport,
            timer,
            default_center,
            radius_presets: RADIUS_PRESETS_KM.to_vec(),
            nearest: None,
            focus: None,
        }
    }

    pub fn with_radius_presets(mut self, presets: Vec<f64>) -> Self {
        self.radius_presets = presets;
        self
    }

    pub fn with_linear_index(bells: Vec<Bell>) -> Self {
        Self::new(
            Box::new(LinearIndex::new(bells)),
            ViewportState::default(),
            HighlightTimer::default(),
        )
    }

    pub fn from_config(bells: Vec<Bell>, config: &AppConfig) -> Self {
        let index: Box<dyn SpatialQuery> = match config.index {
            IndexKind::Linear => Box::new(LinearIndex::new(bells)),
            IndexKind::Grid => Box::new(GridIndex::with_cell_size(bells, config.grid_cell_deg)),
        };
        info!(index = ?config.index, "Query index ready");
        Self::new(
            index,
            ViewportState::new(config.default_center, config.initial_radius_km),
            HighlightTimer::new(Duration::from_secs(config.highlight_dismiss_secs)),
        )
        .with_radius_presets(config.radius_presets_km.clone())
    }

    pub fn index(&self) -> &dyn SpatialQuery {
        self.index.as_ref()
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn nearest(&self) -> Option<&NearestBell> {
        self.nearest.as_ref()
    }

    pub fn radius_presets(&self) -> &[f64] {
        &self.radius_presets
    }

    pub fn highlight_timer(&self) -> &HighlightTimer {
        &self.timer
    }

    /// Nearest bell to an arbitrary point, without touching the viewport.
    pub fn nearest_to(&self, lat: f64, lng: f64) -> Option<NearestBell> {
        let _timing = logging::start_timing("nearest_to",
            OperationCategory::Query { subcategory: QueryType::Nearest });
        self.index.nearest(lat, lng).map(|(bell, d)| NearestBell::new(bell, d))
    }

    pub fn within_radius(&self, lat: f64, lng: f64, radius_km: f64, filter: &CategoryFilter) -> Vec<&Bell> {
        let _timing = logging::start_timing("within_radius",
            OperationCategory::Query { subcategory: QueryType::Radius });
        self.index.within_radius(lat, lng, radius_km, filter)
    }

    /// Current view without changing anything.
    pub fn snapshot(&self) -> ViewSnapshot<'_> {
        let center = self.viewport.center();
        let visible = self.within_radius(center.lat, center.lng, self.viewport.radius_km(), self.viewport.filter());
        debug!(
            lat = center.lat,
            lng = center.lng,
            radius_km = self.viewport.radius_km(),
            filter = %self.viewport.filter(),
            visible = visible.len(),
            "Radius query"
        );
        ViewSnapshot {
            center,
            radius_km: self.viewport.radius_km(),
            zoom_level: self.viewport.zoom_level(),
            filter: self.viewport.filter().clone(),
            visible,
            nearest: self.nearest.clone(),
            highlighted: self.viewport.highlighted(),
            focus: self.focus,
        }
    }

    /// Initial location fix. Without a usable fix the view stays at the
    /// default center and zoom but still gets a nearest bell.
    pub fn start(&mut self, provider: &dyn LocationProvider) -> Result<(StartPosition, ViewSnapshot<'_>), ViewportError> {
        self.start_at(provider, Instant::now())
    }

    pub fn start_at(
        &mut self,
        provider: &dyn LocationProvider,
        now: Instant,
    ) -> Result<(StartPosition, ViewSnapshot<'_>), ViewportError> {
        let start = resolve_start_position(provider, self.default_center);
        if start.source == LocationSource::Device {
            self.viewport.set_zoom_level(LOCATION_FIX_ZOOM_LEVEL);
        }
        self.point_of_interest(start.coordinate, now)?;
        Ok((start, self.snapshot()))
    }

    /// A click on the map, or any other explicit choice of point.
    pub fn recenter(&mut self, lat: f64, lng: f64) -> Result<ViewSnapshot<'_>, ViewportError> {
        self.recenter_at(lat, lng, Instant::now())
    }

    pub fn recenter_at(&mut self, lat: f64, lng: f64, now: Instant) -> Result<ViewSnapshot<'_>, ViewportError> {
        self.point_of_interest(Coordinate::new(lat, lng), now)?;
        Ok(self.snapshot())
    }

    fn point_of_interest(&mut self, center: Coordinate, now: Instant) -> Result<(), ViewportError> {
        self.viewport.center_on(center)?;
        self.focus = Some(center);
        self.nearest = self.nearest_to(center.lat, center.lng);

        match &self.nearest {
            Some(nearest) => {
                info!(
                    id = nearest.bell.id,
                    name = nearest.bell.location_name.as_deref().unwrap_or(""),
                    distance = %nearest.distance_text,
                    "Nearest bell"
                );
                self.viewport.set_highlighted(Some(nearest.bell.id));
                self.timer.arm(now, nearest.bell.id);
            }
            None => {
                debug!("No bell with a valid location");
                self.viewport.set_highlighted(None);
                self.timer.cancel();
            }
        }
        Ok(())
    }

    /// Map dragged: new center, radius query only.
    pub fn pan_to(&mut self, lat: f64, lng: f64) -> Result<ViewSnapshot<'_>, ViewportError> {
        self.viewport.move_to(Coordinate::new(lat, lng))?;
        Ok(self.snapshot())
    }

    pub fn set_zoom(&mut self, level: u8) -> ViewSnapshot<'_> {
        self.viewport.set_zoom_level(level);
        self.snapshot()
    }

    pub fn set_radius(&mut self, radius_km: f64) -> Result<ViewSnapshot<'_>, ViewportError> {
        self.viewport.set_radius(radius_km)?;
        Ok(self.snapshot())
    }

    /// Radius picked from the preset buttons; anything else is rejected.
    pub fn select_radius_preset(&mut self, radius_km: f64) -> Result<ViewSnapshot<'_>, ViewportError> {
        if !self.radius_presets.iter().any(|p| (p - radius_km).abs() < 1e-9) {
            return Err(ViewportError::NotAPreset(radius_km));
        }
        self.set_radius(radius_km)
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) -> ViewSnapshot<'_> {
        self.viewport.set_filter(filter);
        self.snapshot()
    }

    /// Place search. A hit becomes the new point of interest at street-level
    /// zoom; a miss leaves the view untouched.
    pub fn search(&mut self, provider: &dyn PlaceSearch, query: &str) -> Result<SearchOutcome<'_>, SearchError> {
        self.search_at(provider, query, Instant::now())
    }

    pub fn search_at(
        &mut self,
        provider: &dyn PlaceSearch,
        query: &str,
        now: Instant,
    ) -> Result<SearchOutcome<'_>, SearchError> {
        let place = match search_place(provider, query) {
            Ok(place) => place,
            Err(SearchError::EmptyQuery) => return Ok(SearchOutcome::Ignored),
            Err(e) => return Err(e),
        };
        if !place.coordinate.is_valid() {
            warn!(name = %place.name, "Search hit has no usable coordinate");
            return Err(SearchError::NotFound(query.trim().to_string()));
        }
        self.point_of_interest(place.coordinate, now)
            .map_err(|_| SearchError::NotFound(query.trim().to_string()))?;
        self.viewport.set_zoom_level(SEARCH_ZOOM_LEVEL);
        Ok(SearchOutcome::Found { place, view: self.snapshot() })
    }

    /// Close the highlighted popup by hand.
    pub fn dismiss_highlight(&mut self) {
        self.timer.cancel();
        self.viewport.set_highlighted(None);
    }

    /// Let the highlight timer run. Returns the bell whose popup closed.
    pub fn poll_highlight(&mut self, now: Instant) -> Option<usize> {
        let dismissed = self.timer.poll(now)?;
        if self.viewport.highlighted() == Some(dismissed) {
            self.viewport.set_highlighted(None);
        }
        Some(dismissed)
    }

    pub fn phase(&self) -> ViewPhase {
        self.viewport.phase()
    }
}
